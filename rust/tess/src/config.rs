// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tessellator configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Knobs for face tessellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TessConfig {
    /// Points closer than this (in normalized coordinates) are merged.
    pub epsilon: f64,
    /// Side length of the square the projected boundary is scaled into.
    pub normalized_extent: f64,
    /// Passes over the unrecovered boundary edges before giving up.
    pub max_constraint_passes: usize,
    /// Drop triangles inside holes. When off only the outside is trimmed.
    pub trim_holes: bool,
    /// Fan-triangulate convex faces of up to 8 corners.
    pub convex_fast_path: bool,
    /// Penalize quad diagonals that cut across a fold.
    pub quad_dihedral_weight: bool,
}

impl Default for TessConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            normalized_extent: 100.0,
            max_constraint_passes: 64,
            trim_holes: true,
            convex_fast_path: true,
            quad_dihedral_weight: true,
        }
    }
}

impl TessConfig {
    /// Parses a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        if !(config.epsilon >= 0.0 && config.normalized_extent > 0.0) {
            return Err(Error::Config(
                "epsilon must be >= 0 and normalized_extent > 0".to_string(),
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = TessConfig::default();
        assert_eq!(cfg.max_constraint_passes, 64);
        assert!(cfg.trim_holes);
        assert!(cfg.convex_fast_path);
    }

    #[test]
    fn from_partial_json() {
        let cfg = TessConfig::from_json(r#"{ "convex_fast_path": false, "epsilon": 0.001 }"#).unwrap();
        assert!(!cfg.convex_fast_path);
        assert_eq!(cfg.epsilon, 0.001);
        assert_eq!(cfg.normalized_extent, 100.0);
    }

    #[test]
    fn rejects_bad_extent() {
        assert!(matches!(
            TessConfig::from_json(r#"{ "normalized_extent": 0.0 }"#),
            Err(Error::Config(_))
        ));
    }
}
