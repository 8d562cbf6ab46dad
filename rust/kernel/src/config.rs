// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh kernel configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Traversal caps used to fail safe on corrupted cycles.
///
/// A walk that does not return to its anchor within its cap logs a warning
/// and stops early with whatever it collected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Cap for boundary-cycle (`next`) walks.
    pub max_face_verts: usize,
    /// Cap for radial-ring (`radial_next`) walks.
    pub max_edge_faces: usize,
    /// Cap for incident-edge loops such as `kill_vertex`.
    pub max_vert_edges: usize,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            max_face_verts: 1_000_000,
            max_edge_faces: 10_000,
            max_vert_edges: 10_000,
        }
    }
}

impl MeshConfig {
    /// Parses a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = MeshConfig::from_json(r#"{ "max_edge_faces": 16 }"#).unwrap();
        assert_eq!(cfg.max_edge_faces, 16);
        assert_eq!(cfg.max_face_verts, 1_000_000);
        assert_eq!(cfg.max_vert_edges, 10_000);
    }

    #[test]
    fn bad_json_is_serialization_error() {
        assert!(matches!(
            MeshConfig::from_json("{"),
            Err(Error::Serialization(_))
        ));
    }
}
