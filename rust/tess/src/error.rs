// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for tessellation.

/// Result type alias for tessellation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during tessellation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A mesh kernel call failed (stale face key, rejected face, ...).
    #[error(transparent)]
    Mesh(#[from] halfmesh_kernel::Error),

    /// The constrained triangulation could not be completed.
    #[error("triangulation error: {0}")]
    TriangulationError(String),

    /// A tessellator configuration could not be parsed.
    #[error("invalid tessellation config: {0}")]
    Config(String),
}
