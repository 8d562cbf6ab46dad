// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for mesh kernel operations.

use crate::attr::AttrType;
use crate::keys::{EdgeKey, ElemType, FaceKey, LoopKey, VertexKey};

/// Result type alias for mesh kernel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during mesh kernel operations.
///
/// Only invalid arguments are reported this way. Structural corruption and
/// double frees are logged and recovered locally.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An edge was requested between a vertex and itself.
    #[error("cannot make an edge from vertex {0:?} to itself")]
    SelfEdge(VertexKey),

    /// A face boundary needs at least two vertices.
    #[error("face boundary needs at least 2 vertices, got {0}")]
    TooFewVertices(usize),

    /// The same vertex appears twice in one face boundary.
    #[error("vertex {0:?} appears more than once in a face boundary")]
    DuplicateVertex(VertexKey),

    /// `other_vertex` was asked about a vertex that is not an endpoint.
    #[error("vertex {vertex:?} is not an endpoint of edge {edge:?}")]
    VertexNotOnEdge { edge: EdgeKey, vertex: VertexKey },

    /// Vertex key not found in the mesh.
    #[error("vertex not found: {0:?}")]
    VertexNotFound(VertexKey),

    /// Edge key not found in the mesh.
    #[error("edge not found: {0:?}")]
    EdgeNotFound(EdgeKey),

    /// Loop key not found in the mesh.
    #[error("loop not found: {0:?}")]
    LoopNotFound(LoopKey),

    /// Face key not found in the mesh.
    #[error("face not found: {0:?}")]
    FaceNotFound(FaceKey),

    /// The attribute type cannot be attached to this element kind.
    #[error("attribute type {ty} cannot be attached to {kind} elements")]
    InvalidLayerType { ty: AttrType, kind: ElemType },

    /// No layer with the given id or name exists.
    #[error("attribute layer not found: {0}")]
    LayerNotFound(String),

    /// A split operation was given loops or parameters it cannot split on.
    #[error("invalid split: {0}")]
    InvalidSplit(String),

    /// `validate` found broken invariants.
    #[error("mesh is corrupt ({count} problems), first: {first}")]
    Corrupt { count: usize, first: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}
