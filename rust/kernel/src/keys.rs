// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element key types for arena-based storage.
//!
//! Each element kind gets a unique, type-safe key for O(1) lookup in its
//! collection. Keys are created by `slotmap::SlotMap` and stay valid (or
//! detectably stale) after other elements are removed.

use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::flags::ElemTypeMask;

new_key_type! {
    /// Key for a vertex (point in 3D space).
    pub struct VertexKey;

    /// Key for an edge (pair of distinct vertices).
    pub struct EdgeKey;

    /// Key for a loop (one face's traversal across one edge).
    pub struct LoopKey;

    /// Key for a face (one outer boundary plus any holes).
    pub struct FaceKey;
}

/// A key that can reference any mesh element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElemKey {
    Vertex(VertexKey),
    Edge(EdgeKey),
    Loop(LoopKey),
    Face(FaceKey),
}

impl ElemKey {
    /// Returns the element kind of this key.
    pub fn elem_type(&self) -> ElemType {
        match self {
            ElemKey::Vertex(_) => ElemType::Vertex,
            ElemKey::Edge(_) => ElemType::Edge,
            ElemKey::Loop(_) => ElemType::Loop,
            ElemKey::Face(_) => ElemType::Face,
        }
    }
}

/// Discriminant for element kinds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ElemType {
    Vertex = 0,
    Edge = 1,
    Loop = 2,
    Face = 3,
}

impl ElemType {
    /// All element kinds, in storage order.
    pub const ALL: [ElemType; 4] = [
        ElemType::Vertex,
        ElemType::Edge,
        ElemType::Loop,
        ElemType::Face,
    ];

    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElemType::Vertex => "Vertex",
            ElemType::Edge => "Edge",
            ElemType::Loop => "Loop",
            ElemType::Face => "Face",
        }
    }

    /// Returns the single-bit mask for this kind.
    pub fn mask(&self) -> ElemTypeMask {
        match self {
            ElemType::Vertex => ElemTypeMask::VERTEX,
            ElemType::Edge => ElemTypeMask::EDGE,
            ElemType::Loop => ElemTypeMask::LOOP,
            ElemType::Face => ElemTypeMask::FACE,
        }
    }
}

impl fmt::Display for ElemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<VertexKey> for ElemKey {
    fn from(k: VertexKey) -> Self {
        ElemKey::Vertex(k)
    }
}

impl From<EdgeKey> for ElemKey {
    fn from(k: EdgeKey) -> Self {
        ElemKey::Edge(k)
    }
}

impl From<LoopKey> for ElemKey {
    fn from(k: LoopKey) -> Self {
        ElemKey::Loop(k)
    }
}

impl From<FaceKey> for ElemKey {
    fn from(k: FaceKey) -> Self {
        ElemKey::Face(k)
    }
}
