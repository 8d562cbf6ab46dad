// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Halfmesh Kernel
//!
//! Editable polygon mesh built from vertices, edges, loops and faces.
//!
//! Elements live in slot-map arenas and refer to each other by key. A loop
//! is one face's pass across one edge: it sits in its face's boundary cycle
//! (`next`/`prev`) and in its edge's radial ring (`radial_next` /
//! `radial_prev`), so any number of faces can share an edge. Faces may have
//! holes; the first boundary is always the outer one.
//!
//! Each element kind has a runtime-extensible set of attribute layers
//! ([`CustomData`]). Adding or removing a layer updates every element of
//! that kind before the call returns.
//!
//! Invalid arguments come back as [`Error`]s. Corrupted cycles and double
//! frees are logged through `tracing` and recovered locally.

pub mod attr;
pub mod config;
pub mod construction;
pub mod customdata;
pub mod eid;
pub mod elements;
pub mod error;
pub mod euler;
pub mod flags;
pub mod geometry;
pub mod keys;
pub mod list;
pub mod mesh;
pub mod serialization;
pub mod traversal;
pub mod validate;

pub use attr::{AttrType, AttrValue};
pub use config::MeshConfig;
pub use customdata::{CustomData, CustomDataLayer, LayerChange, LayerSet};
pub use eid::{Eid, EidGen};
pub use elements::{Edge, ElemHeader, Element, Face, Loop, LoopList, Vertex};
pub use error::{Error, Result};
pub use flags::{ElemFlags, ElemTypeMask, LayerFlags};
pub use keys::{EdgeKey, ElemKey, ElemType, FaceKey, LoopKey, VertexKey};
pub use list::ElementList;
pub use mesh::Mesh;
pub use serialization::MeshSnapshot;
