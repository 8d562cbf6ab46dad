// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element records stored in the mesh arenas.
//!
//! Relations between elements are arena keys rather than references, so the
//! cyclic structures (boundary cycles through `next`/`prev`, radial rings
//! through `radial_next`/`radial_prev`) carry no ownership. A key that no
//! longer resolves marks an element that has been killed.

use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;

use crate::attr::AttrValue;
use crate::eid::Eid;
use crate::flags::ElemFlags;
use crate::keys::{EdgeKey, ElemType, FaceKey, LoopKey, VertexKey};

/// Fields shared by every element kind.
#[derive(Debug, Clone)]
pub struct ElemHeader {
    pub eid: Eid,
    pub flag: ElemFlags,
    /// Dense position in the owning collection, valid after
    /// `ElementList::update_indices`.
    pub index: usize,
    /// One value per layer of the kind's custom data, in slot order.
    pub attrs: Vec<AttrValue>,
}

impl ElemHeader {
    pub fn new(eid: Eid, attrs: Vec<AttrValue>) -> Self {
        Self {
            eid,
            flag: ElemFlags::empty(),
            index: 0,
            attrs,
        }
    }
}

/// Common access to the header of any element kind.
pub trait Element {
    const TYPE: ElemType;

    fn head(&self) -> &ElemHeader;
    fn head_mut(&mut self) -> &mut ElemHeader;
}

/// A point of the surface.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub head: ElemHeader,
    pub co: Point3<f64>,
    pub no: Vector3<f64>,
    /// Incident edges. Each edge appears once in each endpoint's list.
    pub edges: SmallVec<[EdgeKey; 6]>,
}

/// A pair of distinct vertices plus the anchor of its radial ring.
#[derive(Debug, Clone)]
pub struct Edge {
    pub head: ElemHeader,
    pub v1: VertexKey,
    pub v2: VertexKey,
    /// Any loop of the radial ring, or `None` for a wire edge.
    pub l: Option<LoopKey>,
}

impl Edge {
    /// Returns true if `v` is one of the endpoints.
    pub fn has_vertex(&self, v: VertexKey) -> bool {
        self.v1 == v || self.v2 == v
    }

    /// The endpoint opposite `v`, or `None` if `v` is not an endpoint.
    pub fn other_vertex(&self, v: VertexKey) -> Option<VertexKey> {
        if v == self.v1 {
            Some(self.v2)
        } else if v == self.v2 {
            Some(self.v1)
        } else {
            None
        }
    }
}

/// One face's traversal across one edge, starting at `v`.
#[derive(Debug, Clone)]
pub struct Loop {
    pub head: ElemHeader,
    pub v: VertexKey,
    pub e: EdgeKey,
    pub f: FaceKey,
    pub next: LoopKey,
    pub prev: LoopKey,
    pub radial_next: LoopKey,
    pub radial_prev: LoopKey,
}

/// One closed boundary cycle of a face, anchored at any of its loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopList {
    pub l: LoopKey,
}

/// A polygon: the first list is the outer boundary, the rest are holes.
///
/// `cent` and `no` are caches refreshed by `Mesh::recalc_face`; boundary
/// edits do not refresh them on their own.
#[derive(Debug, Clone)]
pub struct Face {
    pub head: ElemHeader,
    pub lists: SmallVec<[LoopList; 1]>,
    pub cent: Point3<f64>,
    pub no: Vector3<f64>,
}

impl Face {
    /// The outer boundary, if the face has any list.
    pub fn outer(&self) -> Option<LoopList> {
        self.lists.first().copied()
    }

    /// Hole boundaries.
    pub fn holes(&self) -> &[LoopList] {
        self.lists.get(1..).unwrap_or(&[])
    }
}

macro_rules! impl_element {
    ($ty:ty, $kind:expr) => {
        impl Element for $ty {
            const TYPE: ElemType = $kind;

            fn head(&self) -> &ElemHeader {
                &self.head
            }

            fn head_mut(&mut self) -> &mut ElemHeader {
                &mut self.head
            }
        }
    };
}

impl_element!(Vertex, ElemType::Vertex);
impl_element!(Edge, ElemType::Edge);
impl_element!(Loop, ElemType::Loop);
impl_element!(Face, ElemType::Face);
