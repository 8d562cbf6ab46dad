// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Construction: make operations for vertices, edges, faces and holes.
//!
//! Faces are built from ordered vertex sequences. Edges between consecutive
//! vertices are reused when they already exist, and each new loop joins its
//! edge's radial ring.

use nalgebra::{Point3, Vector3};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::elements::{Edge, Face, Loop, LoopList, Vertex};
use crate::error::{Error, Result};
use crate::flags::ElemFlags;
use crate::keys::*;
use crate::mesh::Mesh;

impl Mesh {
    // =========================================================================
    // Vertices and edges
    // =========================================================================

    /// Creates a vertex at `co`.
    pub fn make_vertex(&mut self, co: Point3<f64>) -> VertexKey {
        let eid = self.next_eid();
        let head = self.verts.new_header(eid);
        let v = self.verts.push(Vertex {
            head,
            co,
            no: Vector3::z(),
            edges: SmallVec::new(),
        });
        self.register(eid, v.into());
        v
    }

    /// Creates an edge between two distinct vertices.
    ///
    /// An existing edge between the same pair is not looked for; parallel
    /// edges are allowed here. Use [`Mesh::ensure_edge`] to reuse one.
    pub fn make_edge(&mut self, v1: VertexKey, v2: VertexKey) -> Result<EdgeKey> {
        if v1 == v2 {
            return Err(Error::SelfEdge(v1));
        }
        for v in [v1, v2] {
            if !self.verts.contains(v) {
                return Err(Error::VertexNotFound(v));
            }
        }

        let eid = self.next_eid();
        let head = self.edges.new_header(eid);
        let e = self.edges.push(Edge {
            head,
            v1,
            v2,
            l: None,
        });
        self.register(eid, e.into());

        self.verts[v1].edges.push(e);
        self.verts[v2].edges.push(e);
        Ok(e)
    }

    /// Returns an edge between `v1` and `v2`, creating it if needed.
    pub fn ensure_edge(&mut self, v1: VertexKey, v2: VertexKey) -> Result<EdgeKey> {
        match self.get_edge(v1, v2) {
            Some(e) => Ok(e),
            None => self.make_edge(v1, v2),
        }
    }

    // =========================================================================
    // Faces
    // =========================================================================

    /// Creates a face whose outer boundary visits `verts` in order.
    ///
    /// Fails without touching the mesh if fewer than two vertices are given,
    /// a vertex repeats, or a key is stale.
    pub fn make_face(&mut self, verts: &[VertexKey]) -> Result<FaceKey> {
        self.check_boundary(verts)?;

        let eid = self.next_eid();
        let head = self.faces.new_header(eid);
        let f = self.faces.push(Face {
            head,
            lists: SmallVec::new(),
            cent: Point3::origin(),
            no: Vector3::z(),
        });
        self.register(eid, f.into());

        let l = self.make_list(f, verts)?;
        self.faces[f].lists.push(LoopList { l });
        self.faces[f].head.flag.insert(ElemFlags::UPDATE);
        self.recalc_face(f);
        Ok(f)
    }

    /// Creates a triangle.
    pub fn make_tri(&mut self, v1: VertexKey, v2: VertexKey, v3: VertexKey) -> Result<FaceKey> {
        self.make_face(&[v1, v2, v3])
    }

    /// Creates a quad.
    pub fn make_quad(
        &mut self,
        v1: VertexKey,
        v2: VertexKey,
        v3: VertexKey,
        v4: VertexKey,
    ) -> Result<FaceKey> {
        self.make_face(&[v1, v2, v3, v4])
    }

    /// Adds a hole boundary visiting `verts` to an existing face.
    ///
    /// The hole's winding is taken as given. Returns the index of the new
    /// list in `Face::lists`.
    pub fn make_hole(&mut self, f: FaceKey, verts: &[VertexKey]) -> Result<usize> {
        if !self.faces.contains(f) {
            return Err(Error::FaceNotFound(f));
        }
        self.check_boundary(verts)?;

        let l = self.make_list(f, verts)?;
        let face = &mut self.faces[f];
        face.lists.push(LoopList { l });
        face.head.flag.insert(ElemFlags::UPDATE);
        Ok(face.lists.len() - 1)
    }

    fn check_boundary(&self, verts: &[VertexKey]) -> Result<()> {
        if verts.len() < 2 {
            return Err(Error::TooFewVertices(verts.len()));
        }
        let mut seen = FxHashSet::default();
        for &v in verts {
            if !self.verts.contains(v) {
                return Err(Error::VertexNotFound(v));
            }
            if !seen.insert(v) {
                return Err(Error::DuplicateVertex(v));
            }
        }
        Ok(())
    }

    /// Builds one closed boundary cycle for `f` and returns its first loop.
    fn make_list(&mut self, f: FaceKey, verts: &[VertexKey]) -> Result<LoopKey> {
        let n = verts.len();
        let mut loops = Vec::with_capacity(n);

        for i in 0..n {
            let e = self.ensure_edge(verts[i], verts[(i + 1) % n])?;
            let l = self.make_loop(verts[i], e, f);
            loops.push(l);
        }

        for i in 0..n {
            let l = loops[i];
            self.loops[l].next = loops[(i + 1) % n];
            self.loops[l].prev = loops[(i + n - 1) % n];
            let e = self.loops[l].e;
            self.radial_insert(e, l);
        }

        Ok(loops[0])
    }

    /// Allocates a loop that points at itself in both cycles.
    pub(crate) fn make_loop(&mut self, v: VertexKey, e: EdgeKey, f: FaceKey) -> LoopKey {
        let eid = self.next_eid();
        let head = self.loops.new_header(eid);
        let l = self.loops.push(Loop {
            head,
            v,
            e,
            f,
            next: LoopKey::default(),
            prev: LoopKey::default(),
            radial_next: LoopKey::default(),
            radial_prev: LoopKey::default(),
        });
        self.register(eid, l.into());

        let lp = &mut self.loops[l];
        lp.next = l;
        lp.prev = l;
        lp.radial_next = l;
        lp.radial_prev = l;
        l
    }

    // =========================================================================
    // Radial ring maintenance
    // =========================================================================

    /// Inserts `l` into the radial ring of `e`. An empty ring gets `l` as its
    /// only member; otherwise `l` goes right after the ring's anchor.
    pub(crate) fn radial_insert(&mut self, e: EdgeKey, l: LoopKey) {
        match self.edges[e].l {
            None => {
                self.edges[e].l = Some(l);
                let lp = &mut self.loops[l];
                lp.radial_next = l;
                lp.radial_prev = l;
            }
            Some(anchor) => {
                let next = self.loops[anchor].radial_next;
                let lp = &mut self.loops[l];
                lp.radial_prev = anchor;
                lp.radial_next = next;
                self.loops[next].radial_prev = l;
                self.loops[anchor].radial_next = l;
            }
        }
    }

    /// Unlinks `l` from the radial ring of `e`, moving the ring anchor if it
    /// pointed at `l`.
    pub(crate) fn radial_remove(&mut self, e: EdgeKey, l: LoopKey) {
        let (prev, next) = {
            let lp = &self.loops[l];
            (lp.radial_prev, lp.radial_next)
        };

        if self.edges[e].l == Some(l) {
            self.edges[e].l = if next == l { None } else { Some(next) };
        }

        if next != l {
            self.loops[prev].radial_next = next;
            self.loops[next].radial_prev = prev;
        }

        let lp = &mut self.loops[l];
        lp.radial_next = l;
        lp.radial_prev = l;
    }
}
