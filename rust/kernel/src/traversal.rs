// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Traversal of boundary cycles, radial rings and vertex fans.
//!
//! Every circular walk stops when it returns to its anchor. If it has not
//! returned after the cap in [`MeshConfig`](crate::MeshConfig), or it runs
//! into a key that no longer resolves, the walk logs a warning and returns
//! what it collected so far.

use rustc_hash::FxHashSet;

use crate::elements::Loop;
use crate::error::{Error, Result};
use crate::keys::*;
use crate::mesh::Mesh;

impl Mesh {
    fn walk(
        &self,
        start: LoopKey,
        step: impl Fn(&Loop) -> LoopKey,
        cap: usize,
        what: &'static str,
    ) -> Vec<LoopKey> {
        let mut out = Vec::new();
        let mut l = start;
        loop {
            let Some(lp) = self.loops.get(l) else {
                tracing::warn!(loop_key = ?l, what, "walk reached a freed loop");
                break;
            };
            out.push(l);
            l = step(lp);
            if l == start {
                break;
            }
            if out.len() >= cap {
                tracing::warn!(start = ?start, cap, what, "cycle did not close within cap");
                break;
            }
        }
        out
    }

    // =========================================================================
    // Boundary cycles
    // =========================================================================

    /// Loops of the boundary cycle containing `start`, beginning at `start`.
    pub fn list_loops(&self, start: LoopKey) -> Vec<LoopKey> {
        self.walk(start, |l| l.next, self.config.max_face_verts, "boundary")
    }

    /// Length of the boundary cycle containing `start`.
    pub fn list_len(&self, start: LoopKey) -> usize {
        self.list_loops(start).len()
    }

    /// Loops of every boundary of a face, outer boundary first.
    pub fn face_loops(&self, f: FaceKey) -> Vec<LoopKey> {
        let Some(face) = self.faces.get(f) else {
            return Vec::new();
        };
        face.lists
            .iter()
            .flat_map(|list| self.list_loops(list.l))
            .collect()
    }

    /// Loops of each boundary of a face, one vector per list.
    pub fn face_lists(&self, f: FaceKey) -> Vec<Vec<LoopKey>> {
        let Some(face) = self.faces.get(f) else {
            return Vec::new();
        };
        face.lists.iter().map(|list| self.list_loops(list.l)).collect()
    }

    /// Boundary vertices of a face in cycle order, outer boundary first.
    pub fn face_verts(&self, f: FaceKey) -> Vec<VertexKey> {
        self.face_loops(f)
            .into_iter()
            .filter_map(|l| self.loops.get(l).map(|lp| lp.v))
            .collect()
    }

    /// Boundary edges of a face in cycle order, outer boundary first.
    pub fn face_edges(&self, f: FaceKey) -> Vec<EdgeKey> {
        self.face_loops(f)
            .into_iter()
            .filter_map(|l| self.loops.get(l).map(|lp| lp.e))
            .collect()
    }

    // =========================================================================
    // Radial rings
    // =========================================================================

    /// Loops of an edge's radial ring; empty for a wire edge.
    pub fn edge_loops(&self, e: EdgeKey) -> Vec<LoopKey> {
        match self.edges.get(e).and_then(|edge| edge.l) {
            Some(start) => self.walk(start, |l| l.radial_next, self.config.max_edge_faces, "radial"),
            None => Vec::new(),
        }
    }

    /// Faces incident to an edge, one per ring member.
    pub fn edge_faces(&self, e: EdgeKey) -> Vec<FaceKey> {
        self.edge_loops(e)
            .into_iter()
            .filter_map(|l| self.loops.get(l).map(|lp| lp.f))
            .collect()
    }

    /// Radial ring length of an edge.
    pub fn edge_face_count(&self, e: EdgeKey) -> usize {
        self.edge_loops(e).len()
    }

    // =========================================================================
    // Vertex fans
    // =========================================================================

    /// Incident edges of a vertex.
    pub fn vert_edges(&self, v: VertexKey) -> Vec<EdgeKey> {
        self.verts
            .get(v)
            .map(|vert| vert.edges.to_vec())
            .unwrap_or_default()
    }

    /// Faces that use a vertex, each once.
    pub fn vert_faces(&self, v: VertexKey) -> Vec<FaceKey> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for e in self.vert_edges(v) {
            for f in self.edge_faces(e) {
                if seen.insert(f) {
                    out.push(f);
                }
            }
        }
        out
    }

    /// Vertices sharing an edge with `v`.
    pub fn vert_neighbors(&self, v: VertexKey) -> Vec<VertexKey> {
        self.vert_edges(v)
            .into_iter()
            .filter_map(|e| self.edges.get(e).and_then(|edge| edge.other_vertex(v)))
            .collect()
    }

    // =========================================================================
    // Edge queries
    // =========================================================================

    /// Returns an edge between `v1` and `v2`, if any. With parallel edges the
    /// first one in `v1`'s incident list wins.
    pub fn get_edge(&self, v1: VertexKey, v2: VertexKey) -> Option<EdgeKey> {
        let vert = self.verts.get(v1)?;
        vert.edges.iter().copied().find(|&e| {
            self.edges
                .get(e)
                .is_some_and(|edge| edge.other_vertex(v1) == Some(v2))
        })
    }

    /// The endpoint of `e` opposite `v`.
    pub fn other_vertex(&self, e: EdgeKey, v: VertexKey) -> Result<VertexKey> {
        let edge = self.edges.get(e).ok_or(Error::EdgeNotFound(e))?;
        edge.other_vertex(v)
            .ok_or(Error::VertexNotOnEdge { edge: e, vertex: v })
    }
}
