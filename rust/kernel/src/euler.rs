// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Euler operators: kill, split, collapse and re-orient.
//!
//! Kill operations tolerate stale keys: a key that no longer resolves is
//! logged as a double free and ignored, since cascades (kill a vertex, which
//! kills its edges, which kill their faces) routinely reach the same element
//! twice. Every other operation reports a stale key as an error before it
//! mutates anything.

use rustc_hash::FxHashSet;
use smallvec::{smallvec, SmallVec};

use crate::elements::{Face, LoopList};
use crate::error::{Error, Result};
use crate::flags::ElemFlags;
use crate::keys::*;
use crate::mesh::Mesh;

impl Mesh {
    // =========================================================================
    // Kill
    // =========================================================================

    /// Removes a vertex together with its edges and their faces.
    pub fn kill_vertex(&mut self, v: VertexKey) {
        if !self.verts.contains(v) {
            tracing::warn!(vertex = ?v, "kill_vertex: vertex already freed");
            return;
        }

        let cap = self.config.max_vert_edges;
        let mut guard = 0;
        while let Some(&e) = self.verts[v].edges.first() {
            if guard >= cap {
                tracing::warn!(vertex = ?v, cap, "kill_vertex: incident edges did not drain");
                break;
            }
            guard += 1;

            if self.edges.contains(e) {
                self.kill_edge(e);
            } else {
                tracing::warn!(vertex = ?v, edge = ?e, "kill_vertex: stale incident edge");
            }
            // kill_edge normally detaches e; make sure a corrupt ring cannot
            // keep it at the front forever.
            self.verts[v].edges.retain(|x| *x != e);
        }

        self.free_vertex(v);
    }

    /// Removes an edge and every face in its radial ring.
    pub fn kill_edge(&mut self, e: EdgeKey) {
        let Some(edge) = self.edges.get(e) else {
            tracing::warn!(edge = ?e, "kill_edge: edge already freed");
            return;
        };
        let (v1, v2) = (edge.v1, edge.v2);

        let cap = self.config.max_edge_faces;
        let mut guard = 0;
        while let Some(l) = self.edges[e].l {
            if guard >= cap {
                tracing::warn!(edge = ?e, cap, "kill_edge: radial ring did not drain");
                break;
            }
            guard += 1;

            match self.loops.get(l).map(|lp| lp.f) {
                Some(f) if self.faces.contains(f) => self.kill_face(f),
                Some(_) => {
                    tracing::warn!(edge = ?e, loop_key = ?l, "kill_edge: loop without a face");
                    self.radial_remove(e, l);
                    self.free_loop(l);
                }
                None => {
                    tracing::warn!(edge = ?e, loop_key = ?l, "kill_edge: ring anchor already freed");
                    self.edges[e].l = None;
                }
            }
        }

        for v in [v1, v2] {
            if let Some(vert) = self.verts.get_mut(v) {
                vert.edges.retain(|x| *x != e);
            }
        }
        self.free_edge(e);
    }

    /// Removes a face and its loops. Edges and vertices stay.
    pub fn kill_face(&mut self, f: FaceKey) {
        let Some(face) = self.faces.get(f) else {
            tracing::warn!(face = ?f, "kill_face: face already freed");
            return;
        };

        for list in face.lists.clone() {
            for l in self.list_loops(list.l) {
                let e = self.loops[l].e;
                if self.edges.contains(e) {
                    self.radial_remove(e, l);
                }
                self.free_loop(l);
            }
        }
        self.free_face(f);
    }

    /// Kills any element. A loop cannot exist on its own, so killing one
    /// kills its face.
    pub fn kill_elem(&mut self, key: ElemKey) {
        match key {
            ElemKey::Vertex(v) => self.kill_vertex(v),
            ElemKey::Edge(e) => self.kill_edge(e),
            ElemKey::Face(f) => self.kill_face(f),
            ElemKey::Loop(l) => match self.loops.get(l) {
                Some(lp) => {
                    let f = lp.f;
                    self.kill_face(f);
                }
                None => tracing::warn!(loop_key = ?l, "kill_elem: loop already freed"),
            },
        }
    }

    // =========================================================================
    // Split
    // =========================================================================

    /// Splits `e` at parameter `t` (0 at `v1`, 1 at `v2`).
    ///
    /// `e` keeps `v1` and now ends at the new vertex; the returned new edge
    /// runs from the new vertex to the old `v2`. Every face in the radial
    /// ring gains one loop at the new vertex, so both rings end up as long
    /// as the original one. Vertex attributes are interpolated, edge
    /// attributes copied, and new loops take the average of their
    /// neighbors.
    ///
    /// An edge that one face crosses twice (the single edge of a two-vertex
    /// face) is rejected, since both crossings would gain the same vertex.
    pub fn split_edge(&mut self, e: EdgeKey, t: f64) -> Result<(EdgeKey, VertexKey)> {
        let edge = self.edges.get(e).ok_or(Error::EdgeNotFound(e))?;
        if !t.is_finite() {
            return Err(Error::InvalidSplit(format!("edge parameter {t} is not finite")));
        }
        let ring = self.edge_loops(e);
        let mut ring_faces = FxHashSet::default();
        if !ring.iter().all(|&l| ring_faces.insert(self.loops[l].f)) {
            return Err(Error::InvalidSplit(
                "a face uses the edge more than once".into(),
            ));
        }
        let (v1, v2) = (edge.v1, edge.v2);
        let (a, b) = (&self.verts[v1], &self.verts[v2]);
        let co = a.co + (b.co - a.co) * t;
        let no = (a.no * (1.0 - t) + b.no * t)
            .try_normalize(1e-12)
            .unwrap_or(a.no);

        let nv = self.make_vertex(co);
        self.verts[nv].no = no;
        self.verts.interp_attrs(nv, &[v1, v2], &[1.0 - t, t]);

        for &l in &ring {
            self.radial_remove(e, l);
        }

        self.verts[v2].edges.retain(|x| *x != e);
        self.edges[e].v2 = nv;
        self.verts[nv].edges.push(e);
        let ne = self.make_edge(nv, v2)?;
        self.edges.copy_attrs(ne, e);

        if self.edges.is_selected(e) {
            self.edges.set_select(ne, true);
            self.verts.set_select(nv, true);
        }

        for l in ring {
            let (lv, f, next) = {
                let lp = &self.loops[l];
                (lp.v, lp.f, lp.next)
            };
            // A loop starting at v1 keeps e; one running v2 -> v1 moves to
            // the new edge and its new successor takes e.
            let (l_edge, nl_edge) = if lv == v1 {
                (e, ne)
            } else if lv == v2 {
                (ne, e)
            } else {
                tracing::warn!(edge = ?e, loop_key = ?l, "split_edge: loop does not start on the edge");
                self.radial_insert(e, l);
                continue;
            };

            let nl = self.make_loop(nv, nl_edge, f);
            self.loops[l].e = l_edge;
            self.link(nl, next);
            self.link(l, nl);
            self.radial_insert(l_edge, l);
            self.radial_insert(nl_edge, nl);
            self.loops.interp_attrs(nl, &[l, next], &[0.5, 0.5]);

            if let Some(face) = self.faces.get_mut(f) {
                face.head.flag.insert(ElemFlags::UPDATE);
            }
        }

        Ok((ne, nv))
    }

    /// Cuts a face along a new edge between the vertices of `l1` and `l2`.
    ///
    /// Both loops must lie on the outer boundary and must not be neighbors.
    /// The original face keeps the boundary from `l1` up to `l2` and all its
    /// holes; a new face takes the rest. Returns the new face's loop on the
    /// cutting edge.
    pub fn split_face(&mut self, f: FaceKey, l1: LoopKey, l2: LoopKey) -> Result<LoopKey> {
        let face = self.faces.get(f).ok_or(Error::FaceNotFound(f))?;
        for l in [l1, l2] {
            if !self.loops.contains(l) {
                return Err(Error::LoopNotFound(l));
            }
        }
        let outer = face
            .outer()
            .map(|list| self.list_loops(list.l))
            .unwrap_or_default();
        if !outer.contains(&l1) || !outer.contains(&l2) {
            return Err(Error::InvalidSplit(
                "loops are not on the face's outer boundary".into(),
            ));
        }
        if l1 == l2 || self.loops[l1].next == l2 || self.loops[l2].next == l1 {
            return Err(Error::InvalidSplit("loops are equal or adjacent".into()));
        }

        let (v1, v2) = (self.loops[l1].v, self.loops[l2].v);
        let (flag, no, face_cent) = (face.head.flag, face.no, face.cent);
        let ne = self.ensure_edge(v1, v2)?;

        let eid = self.next_eid();
        let mut head = self.faces.new_header(eid);
        head.flag = (flag & (ElemFlags::SELECT | ElemFlags::HIDE)) | ElemFlags::UPDATE;
        let nf = self.faces.push(Face {
            head,
            lists: smallvec![LoopList { l: l2 }],
            cent: face_cent,
            no,
        });
        self.register(eid, nf.into());
        self.faces.copy_attrs(nf, f);

        let start = outer.iter().position(|&l| l == l2).unwrap_or(0);
        for &l in outer.iter().cycle().skip(start).take_while(|&&l| l != l1) {
            self.loops[l].f = nf;
        }

        let (l1_prev, l2_prev) = (self.loops[l1].prev, self.loops[l2].prev);
        let old_side = self.make_loop(v2, ne, f);
        let new_side = self.make_loop(v1, ne, nf);

        self.link(l2_prev, old_side);
        self.link(old_side, l1);
        self.link(l1_prev, new_side);
        self.link(new_side, l2);

        self.radial_insert(ne, old_side);
        self.radial_insert(ne, new_side);
        self.loops.copy_attrs(old_side, l2);
        self.loops.copy_attrs(new_side, l1);

        if let Some(face) = self.faces.get_mut(f) {
            face.lists[0].l = l1;
            face.head.flag.insert(ElemFlags::UPDATE);
        }
        self.recalc_face(f);
        self.recalc_face(nf);
        Ok(new_side)
    }

    /// Splits whichever face has both vertices on its outer boundary (and
    /// not as neighbors) and returns the cutting edge.
    pub fn connect_verts(&mut self, v1: VertexKey, v2: VertexKey) -> Result<EdgeKey> {
        for v in [v1, v2] {
            if !self.verts.contains(v) {
                return Err(Error::VertexNotFound(v));
            }
        }

        for f in self.vert_faces(v1) {
            let Some(outer) = self.faces.get(f).and_then(|face| face.outer()) else {
                continue;
            };
            let loops = self.list_loops(outer.l);
            let find = |v: VertexKey| loops.iter().copied().find(|&l| self.loops[l].v == v);
            let (Some(l1), Some(l2)) = (find(v1), find(v2)) else {
                continue;
            };
            if self.loops[l1].next == l2 || self.loops[l2].next == l1 {
                continue;
            }
            let l = self.split_face(f, l1, l2)?;
            return Ok(self.loops[l].e);
        }

        Err(Error::InvalidSplit(
            "no face has both vertices as non-adjacent corners".into(),
        ))
    }

    // =========================================================================
    // Collapse
    // =========================================================================

    /// Collapses `e` onto its endpoint `keep` and returns `keep`.
    ///
    /// `keep` moves to the edge midpoint and takes the average of both
    /// endpoints' attributes. In every face crossing `e`, the two corners on
    /// the edge are averaged as well. The other endpoint is removed: its
    /// edges move onto `keep`, and one that would duplicate an edge `keep`
    /// already has is dropped instead.
    ///
    /// Boundaries left with fewer than three corners (or with a repeated
    /// corner) disappear. A face that loses its outer boundary, or that ends
    /// up with the same corners as another face, is killed.
    pub fn collapse_edge(&mut self, e: EdgeKey, keep: VertexKey) -> Result<VertexKey> {
        let edge = self.edges.get(e).ok_or(Error::EdgeNotFound(e))?;
        let gone = edge
            .other_vertex(keep)
            .ok_or(Error::VertexNotOnEdge { edge: e, vertex: keep })?;

        for l in self.edge_loops(e) {
            let next = self.loops[l].next;
            self.loops.interp_attrs(l, &[l, next], &[0.5, 0.5]);
            self.loops.copy_attrs(next, l);
        }
        self.verts.interp_attrs(keep, &[keep, gone], &[0.5, 0.5]);

        let (a, b) = (&self.verts[keep], &self.verts[gone]);
        let co = a.co + (b.co - a.co) * 0.5;
        let no = (a.no + b.no).try_normalize(1e-12).unwrap_or(a.no);
        let vert = &mut self.verts[keep];
        vert.co = co;
        vert.no = no;
        vert.head.flag.insert(ElemFlags::UPDATE);

        // Every face through `gone` is rebuilt, so take them all out of
        // their rings first.
        let faces = self.vert_faces(gone);
        for &f in &faces {
            for l in self.face_loops(f) {
                let le = self.loops[l].e;
                if self.edges.contains(le) {
                    self.radial_remove(le, l);
                }
            }
        }

        for ge in self.vert_edges(gone) {
            let Some(other) = self.edges.get(ge).and_then(|x| x.other_vertex(gone)) else {
                continue;
            };
            if let Some(vert) = self.verts.get_mut(other) {
                vert.edges.retain(|x| *x != ge);
            }
            if other == keep || self.get_edge(keep, other).is_some() {
                self.free_edge(ge);
                continue;
            }
            let moved = &mut self.edges[ge];
            if moved.v1 == gone {
                moved.v1 = keep;
            } else {
                moved.v2 = keep;
            }
            moved.head.flag.insert(ElemFlags::UPDATE);
            self.verts[keep].edges.push(ge);
            self.verts[other].edges.push(ge);
        }
        self.verts[gone].edges.clear();

        for f in faces {
            let Some(face) = self.faces.get(f) else {
                continue;
            };
            let mut lists: SmallVec<[LoopList; 1]> = SmallVec::new();
            let mut outer_lost = false;
            for (i, list) in face.lists.clone().into_iter().enumerate() {
                match self.collapse_list(list.l, keep, gone) {
                    Some(l) => lists.push(LoopList { l }),
                    None => outer_lost |= i == 0,
                }
            }

            if outer_lost {
                for list in &lists {
                    for l in self.list_loops(list.l) {
                        self.free_loop(l);
                    }
                }
                self.free_face(f);
                continue;
            }

            for list in &lists {
                for l in self.list_loops(list.l) {
                    let (v, next) = (self.loops[l].v, self.loops[l].next);
                    let next_v = self.loops[next].v;
                    let le = self.ensure_edge(v, next_v)?;
                    self.loops[l].e = le;
                    self.radial_insert(le, l);
                }
            }
            let face = &mut self.faces[f];
            face.lists = lists;
            face.head.flag.insert(ElemFlags::UPDATE);

            if self.has_twin_face(f) {
                self.kill_face(f);
            } else {
                self.recalc_face(f);
            }
        }

        self.free_vertex(gone);
        Ok(keep)
    }

    /// Renames `gone` to `keep` along one boundary cycle, drops the corners
    /// that became consecutive repeats and relinks the survivors. Returns the
    /// new anchor, or `None` (with every loop freed) if the cycle no longer
    /// bounds anything.
    fn collapse_list(&mut self, start: LoopKey, keep: VertexKey, gone: VertexKey) -> Option<LoopKey> {
        let loops = self.list_loops(start);
        let verts: Vec<VertexKey> = loops
            .iter()
            .map(|&l| match self.loops[l].v {
                v if v == gone => keep,
                v => v,
            })
            .collect();

        let n = loops.len();
        let mut kept = Vec::with_capacity(n);
        let mut seen = FxHashSet::default();
        let mut repeated = false;
        for i in 0..n {
            if verts[i] == verts[(i + 1) % n] {
                self.free_loop(loops[i]);
            } else {
                self.loops[loops[i]].v = verts[i];
                repeated |= !seen.insert(verts[i]);
                kept.push(loops[i]);
            }
        }

        if kept.len() < 3 || repeated {
            if repeated {
                tracing::warn!(vertex = ?keep, "collapse_edge: boundary pinched at the kept vertex");
            }
            for l in kept {
                self.free_loop(l);
            }
            return None;
        }

        let m = kept.len();
        for i in 0..m {
            self.link(kept[i], kept[(i + 1) % m]);
        }
        Some(kept[0])
    }

    /// Returns true if another face has exactly the same corners as `f`.
    fn has_twin_face(&self, f: FaceKey) -> bool {
        let mut verts = self.face_verts(f);
        verts.sort_unstable();
        let Some(&first) = verts.first() else {
            return false;
        };
        self.vert_faces(first).into_iter().any(|g| {
            let mut other = self.face_verts(g);
            other.sort_unstable();
            g != f && other == verts
        })
    }

    // =========================================================================
    // Orientation
    // =========================================================================

    /// Reverses every boundary cycle of a face and flips its cached normal.
    ///
    /// Loops stay at their vertices (so corner attributes stay put) and move
    /// to the edge they now traverse.
    pub fn reverse_winding(&mut self, f: FaceKey) -> Result<()> {
        let face = self.faces.get(f).ok_or(Error::FaceNotFound(f))?;

        for list in face.lists.clone() {
            let loops = self.list_loops(list.l);
            let n = loops.len();
            let edges: Vec<EdgeKey> = loops.iter().map(|&l| self.loops[l].e).collect();

            for (&l, &e) in loops.iter().zip(&edges) {
                self.radial_remove(e, l);
            }
            for (i, &l) in loops.iter().enumerate() {
                let lp = &mut self.loops[l];
                std::mem::swap(&mut lp.next, &mut lp.prev);
                lp.e = edges[(i + n - 1) % n];
            }
            for &l in &loops {
                let e = self.loops[l].e;
                self.radial_insert(e, l);
            }
        }

        let face = &mut self.faces[f];
        face.no = -face.no;
        face.head.flag.insert(ElemFlags::UPDATE);
        Ok(())
    }

    fn link(&mut self, a: LoopKey, b: LoopKey) {
        self.loops[a].next = b;
        self.loops[b].prev = a;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::{AttrType, AttrValue};
    use crate::config::MeshConfig;
    use crate::eid::Eid;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector2};

    fn grid_quad(mesh: &mut Mesh) -> (Vec<VertexKey>, FaceKey) {
        let v: Vec<_> = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]
            .iter()
            .map(|p| mesh.make_vertex(Point3::new(p[0], p[1], 0.0)))
            .collect();
        let f = mesh.make_face(&v).unwrap();
        (v, f)
    }

    // --- Kill tests ---

    #[test]
    fn kill_isolated_vertex() {
        let mut mesh = Mesh::new();
        let v = mesh.make_vertex(Point3::origin());
        mesh.kill_vertex(v);
        assert_eq!(mesh.vertex_count(), 0);
        assert!(mesh.eid_map.is_empty());
    }

    #[test]
    fn kill_vertex_cascades() {
        let mut mesh = Mesh::new();
        let (v, _) = grid_quad(&mut mesh);
        mesh.kill_vertex(v[0]);

        assert_eq!(mesh.face_count(), 0);
        assert_eq!(mesh.loop_count(), 0);
        assert_eq!(mesh.edge_count(), 2);
        assert_eq!(mesh.vertex_count(), 3);
        mesh.validate().unwrap();
    }

    #[test]
    fn kill_face_keeps_edges() {
        let mut mesh = Mesh::new();
        let (v, f) = grid_quad(&mut mesh);
        mesh.kill_face(f);

        assert_eq!(mesh.face_count(), 0);
        assert_eq!(mesh.edge_count(), 4);
        let e = mesh.get_edge(v[0], v[1]).unwrap();
        assert!(mesh.edges[e].l.is_none());
        mesh.validate().unwrap();
    }

    #[test]
    fn double_kill_is_noop() {
        let mut mesh = Mesh::new();
        let (v, f) = grid_quad(&mut mesh);
        mesh.kill_face(f);
        mesh.kill_face(f);
        mesh.kill_vertex(v[0]);
        mesh.kill_vertex(v[0]);
        mesh.kill_elem(ElemKey::Face(f));

        assert_eq!(mesh.vertex_count(), 3);
        mesh.validate().unwrap();
    }

    #[test]
    fn kill_elem_loop_kills_face() {
        let mut mesh = Mesh::new();
        let (_, f) = grid_quad(&mut mesh);
        let l = mesh.face_loops(f)[2];
        mesh.kill_elem(l.into());
        assert!(!mesh.faces.contains(f));
    }

    #[test]
    fn freed_vertex_carries_sentinel() {
        let mut mesh = Mesh::new();
        let v = mesh.make_vertex(Point3::origin());
        let freed = mesh.free_vertex(v).unwrap();
        assert_eq!(freed.head.eid, Eid::FREED);
    }

    #[test]
    fn kill_edge_with_misrouted_ring_loop() {
        let mut mesh = Mesh::new();
        let (v, f) = grid_quad(&mut mesh);
        let e = mesh.get_edge(v[0], v[1]).unwrap();
        let wrong = mesh.get_edge(v[1], v[2]).unwrap();

        // The only loop on e now claims to traverse another edge, so killing
        // its face cannot empty e's ring.
        let l = mesh.edges[e].l.unwrap();
        mesh.loops[l].e = wrong;

        mesh.kill_edge(e);
        assert!(!mesh.edges.contains(e));
        assert!(!mesh.faces.contains(f));
        assert_eq!(mesh.loop_count(), 0);
        assert_eq!(mesh.edge_count(), 3);
        mesh.validate().unwrap();
    }

    #[test]
    fn kill_edge_stops_at_ring_cap() {
        let config = MeshConfig {
            max_edge_faces: 2,
            ..MeshConfig::default()
        };
        let mut mesh = Mesh::with_config(config);
        let a = mesh.make_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.make_vertex(Point3::new(1.0, 0.0, 0.0));
        for z in [1.0, 2.0, 3.0] {
            let apex = mesh.make_vertex(Point3::new(0.5, 1.0, z));
            let f = mesh.make_tri(a, b, apex).unwrap();
            // Faces vanish without unlinking their loops.
            mesh.free_face(f);
        }
        let e = mesh.get_edge(a, b).unwrap();

        mesh.kill_edge(e);
        assert!(!mesh.edges.contains(e));
        assert_eq!(mesh.loop_count(), 7);
    }

    #[test]
    fn kill_vertex_skips_stale_incident_edge() {
        let mut mesh = Mesh::new();
        let (v, _) = grid_quad(&mut mesh);
        let stale = mesh.make_edge(v[1], v[3]).unwrap();
        mesh.kill_edge(stale);
        mesh.verts[v[0]].edges.insert(0, stale);

        mesh.kill_vertex(v[0]);
        assert!(!mesh.verts.contains(v[0]));
        assert_eq!(mesh.face_count(), 0);
        assert_eq!(mesh.edge_count(), 2);
        mesh.validate().unwrap();
    }

    #[test]
    fn kill_vertex_stops_at_edge_cap() {
        let config = MeshConfig {
            max_vert_edges: 2,
            ..MeshConfig::default()
        };
        let mut mesh = Mesh::with_config(config);
        let hub = mesh.make_vertex(Point3::origin());
        for x in [1.0, 2.0, 3.0] {
            let rim = mesh.make_vertex(Point3::new(x, 0.0, 0.0));
            mesh.make_edge(hub, rim).unwrap();
        }

        mesh.kill_vertex(hub);
        assert!(!mesh.verts.contains(hub));
        // The edge past the cap is left dangling and validation says so.
        assert_eq!(mesh.edge_count(), 1);
        assert!(mesh.validate().is_err());
    }

    // --- Split edge tests ---

    #[test]
    fn split_wire_edge() {
        let mut mesh = Mesh::new();
        let a = mesh.make_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.make_vertex(Point3::new(2.0, 0.0, 0.0));
        let e = mesh.make_edge(a, b).unwrap();

        let (ne, nv) = mesh.split_edge(e, 0.25).unwrap();
        assert_relative_eq!(mesh.verts[nv].co.x, 0.5);
        assert_eq!(mesh.edges[e].v1, a);
        assert_eq!(mesh.edges[e].v2, nv);
        assert_eq!(mesh.edges[ne].v1, nv);
        assert_eq!(mesh.edges[ne].v2, b);
        assert!(!mesh.vert_edges(b).contains(&e));
        mesh.validate().unwrap();
    }

    #[test]
    fn split_shared_edge_adds_loop_to_each_face() {
        let mut mesh = Mesh::new();
        let v: Vec<_> = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]
            .iter()
            .map(|p| mesh.make_vertex(Point3::new(p[0], p[1], 0.0)))
            .collect();
        let f1 = mesh.make_tri(v[0], v[1], v[2]).unwrap();
        let f2 = mesh.make_tri(v[0], v[2], v[3]).unwrap();
        let shared = mesh.get_edge(v[0], v[2]).unwrap();

        let (ne, nv) = mesh.split_edge(shared, 0.5).unwrap();

        assert_eq!(mesh.face_verts(f1).len(), 4);
        assert_eq!(mesh.face_verts(f2).len(), 4);
        assert!(mesh.face_verts(f1).contains(&nv));
        assert!(mesh.face_verts(f2).contains(&nv));
        assert_eq!(mesh.edge_face_count(shared), 2);
        assert_eq!(mesh.edge_face_count(ne), 2);
        mesh.validate().unwrap();
    }

    #[test]
    fn split_edge_interpolates_attributes() {
        let mut mesh = Mesh::new();
        let (v, f) = grid_quad(&mut mesh);
        let w = mesh.verts.add_layer(AttrType::Float, Some("weight")).unwrap();
        let uv = mesh.loops.add_layer(AttrType::Uv, None).unwrap();
        mesh.verts.set_attr(v[0], w, AttrValue::Float(0.0)).unwrap();
        mesh.verts.set_attr(v[1], w, AttrValue::Float(4.0)).unwrap();
        let loops = mesh.face_loops(f);
        mesh.loops.set_attr(loops[0], uv, AttrValue::Uv(Vector2::new(0.0, 0.0))).unwrap();
        mesh.loops.set_attr(loops[1], uv, AttrValue::Uv(Vector2::new(1.0, 0.0))).unwrap();

        let e = mesh.get_edge(v[0], v[1]).unwrap();
        let (_, nv) = mesh.split_edge(e, 0.25).unwrap();

        assert_eq!(mesh.verts.attr(nv, w), Some(&AttrValue::Float(1.0)));
        let nl = mesh.loops[loops[0]].next;
        assert_eq!(mesh.loops[nl].v, nv);
        assert_eq!(
            mesh.loops.attr(nl, uv),
            Some(&AttrValue::Uv(Vector2::new(0.5, 0.0)))
        );
    }

    #[test]
    fn split_edge_propagates_selection() {
        let mut mesh = Mesh::new();
        let (v, _) = grid_quad(&mut mesh);
        let e = mesh.get_edge(v[1], v[2]).unwrap();
        mesh.edges.set_select(e, true);

        let (ne, nv) = mesh.split_edge(e, 0.5).unwrap();
        assert!(mesh.edges.is_selected(ne));
        assert!(mesh.verts.is_selected(nv));
    }

    #[test]
    fn split_edge_rejects_bad_input() {
        let mut mesh = Mesh::new();
        let (v, _) = grid_quad(&mut mesh);
        let e = mesh.get_edge(v[0], v[1]).unwrap();
        assert!(matches!(
            mesh.split_edge(e, f64::NAN),
            Err(Error::InvalidSplit(_))
        ));
        mesh.kill_edge(e);
        assert!(matches!(mesh.split_edge(e, 0.5), Err(Error::EdgeNotFound(_))));
    }

    #[test]
    fn split_edge_rejects_two_vertex_face() {
        let mut mesh = Mesh::new();
        let a = mesh.make_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.make_vertex(Point3::new(1.0, 0.0, 0.0));
        mesh.make_face(&[a, b]).unwrap();
        let e = mesh.get_edge(a, b).unwrap();

        assert!(matches!(mesh.split_edge(e, 0.5), Err(Error::InvalidSplit(_))));
        assert_eq!(mesh.vertex_count(), 2);
        assert_eq!(mesh.edge_count(), 1);
        mesh.validate().unwrap();
    }

    // --- Split face tests ---

    #[test]
    fn split_quad_into_two_triangles() {
        let mut mesh = Mesh::new();
        let (v, f) = grid_quad(&mut mesh);
        let loops = mesh.face_loops(f);

        let nl = mesh.split_face(f, loops[0], loops[2]).unwrap();
        let nf = mesh.loops[nl].f;

        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.face_verts(f), vec![v[0], v[1], v[2]]);
        assert_eq!(mesh.face_verts(nf), vec![v[2], v[3], v[0]]);
        let diag = mesh.get_edge(v[0], v[2]).unwrap();
        assert_eq!(mesh.loops[nl].e, diag);
        assert_eq!(mesh.edge_face_count(diag), 2);
        mesh.validate().unwrap();
    }

    #[test]
    fn split_face_rejects_adjacent_loops() {
        let mut mesh = Mesh::new();
        let (_, f) = grid_quad(&mut mesh);
        let loops = mesh.face_loops(f);
        assert!(matches!(
            mesh.split_face(f, loops[0], loops[1]),
            Err(Error::InvalidSplit(_))
        ));
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn split_face_keeps_holes_on_original() {
        let mut mesh = Mesh::new();
        let outer: Vec<_> = [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]
            .iter()
            .map(|p| mesh.make_vertex(Point3::new(p[0], p[1], 0.0)))
            .collect();
        let inner: Vec<_> = [[1.0, 1.0], [1.0, 2.0], [2.0, 2.0]]
            .iter()
            .map(|p| mesh.make_vertex(Point3::new(p[0], p[1], 0.0)))
            .collect();
        let f = mesh.make_face(&outer).unwrap();
        mesh.make_hole(f, &inner).unwrap();
        let loops = mesh.face_loops(f);

        let nl = mesh.split_face(f, loops[1], loops[3]).unwrap();
        let nf = mesh.loops[nl].f;
        assert_eq!(mesh.faces[f].lists.len(), 2);
        assert_eq!(mesh.faces[nf].lists.len(), 1);
        mesh.validate().unwrap();
    }

    #[test]
    fn connect_verts_splits_face() {
        let mut mesh = Mesh::new();
        let (v, _) = grid_quad(&mut mesh);
        let e = mesh.connect_verts(v[1], v[3]).unwrap();

        assert!(mesh.edges[e].has_vertex(v[1]));
        assert!(mesh.edges[e].has_vertex(v[3]));
        assert_eq!(mesh.face_count(), 2);
        assert!(mesh.connect_verts(v[0], v[1]).is_err());
    }

    // --- Collapse tests ---

    /// Six triangles around a hub at the origin.
    fn hexagon_fan(mesh: &mut Mesh) -> (VertexKey, Vec<VertexKey>) {
        let hub = mesh.make_vertex(Point3::origin());
        let rim: Vec<_> = (0..6)
            .map(|i| {
                let a = std::f64::consts::FRAC_PI_3 * i as f64;
                mesh.make_vertex(Point3::new(a.cos(), a.sin(), 0.0))
            })
            .collect();
        for i in 0..6 {
            mesh.make_tri(hub, rim[i], rim[(i + 1) % 6]).unwrap();
        }
        (hub, rim)
    }

    #[test]
    fn collapse_spoke_of_fan() {
        let mut mesh = Mesh::new();
        let (hub, rim) = hexagon_fan(&mut mesh);
        let w = mesh.verts.add_layer(AttrType::Float, Some("weight")).unwrap();
        mesh.verts.set_attr(rim[0], w, AttrValue::Float(2.0)).unwrap();
        let spoke = mesh.get_edge(hub, rim[0]).unwrap();
        assert_eq!(mesh.edge_face_count(spoke), 2);

        let kept = mesh.collapse_edge(spoke, rim[0]).unwrap();

        assert_eq!(kept, rim[0]);
        assert!(!mesh.verts.contains(hub));
        assert!(!mesh.edges.contains(spoke));
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.face_count(), 4);
        assert_eq!(mesh.edge_count(), 9);
        assert_relative_eq!(mesh.verts[kept].co.x, 0.5);
        assert_eq!(mesh.verts.attr(kept, w), Some(&AttrValue::Float(1.0)));

        for far in [rim[2], rim[3], rim[4]] {
            let e = mesh.get_edge(kept, far).unwrap();
            assert_eq!(mesh.edge_face_count(e), 2);
        }
        for side in [rim[1], rim[5]] {
            let e = mesh.get_edge(kept, side).unwrap();
            assert_eq!(mesh.edge_face_count(e), 1);
        }
        mesh.validate().unwrap();
    }

    #[test]
    fn collapse_triangle_to_nothing() {
        let mut mesh = Mesh::new();
        let a = mesh.make_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.make_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.make_vertex(Point3::new(0.0, 1.0, 0.0));
        let f = mesh.make_tri(a, b, c).unwrap();
        let e = mesh.get_edge(a, b).unwrap();
        let b_eid = mesh.verts[b].head.eid;

        mesh.collapse_edge(e, a).unwrap();

        assert!(!mesh.faces.contains(f));
        assert_eq!(mesh.face_count(), 0);
        assert_eq!(mesh.loop_count(), 0);
        assert_eq!(mesh.vertex_count(), 2);
        assert_eq!(mesh.edge_count(), 1);
        assert!(mesh.get_edge(a, c).is_some());
        assert_eq!(mesh.lookup(b_eid), None);
        mesh.validate().unwrap();
    }

    #[test]
    fn collapse_quad_edge_averages_corners() {
        let mut mesh = Mesh::new();
        let (v, f) = grid_quad(&mut mesh);
        let uv = mesh.loops.add_layer(AttrType::Uv, None).unwrap();
        let loops = mesh.face_loops(f);
        mesh.loops.set_attr(loops[0], uv, AttrValue::Uv(Vector2::new(0.0, 0.0))).unwrap();
        mesh.loops.set_attr(loops[1], uv, AttrValue::Uv(Vector2::new(1.0, 0.0))).unwrap();
        let e = mesh.get_edge(v[0], v[1]).unwrap();

        mesh.collapse_edge(e, v[0]).unwrap();

        let mut verts = mesh.face_verts(f);
        verts.sort_unstable();
        let mut expected = vec![v[0], v[2], v[3]];
        expected.sort_unstable();
        assert_eq!(verts, expected);
        let corner = mesh
            .face_loops(f)
            .into_iter()
            .find(|&l| mesh.loops[l].v == v[0])
            .unwrap();
        assert_eq!(
            mesh.loops.attr(corner, uv),
            Some(&AttrValue::Uv(Vector2::new(0.5, 0.0)))
        );
        assert!(mesh.get_edge(v[0], v[2]).is_some());
        mesh.validate().unwrap();
    }

    #[test]
    fn collapse_rejects_foreign_vertex() {
        let mut mesh = Mesh::new();
        let (v, _) = grid_quad(&mut mesh);
        let e = mesh.get_edge(v[0], v[1]).unwrap();
        assert!(matches!(
            mesh.collapse_edge(e, v[2]),
            Err(Error::VertexNotOnEdge { .. })
        ));
        assert_eq!(mesh.vertex_count(), 4);
    }

    // --- Orientation tests ---

    #[test]
    fn reverse_winding_flips_order_and_normal() {
        let mut mesh = Mesh::new();
        let (v, f) = grid_quad(&mut mesh);
        let before = mesh.faces[f].no;

        mesh.reverse_winding(f).unwrap();

        assert_relative_eq!((mesh.faces[f].no + before).norm(), 0.0);
        let verts = mesh.face_verts(f);
        assert_eq!(verts, vec![v[0], v[3], v[2], v[1]]);
        for l in mesh.face_loops(f) {
            let lp = &mesh.loops[l];
            let next_v = mesh.loops[lp.next].v;
            assert!(mesh.edges[lp.e].has_vertex(lp.v));
            assert!(mesh.edges[lp.e].has_vertex(next_v));
        }
        mesh.recalc_face(f);
        assert_relative_eq!((mesh.faces[f].no + before).norm(), 0.0, epsilon = 1e-12);
        mesh.validate().unwrap();
    }
}
