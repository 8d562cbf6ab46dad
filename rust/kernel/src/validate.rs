// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Structural validation of a mesh.
//!
//! [`Mesh::validate`] checks every topological invariant the Euler operators
//! are supposed to preserve and reports the problems it finds. It is meant
//! for tests and debug assertions; nothing in the kernel calls it on its own.

use crate::elements::Element;
use crate::error::{Error, Result};
use crate::list::ElementList;
use crate::mesh::Mesh;

impl Mesh {
    /// Checks cycle closure and back-links, loop/edge/vertex consistency,
    /// incident edge lists, attribute array lengths and the eid map.
    pub fn validate(&self) -> Result<()> {
        let problems = self.collect_problems();
        match problems.first() {
            None => Ok(()),
            Some(first) => Err(Error::Corrupt {
                count: problems.len(),
                first: first.clone(),
            }),
        }
    }

    /// Every broken invariant found, as human-readable lines.
    pub fn collect_problems(&self) -> Vec<String> {
        let mut out = Vec::new();

        // Vertices: incident edges must be live and actually touch the vertex.
        for (v, vert) in self.verts.iter() {
            for &e in &vert.edges {
                match self.edges.get(e) {
                    Some(edge) if edge.has_vertex(v) => {}
                    Some(_) => out.push(format!("vertex {v:?} lists edge {e:?} that does not use it")),
                    None => out.push(format!("vertex {v:?} lists freed edge {e:?}")),
                }
            }
        }

        // Edges: distinct live endpoints that list the edge back; ring sanity.
        for (e, edge) in self.edges.iter() {
            if edge.v1 == edge.v2 {
                out.push(format!("edge {e:?} is a self edge"));
            }
            for v in [edge.v1, edge.v2] {
                let listed = self
                    .verts
                    .get(v)
                    .map(|vert| vert.edges.iter().filter(|&&x| x == e).count());
                match listed {
                    Some(1) => {}
                    Some(n) => out.push(format!("vertex {v:?} lists edge {e:?} {n} times")),
                    None => out.push(format!("edge {e:?} uses freed vertex {v:?}")),
                }
            }
            for l in self.edge_loops(e) {
                let lp = &self.loops[l];
                if lp.e != e {
                    out.push(format!("loop {l:?} is in the ring of {e:?} but traverses {:?}", lp.e));
                }
                if self.loops.get(lp.radial_next).map(|n| n.radial_prev) != Some(l) {
                    out.push(format!("loop {l:?}: radial_next.radial_prev is not itself"));
                }
            }
        }

        // Loops: live owners, closed cycles, edge joins v and next.v.
        let mut ringed = 0;
        for (l, lp) in self.loops.iter() {
            if !self.faces.contains(lp.f) {
                out.push(format!("loop {l:?} belongs to freed face {:?}", lp.f));
            }
            let Some(next) = self.loops.get(lp.next) else {
                out.push(format!("loop {l:?} has a freed next"));
                continue;
            };
            if next.prev != l {
                out.push(format!("loop {l:?}: next.prev is not itself"));
            }
            match self.edges.get(lp.e) {
                Some(edge) => {
                    if !(edge.has_vertex(lp.v) && edge.has_vertex(next.v)) {
                        out.push(format!("loop {l:?}: edge {:?} does not join v and next.v", lp.e));
                    }
                    if self.edge_loops(lp.e).contains(&l) {
                        ringed += 1;
                    } else {
                        out.push(format!("loop {l:?} is missing from the ring of {:?}", lp.e));
                    }
                }
                None => out.push(format!("loop {l:?} traverses freed edge {:?}", lp.e)),
            }
        }
        let ring_total: usize = self.edges.keys().map(|e| self.edge_face_count(e)).sum();
        if ring_total != ringed {
            out.push(format!("radial rings hold {ring_total} loops, {ringed} loops are ringed"));
        }

        // Faces: every list closes and its loops point back at the face.
        let mut listed = 0;
        for (f, face) in self.faces.iter() {
            if face.lists.is_empty() {
                out.push(format!("face {f:?} has no boundary"));
            }
            for list in &face.lists {
                let loops = self.list_loops(list.l);
                let closes = loops
                    .last()
                    .and_then(|&l| self.loops.get(l))
                    .is_some_and(|lp| lp.next == list.l);
                if !closes {
                    out.push(format!("face {f:?}: boundary at {:?} does not close", list.l));
                }
                for l in &loops {
                    if self.loops[*l].f != f {
                        out.push(format!("face {f:?}: loop {l:?} points at another face"));
                    }
                }
                listed += loops.len();
            }
        }
        if listed != self.loops.len() {
            out.push(format!("{} loops exist, {listed} are on face boundaries", self.loops.len()));
        }

        check_attrs(&self.verts, &mut out);
        check_attrs(&self.edges, &mut out);
        check_attrs(&self.loops, &mut out);
        check_attrs(&self.faces, &mut out);

        // Eid map: one entry per live element, each resolving back.
        let live = self.verts.len() + self.edges.len() + self.loops.len() + self.faces.len();
        if self.eid_map.len() != live {
            out.push(format!("eid map has {} entries for {live} elements", self.eid_map.len()));
        }
        for (eid, key) in &self.eid_map {
            if self.eid_of(*key) != Some(*eid) {
                out.push(format!("eid {eid} maps to {key:?} which does not carry it"));
            }
        }

        out
    }
}

fn check_attrs<K: slotmap::Key, T: Element>(list: &ElementList<K, T>, out: &mut Vec<String>) {
    let layers = list.customdata().layers();
    for (k, item) in list.iter() {
        let attrs = &item.head().attrs;
        if attrs.len() != layers.len() {
            out.push(format!(
                "{} {k:?} has {} attributes, expected {}",
                T::TYPE,
                attrs.len(),
                layers.len()
            ));
            continue;
        }
        for (value, layer) in attrs.iter().zip(layers) {
            if value.attr_type() != layer.ty {
                out.push(format!("{} {k:?}: slot {} holds {}", T::TYPE, layer.index, value.attr_type()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::attr::AttrType;
    use crate::error::Error;
    use crate::mesh::Mesh;
    use nalgebra::Point3;

    #[test]
    fn fresh_mesh_validates() {
        let mut mesh = Mesh::new();
        let v: Vec<_> = (0..5)
            .map(|i| {
                let a = i as f64 * std::f64::consts::TAU / 5.0;
                mesh.make_vertex(Point3::new(a.cos(), a.sin(), 0.0))
            })
            .collect();
        mesh.make_face(&v).unwrap();
        mesh.loops.add_layer(AttrType::Uv, None).unwrap();
        mesh.validate().unwrap();
    }

    #[test]
    fn broken_back_link_is_reported() {
        let mut mesh = Mesh::new();
        let a = mesh.make_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.make_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.make_vertex(Point3::new(0.0, 1.0, 0.0));
        let f = mesh.make_tri(a, b, c).unwrap();
        let loops = mesh.face_loops(f);
        mesh.loops[loops[1]].prev = loops[2];

        match mesh.validate() {
            Err(Error::Corrupt { count, first }) => {
                assert!(count >= 1);
                assert!(first.contains("next.prev"));
            }
            other => panic!("expected corruption, got {other:?}"),
        }
    }

    #[test]
    fn stray_incident_edge_is_reported() {
        let mut mesh = Mesh::new();
        let a = mesh.make_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.make_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.make_vertex(Point3::new(2.0, 0.0, 0.0));
        let e = mesh.make_edge(a, b).unwrap();
        mesh.verts[c].edges.push(e);

        assert!(!mesh.collect_problems().is_empty());
    }
}
