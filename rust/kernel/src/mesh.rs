// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The mesh: per-kind element collections plus element identity.
//!
//! The [`Mesh`] is the central owner of all mesh data. Vertices, edges, loops
//! and faces each live in an [`ElementList`]; the mesh adds the eid generator
//! and the eid → key map that serialized references resolve through.
//!
//! ## Topology
//!
//! Every loop belongs to exactly one boundary cycle of its face (`next` /
//! `prev`) and exactly one radial ring of its edge (`radial_next` /
//! `radial_prev`). An edge's ring holds one loop per incident face, so a
//! ring of length three or more is a non-manifold edge and is legal.

use rustc_hash::FxHashMap;

use crate::attr::AttrType;
use crate::config::MeshConfig;
use crate::eid::{Eid, EidGen};
use crate::elements::{Edge, Face, Loop, Vertex};
use crate::error::Result;
use crate::keys::*;
use crate::list::ElementList;

/// A polygon mesh with half-edge style boundary cycles and radial rings.
///
/// # Example
///
/// ```
/// use halfmesh_kernel::Mesh;
/// use nalgebra::Point3;
///
/// let mut mesh = Mesh::new();
/// let a = mesh.make_vertex(Point3::new(0.0, 0.0, 0.0));
/// let b = mesh.make_vertex(Point3::new(1.0, 0.0, 0.0));
/// let c = mesh.make_vertex(Point3::new(0.0, 1.0, 0.0));
/// let f = mesh.make_face(&[a, b, c]).unwrap();
///
/// assert_eq!(mesh.edge_count(), 3);
/// assert_eq!(mesh.face_verts(f), vec![a, b, c]);
/// ```
#[derive(Debug, Clone)]
pub struct Mesh {
    pub verts: ElementList<VertexKey, Vertex>,
    pub edges: ElementList<EdgeKey, Edge>,
    pub loops: ElementList<LoopKey, Loop>,
    pub faces: ElementList<FaceKey, Face>,

    pub(crate) eidgen: EidGen,
    pub(crate) eid_map: FxHashMap<Eid, ElemKey>,
    pub(crate) config: MeshConfig,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    /// Creates an empty mesh with default traversal caps.
    pub fn new() -> Self {
        Self::with_config(MeshConfig::default())
    }

    pub fn with_config(config: MeshConfig) -> Self {
        Self {
            verts: ElementList::new(),
            edges: ElementList::new(),
            loops: ElementList::new(),
            faces: ElementList::new(),
            eidgen: EidGen::new(),
            eid_map: FxHashMap::default(),
            config,
        }
    }

    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    // --- Counts ---

    pub fn vertex_count(&self) -> usize {
        self.verts.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    // --- Identity ---

    /// Resolves an element id to its key.
    pub fn lookup(&self, eid: Eid) -> Option<ElemKey> {
        self.eid_map.get(&eid).copied()
    }

    /// The id of a live element.
    pub fn eid_of(&self, key: ElemKey) -> Option<Eid> {
        match key {
            ElemKey::Vertex(k) => self.verts.get(k).map(|x| x.head.eid),
            ElemKey::Edge(k) => self.edges.get(k).map(|x| x.head.eid),
            ElemKey::Loop(k) => self.loops.get(k).map(|x| x.head.eid),
            ElemKey::Face(k) => self.faces.get(k).map(|x| x.head.eid),
        }
    }

    /// Returns true if `key` refers to a live element.
    pub fn contains(&self, key: ElemKey) -> bool {
        match key {
            ElemKey::Vertex(k) => self.verts.contains(k),
            ElemKey::Edge(k) => self.edges.contains(k),
            ElemKey::Loop(k) => self.loops.contains(k),
            ElemKey::Face(k) => self.faces.contains(k),
        }
    }

    pub(crate) fn next_eid(&mut self) -> Eid {
        self.eidgen.alloc()
    }

    pub(crate) fn register(&mut self, eid: Eid, key: ElemKey) {
        self.eid_map.insert(eid, key);
    }

    // --- Custom data ---

    /// Adds a layer to every element of `kind`; returns the layer id.
    pub fn add_layer(&mut self, kind: ElemType, ty: AttrType, name: Option<&str>) -> Result<u32> {
        match kind {
            ElemType::Vertex => self.verts.add_layer(ty, name),
            ElemType::Edge => self.edges.add_layer(ty, name),
            ElemType::Loop => self.loops.add_layer(ty, name),
            ElemType::Face => self.faces.add_layer(ty, name),
        }
    }

    /// Removes layer `id` from every element of `kind`.
    pub fn rem_layer(&mut self, kind: ElemType, id: u32) -> Result<()> {
        match kind {
            ElemType::Vertex => self.verts.rem_layer(id),
            ElemType::Edge => self.edges.rem_layer(id),
            ElemType::Loop => self.loops.rem_layer(id),
            ElemType::Face => self.faces.rem_layer(id),
        }
    }

    /// Removes temporary layers from all four kinds.
    pub fn strip_temp_layers(&mut self) -> usize {
        self.verts.strip_temp_layers()
            + self.edges.strip_temp_layers()
            + self.loops.strip_temp_layers()
            + self.faces.strip_temp_layers()
    }

    // --- Freeing ---
    //
    // These only drop the element from its collection and the eid map. The
    // callers in `euler` unlink it from the topology first.

    pub(crate) fn free_vertex(&mut self, key: VertexKey) -> Option<Vertex> {
        let eid = self.verts.get(key)?.head.eid;
        self.eid_map.remove(&eid);
        self.verts.remove(key)
    }

    pub(crate) fn free_edge(&mut self, key: EdgeKey) -> Option<Edge> {
        let eid = self.edges.get(key)?.head.eid;
        self.eid_map.remove(&eid);
        self.edges.remove(key)
    }

    pub(crate) fn free_loop(&mut self, key: LoopKey) -> Option<Loop> {
        let eid = self.loops.get(key)?.head.eid;
        self.eid_map.remove(&eid);
        self.loops.remove(key)
    }

    pub(crate) fn free_face(&mut self, key: FaceKey) -> Option<Face> {
        let eid = self.faces.get(key)?.head.eid;
        self.eid_map.remove(&eid);
        self.faces.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn new_mesh_is_empty() {
        let mesh = Mesh::new();
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.face_count(), 0);
        assert!(mesh.eid_map.is_empty());
    }

    #[test]
    fn lookup_resolves_eids() {
        let mut mesh = Mesh::new();
        let v = mesh.make_vertex(Point3::new(1.0, 2.0, 3.0));
        let eid = mesh.eid_of(v.into()).unwrap();

        assert_eq!(mesh.lookup(eid), Some(ElemKey::Vertex(v)));
        mesh.kill_vertex(v);
        assert_eq!(mesh.lookup(eid), None);
        assert_eq!(mesh.eid_of(v.into()), None);
    }

    #[test]
    fn add_layer_by_kind() {
        let mut mesh = Mesh::new();
        let v = mesh.make_vertex(Point3::origin());
        let id = mesh.add_layer(ElemType::Vertex, AttrType::Color, None).unwrap();

        assert_eq!(mesh.verts[v].head.attrs.len(), 1);
        assert!(mesh.add_layer(ElemType::Edge, AttrType::Uv, None).is_err());

        mesh.rem_layer(ElemType::Vertex, id).unwrap();
        assert!(mesh.verts[v].head.attrs.is_empty());
    }
}
