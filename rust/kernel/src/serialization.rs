// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Snapshots for the serialization collaborator.
//!
//! A [`MeshSnapshot`] stores every relation as an element id instead of an
//! arena key. Loading it runs the relink pass: boundary cycles are rebuilt
//! from the per-list loop order, radial rings from each loop's edge id, and
//! incident edge lists from edge endpoints. Loaded ids are reserved so the
//! generator never hands them out again.

use nalgebra::{Point3, Vector3};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::attr::AttrValue;
use crate::customdata::CustomData;
use crate::eid::Eid;
use crate::elements::{Edge, ElemHeader, Face, Loop, LoopList, Vertex};
use crate::error::{Error, Result};
use crate::flags::ElemFlags;
use crate::keys::*;
use crate::mesh::Mesh;

/// Serializable representation of a whole mesh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshSnapshot {
    /// Next id the generator would have handed out.
    pub eid_cursor: i64,
    pub vert_layers: CustomData,
    pub edge_layers: CustomData,
    pub loop_layers: CustomData,
    pub face_layers: CustomData,
    pub vertices: Vec<VertexSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
    pub faces: Vec<FaceSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexSnapshot {
    pub eid: Eid,
    pub co: Point3<f64>,
    pub no: Vector3<f64>,
    pub flag: ElemFlags,
    pub attrs: Vec<AttrValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub eid: Eid,
    pub v1: Eid,
    pub v2: Eid,
    pub flag: ElemFlags,
    pub attrs: Vec<AttrValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopSnapshot {
    pub eid: Eid,
    pub v: Eid,
    pub e: Eid,
    pub flag: ElemFlags,
    pub attrs: Vec<AttrValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceSnapshot {
    pub eid: Eid,
    pub flag: ElemFlags,
    pub attrs: Vec<AttrValue>,
    /// Boundary cycles in order, outer boundary first.
    pub lists: Vec<Vec<LoopSnapshot>>,
}

impl Mesh {
    /// Serializes the mesh to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_snapshot())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserializes a mesh from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let snap: MeshSnapshot =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        Self::from_snapshot(&snap)
    }

    /// Captures the mesh with every reference expressed as an eid.
    pub fn to_snapshot(&self) -> MeshSnapshot {
        let vertices = self
            .verts
            .iter()
            .map(|(_, v)| VertexSnapshot {
                eid: v.head.eid,
                co: v.co,
                no: v.no,
                flag: v.head.flag,
                attrs: v.head.attrs.clone(),
            })
            .collect();

        let edges = self
            .edges
            .iter()
            .map(|(_, e)| EdgeSnapshot {
                eid: e.head.eid,
                v1: self.verts[e.v1].head.eid,
                v2: self.verts[e.v2].head.eid,
                flag: e.head.flag,
                attrs: e.head.attrs.clone(),
            })
            .collect();

        let faces = self
            .faces
            .iter()
            .map(|(_, f)| FaceSnapshot {
                eid: f.head.eid,
                flag: f.head.flag,
                attrs: f.head.attrs.clone(),
                lists: f
                    .lists
                    .iter()
                    .map(|list| {
                        self.list_loops(list.l)
                            .into_iter()
                            .map(|l| {
                                let lp = &self.loops[l];
                                LoopSnapshot {
                                    eid: lp.head.eid,
                                    v: self.verts[lp.v].head.eid,
                                    e: self.edges[lp.e].head.eid,
                                    flag: lp.head.flag,
                                    attrs: lp.head.attrs.clone(),
                                }
                            })
                            .collect()
                    })
                    .collect(),
            })
            .collect();

        MeshSnapshot {
            eid_cursor: self.eidgen.max_cur(),
            vert_layers: self.verts.customdata().clone(),
            edge_layers: self.edges.customdata().clone(),
            loop_layers: self.loops.customdata().clone(),
            face_layers: self.faces.customdata().clone(),
            vertices,
            edges,
            faces,
        }
    }

    /// Rebuilds a mesh from a snapshot, relinking all cyclic relations.
    pub fn from_snapshot(snap: &MeshSnapshot) -> Result<Self> {
        let mut mesh = Mesh::new();
        mesh.verts.replace_customdata(snap.vert_layers.clone());
        mesh.edges.replace_customdata(snap.edge_layers.clone());
        mesh.loops.replace_customdata(snap.loop_layers.clone());
        mesh.faces.replace_customdata(snap.face_layers.clone());

        let mut vmap: FxHashMap<Eid, VertexKey> = FxHashMap::default();
        let mut emap: FxHashMap<Eid, EdgeKey> = FxHashMap::default();

        for vs in &snap.vertices {
            let head = mesh.loaded_header(vs.eid, vs.flag, &vs.attrs, mesh.verts.customdata())?;
            let v = mesh.verts.push(Vertex {
                head,
                co: vs.co,
                no: vs.no,
                edges: SmallVec::new(),
            });
            mesh.register(vs.eid, v.into());
            vmap.insert(vs.eid, v);
        }

        for es in &snap.edges {
            let v1 = resolve(&vmap, es.v1, "vertex")?;
            let v2 = resolve(&vmap, es.v2, "vertex")?;
            if v1 == v2 {
                return Err(Error::Serialization(format!("edge {} is a self edge", es.eid)));
            }
            let head = mesh.loaded_header(es.eid, es.flag, &es.attrs, mesh.edges.customdata())?;
            let e = mesh.edges.push(Edge { head, v1, v2, l: None });
            mesh.register(es.eid, e.into());
            mesh.verts[v1].edges.push(e);
            mesh.verts[v2].edges.push(e);
            emap.insert(es.eid, e);
        }

        for fs in &snap.faces {
            let head = mesh.loaded_header(fs.eid, fs.flag, &fs.attrs, mesh.faces.customdata())?;
            let f = mesh.faces.push(Face {
                head,
                lists: SmallVec::new(),
                cent: Point3::origin(),
                no: Vector3::z(),
            });
            mesh.register(fs.eid, f.into());

            for list in &fs.lists {
                if list.len() < 2 {
                    return Err(Error::Serialization(format!(
                        "face {} has a boundary of {} loops",
                        fs.eid,
                        list.len()
                    )));
                }
                let verts = list
                    .iter()
                    .map(|ls| resolve(&vmap, ls.v, "vertex"))
                    .collect::<Result<Vec<_>>>()?;
                let n = verts.len();
                let mut loops = Vec::with_capacity(n);
                for (i, ls) in list.iter().enumerate() {
                    let (v, next_v) = (verts[i], verts[(i + 1) % n]);
                    let e = resolve(&emap, ls.e, "edge")?;
                    let edge = &mesh.edges[e];
                    if !(edge.has_vertex(v) && edge.has_vertex(next_v)) {
                        return Err(Error::Serialization(format!(
                            "loop {} on edge {} does not join its vertex {} and the next one",
                            ls.eid, ls.e, ls.v
                        )));
                    }
                    let head = mesh.loaded_header(ls.eid, ls.flag, &ls.attrs, mesh.loops.customdata())?;
                    let l = mesh.loops.push(Loop {
                        head,
                        v,
                        e,
                        f,
                        next: LoopKey::default(),
                        prev: LoopKey::default(),
                        radial_next: LoopKey::default(),
                        radial_prev: LoopKey::default(),
                    });
                    mesh.register(ls.eid, l.into());
                    loops.push(l);
                }

                for i in 0..n {
                    let l = loops[i];
                    mesh.loops[l].next = loops[(i + 1) % n];
                    mesh.loops[l].prev = loops[(i + n - 1) % n];
                    let e = mesh.loops[l].e;
                    mesh.radial_insert(e, l);
                }
                mesh.faces[f].lists.push(LoopList { l: loops[0] });
            }

            if fs.lists.is_empty() {
                return Err(Error::Serialization(format!("face {} has no boundary", fs.eid)));
            }
            mesh.recalc_face(f);
        }

        mesh.eidgen = Default::default();
        mesh.eidgen.reserve(Eid(snap.eid_cursor - 1));
        for eid in mesh.eid_map.keys().copied().collect::<Vec<_>>() {
            mesh.eidgen.reserve(eid);
        }

        Ok(mesh)
    }

    fn loaded_header(
        &self,
        eid: Eid,
        flag: ElemFlags,
        attrs: &[AttrValue],
        layers: &CustomData,
    ) -> Result<ElemHeader> {
        if !eid.is_live() {
            return Err(Error::Serialization(format!("element has freed id {eid}")));
        }
        if self.eid_map.contains_key(&eid) {
            return Err(Error::Serialization(format!("duplicate element id {eid}")));
        }
        if attrs.len() != layers.len() {
            return Err(Error::Serialization(format!(
                "element {eid} has {} attributes, {} layers are registered",
                attrs.len(),
                layers.len()
            )));
        }
        for layer in layers.layers() {
            let ty = attrs.get(layer.index).map(AttrValue::attr_type);
            if ty != Some(layer.ty) {
                return Err(Error::Serialization(format!(
                    "element {eid}: slot {} does not hold a {} value",
                    layer.index, layer.ty
                )));
            }
        }
        let mut head = ElemHeader::new(eid, attrs.to_vec());
        head.flag = flag;
        Ok(head)
    }
}

fn resolve<K: Copy>(map: &FxHashMap<Eid, K>, eid: Eid, what: &str) -> Result<K> {
    map.get(&eid)
        .copied()
        .ok_or_else(|| Error::Serialization(format!("unresolved {what} id {eid}")))
}
