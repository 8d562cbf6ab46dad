// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end topology scenarios against the public API.

use halfmesh_kernel::{AttrType, ElemType, Error, Mesh, VertexKey};
use nalgebra::Point3;

fn square(mesh: &mut Mesh) -> [VertexKey; 4] {
    [
        mesh.make_vertex(Point3::new(0.0, 0.0, 0.0)),
        mesh.make_vertex(Point3::new(1.0, 0.0, 0.0)),
        mesh.make_vertex(Point3::new(1.0, 1.0, 0.0)),
        mesh.make_vertex(Point3::new(0.0, 1.0, 0.0)),
    ]
}

#[test]
fn quad_from_fresh_vertices() {
    let mut mesh = Mesh::new();
    let v = square(&mut mesh);
    let f = mesh.make_face(&v).unwrap();

    assert_eq!(mesh.face_count(), 1);
    assert_eq!(mesh.faces[f].lists.len(), 1);
    assert_eq!(mesh.list_len(mesh.faces[f].lists[0].l), 4);
    assert_eq!(mesh.edge_count(), 4);
    for e in mesh.edges.keys() {
        assert_eq!(mesh.edge_face_count(e), 1);
    }
    mesh.validate().unwrap();
}

#[test]
fn shared_edge_ring_follows_kills() {
    let mut mesh = Mesh::new();
    let v = square(&mut mesh);
    let f1 = mesh.make_face(&[v[0], v[1], v[2]]).unwrap();
    let f2 = mesh.make_face(&[v[0], v[2], v[3]]).unwrap();
    let shared = mesh.get_edge(v[0], v[2]).unwrap();
    assert_eq!(mesh.edge_face_count(shared), 2);

    mesh.kill_face(f1);

    assert_eq!(mesh.edge_face_count(shared), 1);
    assert_eq!(mesh.edge_faces(shared), vec![f2]);
    assert_eq!(mesh.face_verts(f2), vec![v[0], v[2], v[3]]);
    mesh.validate().unwrap();
}

#[test]
fn kill_lone_vertex() {
    let mut mesh = Mesh::new();
    let v = mesh.make_vertex(Point3::origin());
    let other = mesh.make_vertex(Point3::new(1.0, 0.0, 0.0));
    let eid = mesh.eid_of(v.into()).unwrap();

    mesh.kill_vertex(v);

    assert!(!mesh.verts.contains(v));
    assert!(mesh.lookup(eid).is_none());
    assert!(mesh.verts.contains(other));
    assert_eq!(mesh.edge_count(), 0);
}

#[test]
fn color_layer_reaches_existing_vertices() {
    let mut mesh = Mesh::new();
    let verts: Vec<_> = (0..10)
        .map(|i| mesh.make_vertex(Point3::new(i as f64, 0.0, 0.0)))
        .collect();
    mesh.add_layer(ElemType::Vertex, AttrType::Float, None).unwrap();
    let k = mesh.verts[verts[0]].head.attrs.len();

    let id = mesh
        .add_layer(ElemType::Vertex, AttrType::Color, Some("color"))
        .unwrap();
    for &v in &verts {
        assert_eq!(mesh.verts[v].head.attrs.len(), k + 1);
    }

    // Elements created afterwards get the slot too.
    let late = mesh.make_vertex(Point3::origin());
    assert_eq!(mesh.verts[late].head.attrs.len(), k + 1);

    mesh.rem_layer(ElemType::Vertex, id).unwrap();
    for &v in verts.iter().chain([&late]) {
        assert_eq!(mesh.verts[v].head.attrs.len(), k);
    }
    mesh.validate().unwrap();
}

#[test]
fn self_edge_is_rejected_for_every_vertex() {
    let mut mesh = Mesh::new();
    for v in square(&mut mesh) {
        assert!(matches!(mesh.make_edge(v, v), Err(Error::SelfEdge(_))));
    }
    assert_eq!(mesh.edge_count(), 0);
}

#[test]
fn radial_ring_cardinality_with_fins() {
    let mut mesh = Mesh::new();
    let a = mesh.make_vertex(Point3::new(0.0, 0.0, 0.0));
    let b = mesh.make_vertex(Point3::new(1.0, 0.0, 0.0));
    let mut faces = Vec::new();
    for i in 0..5 {
        let ang = i as f64;
        let c = mesh.make_vertex(Point3::new(0.5, ang.cos(), ang.sin()));
        faces.push(mesh.make_tri(a, b, c).unwrap());
    }
    let e = mesh.get_edge(a, b).unwrap();
    assert_eq!(mesh.edge_face_count(e), 5);

    // Walking radial_next returns to the start after exactly five steps.
    let start = mesh.edges[e].l.unwrap();
    let mut l = start;
    for _ in 0..5 {
        l = mesh.loops[l].radial_next;
    }
    assert_eq!(l, start);

    mesh.kill_face(faces[2]);
    assert_eq!(mesh.edge_face_count(e), 4);

    let (ne, _) = mesh.split_edge(e, 0.5).unwrap();
    assert_eq!(mesh.edge_face_count(e), 4);
    assert_eq!(mesh.edge_face_count(ne), 4);
    mesh.validate().unwrap();
}

#[test]
fn edit_sequence_keeps_invariants() {
    let mut mesh = Mesh::new();
    let v = square(&mut mesh);
    let f = mesh.make_face(&v).unwrap();
    mesh.loops.add_layer(AttrType::Uv, None).unwrap();

    let e = mesh.get_edge(v[1], v[2]).unwrap();
    let (_, mid) = mesh.split_edge(e, 0.5).unwrap();
    let diag = mesh.connect_verts(v[0], mid).unwrap();
    assert_eq!(mesh.edge_face_count(diag), 2);
    assert_eq!(mesh.face_count(), 2);

    mesh.reverse_winding(f).unwrap();
    mesh.validate().unwrap();

    mesh.kill_vertex(mid);
    assert_eq!(mesh.face_count(), 0);
    mesh.validate().unwrap();

    let restored = Mesh::from_json(&mesh.to_json().unwrap()).unwrap();
    assert_eq!(restored.vertex_count(), mesh.vertex_count());
    assert_eq!(restored.edge_count(), mesh.edge_count());
    restored.validate().unwrap();
}
