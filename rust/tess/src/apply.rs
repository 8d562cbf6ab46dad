// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Destructive triangulation: replacing a face with triangle faces.

use halfmesh_kernel::{ElemFlags, FaceKey, Mesh, VertexKey};

use crate::config::TessConfig;
use crate::error::{Error, Result};
use crate::tessellate::face_triangles;

/// Replaces `f` with real triangle faces and returns them.
///
/// New faces copy the face attributes, selection and visibility of `f`, and
/// each new loop copies the attributes of the loop it was cut from. A face
/// that is already a triangle is returned as is; a degenerate face is left
/// alone and gives an empty list. Incomplete boundary recovery is an error
/// and leaves the mesh untouched.
pub fn triangulate_face(mesh: &mut Mesh, f: FaceKey, config: &TessConfig) -> Result<Vec<FaceKey>> {
    let (tris, converged) = face_triangles(mesh, f, config)?;
    if !converged {
        return Err(Error::TriangulationError(format!(
            "boundary recovery did not converge for face {f:?}"
        )));
    }
    if tris.is_empty() {
        tracing::debug!(face = ?f, "degenerate face left untouched");
        return Ok(Vec::new());
    }
    if mesh.faces[f].lists.len() == 1 && mesh.face_loops(f).len() == 3 {
        return Ok(vec![f]);
    }

    let corners: Vec<[VertexKey; 3]> = tris
        .iter()
        .map(|t| t.map(|l| mesh.loops[l].v))
        .collect();
    if let Some(bad) = corners
        .iter()
        .find(|[a, b, c]| a == b || b == c || c == a)
    {
        return Err(Error::TriangulationError(format!(
            "triangle repeats a vertex: {bad:?}"
        )));
    }

    let flag = mesh.faces[f].head.flag;
    let was_active = mesh.faces.active() == Some(f);

    let mut out = Vec::with_capacity(tris.len());
    for (tri, verts) in tris.iter().zip(&corners) {
        let nf = mesh.make_face(verts)?;
        mesh.faces.copy_attrs(nf, f);
        if flag.contains(ElemFlags::SELECT) {
            mesh.faces.set_select(nf, true);
        }
        if flag.contains(ElemFlags::HIDE) {
            if let Some(face) = mesh.faces.get_mut(nf) {
                face.head.flag.insert(ElemFlags::HIDE);
            }
        }
        for (nl, ol) in mesh.face_loops(nf).into_iter().zip(tri) {
            mesh.loops.copy_attrs(nl, *ol);
        }
        out.push(nf);
    }

    mesh.kill_face(f);
    if was_active {
        mesh.faces.set_active(out.first().copied());
    }
    tracing::debug!(face = ?f, triangles = out.len(), "triangulated face");
    Ok(out)
}
