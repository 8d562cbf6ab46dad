// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face tessellation: loop triples covering each face.
//!
//! Triangles reference the face's own loops, so no vertices are created and
//! per-corner attributes stay reachable from every output corner.

use halfmesh_kernel::{ElemFlags, Error as KernelError, FaceKey, LoopKey, Mesh};
use nalgebra::{Point2, Point3, Vector3};

use crate::cdt::Cdt;
use crate::config::TessConfig;
use crate::error::Result;
use crate::predicates::is_convex;

/// One face's triangles as loop triples.
pub type FaceTriangles = Vec<[LoopKey; 3]>;

/// Per-face triangle lists for a whole mesh.
#[derive(Debug, Clone, Default)]
pub struct Tessellation {
    pub faces: Vec<(FaceKey, FaceTriangles)>,
    /// Faces whose boundary could not be fully recovered. Their triangles
    /// are in `faces` but may cross the boundary.
    pub non_converged: Vec<FaceKey>,
}

impl Tessellation {
    pub fn triangle_count(&self) -> usize {
        self.faces.iter().map(|(_, tris)| tris.len()).sum()
    }

    pub fn get(&self, f: FaceKey) -> Option<&[[LoopKey; 3]]> {
        self.faces
            .iter()
            .find(|(key, _)| *key == f)
            .map(|(_, tris)| tris.as_slice())
    }
}

/// Triangulates one face.
///
/// Triangles come back unchanged, quads are split along their better
/// diagonal and everything else goes through the constrained triangulator.
/// The triangles follow the winding of the outer boundary. Degenerate faces
/// give an empty list.
///
/// If boundary recovery gives up the best-effort triangles are returned
/// and a warning is logged.
pub fn tessellate_face(mesh: &Mesh, f: FaceKey, config: &TessConfig) -> Result<FaceTriangles> {
    let (tris, converged) = face_triangles(mesh, f, config)?;
    if !converged {
        tracing::warn!(face = ?f, "face tessellation is incomplete");
    }
    Ok(tris)
}

/// Tessellates every face of the mesh.
///
/// Faces that fail are logged and left out.
pub fn tessellate_mesh(mesh: &Mesh, config: &TessConfig) -> Tessellation {
    tessellate_keys(mesh, mesh.faces.keys().collect(), config)
}

/// Tessellates the faces flagged [`ElemFlags::UPDATE`] and clears the flag.
pub fn tessellate_dirty(mesh: &mut Mesh, config: &TessConfig) -> Tessellation {
    let dirty: Vec<FaceKey> = mesh
        .faces
        .iter()
        .filter(|(_, face)| face.head.flag.contains(ElemFlags::UPDATE))
        .map(|(f, _)| f)
        .collect();

    let out = tessellate_keys(mesh, dirty.clone(), config);
    for f in dirty {
        if let Some(face) = mesh.faces.get_mut(f) {
            face.head.flag.remove(ElemFlags::UPDATE);
        }
    }
    tracing::debug!(
        faces = out.faces.len(),
        triangles = out.triangle_count(),
        "tessellated dirty faces"
    );
    out
}

fn tessellate_keys(mesh: &Mesh, keys: Vec<FaceKey>, config: &TessConfig) -> Tessellation {
    let mut out = Tessellation::default();
    for f in keys {
        match face_triangles(mesh, f, config) {
            Ok((tris, converged)) => {
                if !converged {
                    out.non_converged.push(f);
                }
                out.faces.push((f, tris));
            }
            Err(err) => tracing::warn!(face = ?f, %err, "skipping face"),
        }
    }
    if !out.non_converged.is_empty() {
        tracing::warn!(
            count = out.non_converged.len(),
            "faces with incomplete tessellation"
        );
    }
    out
}

/// Triangles of a face and whether boundary recovery converged.
pub(crate) fn face_triangles(
    mesh: &Mesh,
    f: FaceKey,
    config: &TessConfig,
) -> Result<(FaceTriangles, bool)> {
    if !mesh.faces.contains(f) {
        return Err(KernelError::FaceNotFound(f).into());
    }
    let lists = mesh.face_lists(f);
    let Some(outer) = lists.first() else {
        return Ok((Vec::new(), true));
    };
    let has_holes = lists.len() > 1;

    // FAST PATH: triangle
    if !has_holes && outer.len() == 3 {
        return Ok((vec![[outer[0], outer[1], outer[2]]], true));
    }

    let Some(normal) = mesh.face_normal(f) else {
        tracing::debug!(face = ?f, "degenerate face, nothing to tessellate");
        return Ok((Vec::new(), true));
    };

    // FAST PATH: quad
    if !has_holes && outer.len() == 4 {
        let quad = [outer[0], outer[1], outer[2], outer[3]];
        return Ok((triangulate_quad(mesh, quad, &normal, config).to_vec(), true));
    }

    let basis = PlaneBasis::new(&normal);
    let projected: Vec<Vec<Point2<f64>>> = lists
        .iter()
        .map(|list| {
            list.iter()
                .map(|&l| basis.project(&mesh.verts[mesh.loops[l].v].co))
                .collect()
        })
        .collect();

    // FAST PATH: small convex face
    if config.convex_fast_path && !has_holes && outer.len() <= 8 && is_convex(&projected[0]) {
        let fan = (1..outer.len() - 1)
            .map(|i| [outer[0], outer[i], outer[i + 1]])
            .collect();
        return Ok((fan, true));
    }

    let flat: Vec<LoopKey> = lists.iter().flatten().copied().collect();
    let mut cdt = Cdt::new(config.clone());
    let mut offset = 0;
    for points in &projected {
        cdt.add_loop(points.iter().enumerate().map(|(i, p)| (*p, offset + i)));
        offset += points.len();
    }
    let out = cdt.generate();

    let tris = out
        .triangles
        .into_iter()
        .map(|t| t.map(|i| flat[i]))
        .collect();
    Ok((tris, out.converged))
}

/// Orthonormal basis of a face's plane with `u × v = n`, so boundaries wound
/// counter-clockwise about the normal stay counter-clockwise in 2D.
pub(crate) struct PlaneBasis {
    u: Vector3<f64>,
    v: Vector3<f64>,
}

impl PlaneBasis {
    pub(crate) fn new(normal: &Vector3<f64>) -> Self {
        // Find the axis least parallel to the normal for stable cross product
        let (ax, ay, az) = (normal.x.abs(), normal.y.abs(), normal.z.abs());
        let reference = if ax <= ay && ax <= az {
            Vector3::x()
        } else if ay <= az {
            Vector3::y()
        } else {
            Vector3::z()
        };

        let u = normal.cross(&reference).normalize();
        let v = normal.cross(&u).normalize();
        Self { u, v }
    }

    pub(crate) fn project(&self, p: &Point3<f64>) -> Point2<f64> {
        Point2::new(p.coords.dot(&self.u), p.coords.dot(&self.v))
    }
}

/// Splits a quad into two triangles.
///
/// The shorter diagonal wins. With `quad_dihedral_weight` each diagonal's
/// length is scaled by `2 - (cos + 1) / 2`, where `cos` is the cosine
/// between the two triangles' normals, so folding across a crease costs up
/// to twice its length. A diagonal that leaves a triangle facing against
/// `normal` is only used when the other one does too. If the chosen
/// diagonal already exists as a mesh edge the other one is used instead.
pub fn triangulate_quad(
    mesh: &Mesh,
    quad: [LoopKey; 4],
    normal: &Vector3<f64>,
    config: &TessConfig,
) -> [[LoopKey; 3]; 2] {
    let co = |i: usize| mesh.verts[mesh.loops[quad[i]].v].co;
    let p = [co(0), co(1), co(2), co(3)];

    // Diagonal 0-2 and diagonal 1-3.
    let splits = [[[0, 1, 2], [0, 2, 3]], [[1, 2, 3], [1, 3, 0]]];
    let diagonals = [(0, 2), (1, 3)];

    let score = |k: usize| -> (bool, f64) {
        let [t1, t2] = splits[k];
        let n1 = (p[t1[1]] - p[t1[0]]).cross(&(p[t1[2]] - p[t1[0]]));
        let n2 = (p[t2[1]] - p[t2[0]]).cross(&(p[t2[2]] - p[t2[0]]));
        let valid = n1.dot(normal) >= 0.0 && n2.dot(normal) >= 0.0;

        let (a, b) = diagonals[k];
        let mut len = (p[b] - p[a]).norm();
        if config.quad_dihedral_weight {
            let cos = match (n1.try_normalize(1e-15), n2.try_normalize(1e-15)) {
                (Some(n1), Some(n2)) => n1.dot(&n2),
                _ => 1.0,
            };
            len *= 2.0 - (cos * 0.5 + 0.5);
        }
        (valid, len)
    };
    let (valid0, len0) = score(0);
    let (valid1, len1) = score(1);

    let mut pick = match (valid0, valid1) {
        (true, false) => 0,
        (false, true) => 1,
        _ if len1 < len0 => 1,
        _ => 0,
    };

    let other = 1 - pick;
    let other_valid = if other == 0 { valid0 } else { valid1 };
    let (a, b) = diagonals[pick];
    let existing = mesh
        .get_edge(mesh.loops[quad[a]].v, mesh.loops[quad[b]].v)
        .is_some();
    if existing && other_valid {
        pick = other;
    }

    splits[pick].map(|t| t.map(|i| quad[i]))
}
