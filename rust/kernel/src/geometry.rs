// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometric queries on faces and the cached face/vertex normals.

use nalgebra::{Point3, Vector3};

use crate::keys::*;
use crate::mesh::Mesh;

/// Newell normal of a closed polygon, not normalized.
///
/// Its length is twice the polygon's area for planar input.
pub fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let n = points.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let curr = points[i];
        let next = points[(i + 1) % n];
        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }
    normal
}

impl Mesh {
    fn list_points(&self, start: LoopKey) -> Vec<Point3<f64>> {
        self.list_loops(start)
            .into_iter()
            .filter_map(|l| self.loops.get(l))
            .filter_map(|lp| self.verts.get(lp.v).map(|v| v.co))
            .collect()
    }

    /// Outer boundary positions of a face in cycle order.
    pub fn face_points(&self, f: FaceKey) -> Option<Vec<Point3<f64>>> {
        let outer = self.faces.get(f)?.outer()?;
        Some(self.list_points(outer.l))
    }

    /// Computes the unit normal of a face's outer boundary using Newell's
    /// method. `None` for degenerate boundaries.
    pub fn face_normal(&self, f: FaceKey) -> Option<Vector3<f64>> {
        let points = self.face_points(f)?;
        if points.len() < 3 {
            return None;
        }
        newell_normal(&points).try_normalize(1e-15)
    }

    /// Average of the outer boundary positions.
    pub fn face_centroid(&self, f: FaceKey) -> Option<Point3<f64>> {
        let points = self.face_points(f)?;
        if points.is_empty() {
            return None;
        }
        let sum = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Some(Point3::from(sum / points.len() as f64))
    }

    /// Area of a face: the outer boundary minus its holes.
    pub fn face_area(&self, f: FaceKey) -> Option<f64> {
        let face = self.faces.get(f)?;
        let mut lists = face.lists.iter();
        let outer = lists.next()?;

        let mut total = newell_normal(&self.list_points(outer.l)).norm() / 2.0;
        for hole in lists {
            total -= newell_normal(&self.list_points(hole.l)).norm() / 2.0;
        }
        Some(total.max(0.0))
    }

    /// Refreshes a face's cached centroid and normal.
    ///
    /// Degenerate faces keep their previous normal.
    pub fn recalc_face(&mut self, f: FaceKey) {
        let cent = self.face_centroid(f);
        let no = self.face_normal(f);
        if let Some(face) = self.faces.get_mut(f) {
            if let Some(cent) = cent {
                face.cent = cent;
            }
            if let Some(no) = no {
                face.no = no;
            }
        }
    }

    /// Refreshes every face cache, then sets each vertex normal to the
    /// normalized sum of its faces' normals. Vertices without faces keep
    /// their normal.
    pub fn recalc_normals(&mut self) {
        let faces: Vec<FaceKey> = self.faces.keys().collect();
        for f in faces {
            self.recalc_face(f);
        }

        let verts: Vec<VertexKey> = self.verts.keys().collect();
        for v in verts {
            let sum = self
                .vert_faces(v)
                .into_iter()
                .filter_map(|f| self.faces.get(f))
                .fold(Vector3::zeros(), |acc, face| acc + face.no);
            if let Some(no) = sum.try_normalize(1e-12) {
                self.verts[v].no = no;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn face_from(mesh: &mut Mesh, pts: &[[f64; 3]]) -> (Vec<VertexKey>, FaceKey) {
        let v: Vec<_> = pts
            .iter()
            .map(|p| mesh.make_vertex(Point3::new(p[0], p[1], p[2])))
            .collect();
        let f = mesh.make_face(&v).unwrap();
        (v, f)
    }

    #[test]
    fn face_normal_xz_plane() {
        let mut mesh = Mesh::new();
        let (_, f) = face_from(
            &mut mesh,
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
        );
        let n = mesh.face_normal(f).unwrap();
        assert_relative_eq!(n.x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(n.y.abs(), 1.0, epsilon = 1e-10);
        assert_relative_eq!(n.z, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn face_area_unit_square() {
        let mut mesh = Mesh::new();
        let (_, f) = face_from(
            &mut mesh,
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
        );
        assert_relative_eq!(mesh.face_area(f).unwrap(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn face_area_with_hole() {
        let mut mesh = Mesh::new();
        let (_, f) = face_from(
            &mut mesh,
            &[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [10.0, 10.0, 0.0], [0.0, 10.0, 0.0]],
        );
        let hole: Vec<_> = [[2.0, 2.0], [2.0, 4.0], [4.0, 4.0], [4.0, 2.0]]
            .iter()
            .map(|p| mesh.make_vertex(Point3::new(p[0], p[1], 0.0)))
            .collect();
        mesh.make_hole(f, &hole).unwrap();

        assert_relative_eq!(mesh.face_area(f).unwrap(), 96.0, epsilon = 1e-10);
    }

    #[test]
    fn degenerate_face_keeps_normal() {
        let mut mesh = Mesh::new();
        let (_, f) = face_from(&mut mesh, &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        assert!(mesh.face_normal(f).is_none());
        assert_eq!(mesh.faces[f].no, Vector3::z());
    }

    #[test]
    fn vertex_normals_average_faces() {
        let mut mesh = Mesh::new();
        let a = mesh.make_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.make_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.make_vertex(Point3::new(0.0, 1.0, 0.0));
        let d = mesh.make_vertex(Point3::new(0.0, 0.0, 1.0));
        mesh.make_tri(a, b, c).unwrap();
        mesh.make_tri(a, d, b).unwrap();
        mesh.recalc_normals();

        let n = mesh.verts[a].no;
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(n.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(n.y, std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(n.z, std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-12);
    }
}
