// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unconstrained Delaunay triangulation (Bowyer-Watson).
//!
//! Points are inserted one at a time into a triangulation seeded with a
//! large super triangle. Each insertion removes the connected set of
//! triangles whose circumcircle contains the new point and fans the
//! resulting cavity from it.
//!
//! [`Triangulation`] keeps the super triangle's three vertices (stored after
//! the real points) so the constrained pass can work on a triangulation that
//! covers everything; [`triangulate`] is the plain point-set primitive and
//! drops every triangle touching them.

use std::collections::VecDeque;

use nalgebra::Point2;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::predicates::{incircle, orient2d};

/// Triangulates a point set. Returns counter-clockwise index triples into
/// `points`.
///
/// Coincident points are inserted once; the later copies are left out of
/// every triangle.
pub fn triangulate(points: &[Point2<f64>]) -> Vec<[usize; 3]> {
    let tri = Triangulation::new(points, 0.0);
    tri.triangles()
        .filter(|(_, t)| t.iter().all(|&i| !tri.is_super(i)))
        .map(|(_, t)| t)
        .collect()
}

/// Triangle soup with directed-edge adjacency.
#[derive(Debug, Clone)]
pub(crate) struct Triangulation {
    /// Real points followed by the three super vertices.
    pub pts: Vec<Point2<f64>>,
    pub n_real: usize,
    tris: Vec<Option<[usize; 3]>>,
    free: Vec<usize>,
    /// Directed edge → the triangle that has it. Triangles are CCW, so each
    /// directed edge belongs to at most one.
    edges: FxHashMap<(usize, usize), usize>,
}

impl Triangulation {
    /// Builds the Delaunay triangulation of `points` inside a super triangle.
    /// Points within `tol` of an existing vertex are skipped.
    pub fn new(points: &[Point2<f64>], tol: f64) -> Self {
        let n_real = points.len();
        let mut pts = points.to_vec();

        let (mut min, mut max) = (Point2::new(0.0, 0.0), Point2::new(0.0, 0.0));
        if let Some(first) = points.first() {
            min = *first;
            max = *first;
        }
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        let d = (max.x - min.x).max(max.y - min.y).max(1.0);
        let c = Point2::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0);
        pts.push(Point2::new(c.x - 20.0 * d, c.y - d));
        pts.push(Point2::new(c.x + 20.0 * d, c.y - d));
        pts.push(Point2::new(c.x, c.y + 20.0 * d));

        let mut tri = Self {
            pts,
            n_real,
            tris: Vec::new(),
            free: Vec::new(),
            edges: FxHashMap::default(),
        };
        tri.add_tri([n_real, n_real + 1, n_real + 2]);

        for i in 0..n_real {
            tri.insert(i, tol);
        }
        tri
    }

    pub fn is_super(&self, i: usize) -> bool {
        i >= self.n_real
    }

    /// Live triangles with their slot index.
    pub fn triangles(&self) -> impl Iterator<Item = (usize, [usize; 3])> + '_ {
        self.tris
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.map(|t| (i, t)))
    }

    pub fn tri(&self, t: usize) -> Option<[usize; 3]> {
        self.tris.get(t).copied().flatten()
    }

    /// True if `a`-`b` is an edge in either direction.
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.edges.contains_key(&(a, b)) || self.edges.contains_key(&(b, a))
    }

    /// The triangle on the other side of directed edge `a` → `b`.
    pub fn neighbor(&self, a: usize, b: usize) -> Option<usize> {
        self.edges.get(&(b, a)).copied()
    }

    /// Adds a triangle. Refuses (and returns `None`) if one of its directed
    /// edges is already taken, which would mean overlapping triangles.
    pub fn add_tri(&mut self, t: [usize; 3]) -> Option<usize> {
        let directed = [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])];
        if directed.iter().any(|e| self.edges.contains_key(e)) {
            tracing::debug!(?t, "refusing overlapping triangle");
            return None;
        }

        let slot = match self.free.pop() {
            Some(slot) => {
                self.tris[slot] = Some(t);
                slot
            }
            None => {
                self.tris.push(Some(t));
                self.tris.len() - 1
            }
        };
        for e in directed {
            self.edges.insert(e, slot);
        }
        Some(slot)
    }

    pub fn remove_tri(&mut self, slot: usize) -> Option<[usize; 3]> {
        let t = self.tris.get_mut(slot)?.take()?;
        for e in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
            if self.edges.get(&e) == Some(&slot) {
                self.edges.remove(&e);
            }
        }
        self.free.push(slot);
        Some(t)
    }

    /// A triangle containing `p` (boundary included), if any.
    fn locate(&self, p: &Point2<f64>) -> Option<usize> {
        self.triangles()
            .find(|(_, t)| {
                let [a, b, c] = t.map(|i| &self.pts[i]);
                orient2d(a, b, p) >= 0.0 && orient2d(b, c, p) >= 0.0 && orient2d(c, a, p) >= 0.0
            })
            .map(|(slot, _)| slot)
    }

    fn insert(&mut self, pi: usize, tol: f64) {
        let p = self.pts[pi];
        let Some(seed) = self.locate(&p) else {
            tracing::debug!(point = pi, "point outside triangulation, skipped");
            return;
        };
        let Some(seed_tri) = self.tri(seed) else {
            return;
        };
        let tol2 = tol * tol;
        if seed_tri
            .iter()
            .any(|&i| (self.pts[i] - p).norm_squared() <= tol2)
        {
            tracing::debug!(point = pi, "coincident point skipped");
            return;
        }

        // Grow the cavity from the containing triangle through neighbors
        // whose circumcircle holds p. A neighbor across an edge p sits on
        // has to go too, or the fan would contain a flat triangle.
        let mut bad = FxHashSet::default();
        let mut queue = VecDeque::from([seed]);
        bad.insert(seed);
        while let Some(t) = queue.pop_front() {
            let Some(tv) = self.tri(t) else {
                continue;
            };
            for k in 0..3 {
                let (a, b) = (tv[k], tv[(k + 1) % 3]);
                let Some(n) = self.neighbor(a, b) else {
                    continue;
                };
                if bad.contains(&n) {
                    continue;
                }
                let Some([x, y, z]) = self.tri(n) else {
                    continue;
                };
                let (pa, pb) = (self.pts[a], self.pts[b]);
                let on_edge =
                    orient2d(&pa, &pb, &p) <= 0.0 && (pa - p).dot(&(pb - p)) < 0.0;
                let inside =
                    incircle(&self.pts[x], &self.pts[y], &self.pts[z], &p) > 0.0;
                if on_edge || inside {
                    bad.insert(n);
                    queue.push_back(n);
                }
            }
        }

        let mut boundary = Vec::new();
        for &t in &bad {
            let Some(tv) = self.tri(t) else {
                continue;
            };
            for k in 0..3 {
                let (a, b) = (tv[k], tv[(k + 1) % 3]);
                match self.neighbor(a, b) {
                    Some(n) if bad.contains(&n) => {}
                    _ => boundary.push((a, b)),
                }
            }
        }

        for &t in &bad {
            self.remove_tri(t);
        }
        for (a, b) in boundary {
            if orient2d(&self.pts[a], &self.pts[b], &p) > 0.0 {
                self.add_tri([a, b, pi]);
            } else {
                tracing::debug!(point = pi, a, b, "dropping flat cavity triangle");
            }
        }
    }
}
