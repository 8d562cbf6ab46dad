// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Constrained Delaunay triangulation of polygon loops.
//!
//! The first loop added is the outer boundary, any further loops are holes.
//! Generation runs in four steps:
//!
//! 1. Points are scaled into `[0, normalized_extent]` and merged within
//!    `epsilon`. Loops left with fewer than three distinct corners are
//!    dropped.
//! 2. The merged point set is Delaunay triangulated.
//! 3. Every loop edge missing from the triangulation is recovered: the
//!    triangles it crosses are removed and the two pockets on either side
//!    are re-triangulated with the edge fixed. Edges passing through another
//!    vertex are split there first.
//! 4. Triangles are classified by how many loop edges separate them from the
//!    outside. Odd depth is inside the face, even depth is outside or inside
//!    a hole.
//!
//! Recovery gives up after `max_constraint_passes`. The output then still
//! covers the face but may cut across the unrecovered edges, and
//! [`CdtOutput::converged`] is false.

use std::collections::VecDeque;

use nalgebra::Point2;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::TessConfig;
use crate::delaunay::Triangulation;
use crate::predicates::{incircle, on_segment, orient2d, segments_cross, signed_area};

/// Result of [`Cdt::generate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CdtOutput {
    /// Triangles as caller ids, wound like the outer loop.
    pub triangles: Vec<[usize; 3]>,
    /// False if some loop edge could not be recovered.
    pub converged: bool,
}

/// 2-D constrained triangulator.
///
/// ```
/// use halfmesh_tess::{Cdt, TessConfig};
/// use nalgebra::Point2;
///
/// let mut cdt = Cdt::new(TessConfig::default());
/// cdt.add_loop([
///     (Point2::new(0.0, 0.0), 0),
///     (Point2::new(2.0, 0.0), 1),
///     (Point2::new(2.0, 2.0), 2),
///     (Point2::new(1.0, 1.0), 3),
///     (Point2::new(0.0, 2.0), 4),
/// ]);
/// let out = cdt.generate();
/// assert!(out.converged);
/// assert_eq!(out.triangles.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Cdt {
    config: TessConfig,
    points: Vec<Point2<f64>>,
    ids: Vec<usize>,
    loops: Vec<Vec<usize>>,
}

impl Cdt {
    pub fn new(config: TessConfig) -> Self {
        Self {
            config,
            points: Vec::new(),
            ids: Vec::new(),
            loops: Vec::new(),
        }
    }

    /// Adds a closed loop of points, each tagged with a caller id that is
    /// reported back in the output triangles.
    pub fn add_loop<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = (Point2<f64>, usize)>,
    {
        let mut indices = Vec::new();
        for (p, id) in points {
            indices.push(self.points.len());
            self.points.push(p);
            self.ids.push(id);
        }
        self.loops.push(indices);
    }

    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    /// Triangulates the loops added so far.
    pub fn generate(&self) -> CdtOutput {
        let Some(normalized) = self.normalized() else {
            tracing::debug!(points = self.points.len(), "degenerate or non-finite loops");
            return CdtOutput {
                triangles: Vec::new(),
                converged: true,
            };
        };

        let merged = merge_points(&normalized, self.config.epsilon);
        let loops = self.clean_loops(&merged.remap);
        if loops.is_empty() {
            return CdtOutput {
                triangles: Vec::new(),
                converged: true,
            };
        }

        let mut tri = Triangulation::new(&merged.points, 0.0);
        let tol = self
            .config
            .epsilon
            .max(self.config.normalized_extent * 1e-12);
        let (constraints, converged) = self.recover_all(&mut tri, &loops, tol);
        if !converged {
            tracing::warn!(
                loops = loops.len(),
                passes = self.config.max_constraint_passes,
                "boundary recovery did not converge"
            );
        }

        let outer: Vec<Point2<f64>> = loops[0].iter().map(|&i| merged.points[i]).collect();
        let flip = signed_area(&outer) < 0.0;

        let triangles = inside_triangles(&tri, &constraints, self.config.trim_holes)
            .into_iter()
            .map(|t| {
                let [a, b, c] = t.map(|u| self.ids[merged.first[u]]);
                if flip {
                    [a, c, b]
                } else {
                    [a, b, c]
                }
            })
            .collect();

        CdtOutput {
            triangles,
            converged,
        }
    }

    /// Points scaled into the configured extent, `None` when the input has
    /// no area to speak of or contains non-finite coordinates.
    fn normalized(&self) -> Option<Vec<Point2<f64>>> {
        let first = self.points.first()?;
        let (mut min, mut max) = (*first, *first);
        for p in &self.points {
            if !(p.x.is_finite() && p.y.is_finite()) {
                return None;
            }
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }

        let span = (max.x - min.x).max(max.y - min.y);
        if span <= 0.0 {
            return None;
        }
        let scale = self.config.normalized_extent / span;
        Some(
            self.points
                .iter()
                .map(|p| Point2::from((p - min) * scale))
                .collect(),
        )
    }

    /// Loops in merged indices, without repeated consecutive corners.
    fn clean_loops(&self, remap: &[usize]) -> Vec<Vec<usize>> {
        let mut out = Vec::with_capacity(self.loops.len());
        for (i, lp) in self.loops.iter().enumerate() {
            let mut cleaned: Vec<usize> = Vec::with_capacity(lp.len());
            for &p in lp {
                let u = remap[p];
                if cleaned.last() != Some(&u) {
                    cleaned.push(u);
                }
            }
            while cleaned.len() > 1 && cleaned.first() == cleaned.last() {
                cleaned.pop();
            }

            if cleaned.len() < 3 {
                tracing::debug!(loop_index = i, corners = cleaned.len(), "dropping collapsed loop");
                continue;
            }
            out.push(cleaned);
        }
        out
    }

    /// Recovers every loop edge. Returns the constraint edges present in the
    /// final triangulation and whether all of them made it.
    fn recover_all(
        &self,
        tri: &mut Triangulation,
        loops: &[Vec<usize>],
        tol: f64,
    ) -> (FxHashSet<(usize, usize)>, bool) {
        let mut pending: Vec<(usize, usize)> = loops
            .iter()
            .flat_map(|lp| (0..lp.len()).map(move |i| (lp[i], lp[(i + 1) % lp.len()])))
            .collect();
        let mut constraints = FxHashSet::default();

        for pass in 0..self.config.max_constraint_passes {
            if pending.is_empty() {
                break;
            }
            let mut retry = Vec::new();
            while let Some((a, b)) = pending.pop() {
                match recover(tri, a, b, tol) {
                    Recovery::Done => {
                        constraints.insert(edge_key(a, b));
                    }
                    Recovery::Split(v) => {
                        pending.push((a, v));
                        pending.push((v, b));
                    }
                    Recovery::Failed => retry.push((a, b)),
                }
            }
            if !retry.is_empty() {
                tracing::trace!(pass, failed = retry.len(), "retrying constraint edges");
            }
            pending = retry;
        }

        // A later recovery can cut an earlier edge when loops cross.
        let before = constraints.len();
        constraints.retain(|&(a, b)| tri.has_edge(a, b));
        let converged = pending.is_empty() && constraints.len() == before;
        (constraints, converged)
    }
}

/// Merged point set.
struct Merged {
    points: Vec<Point2<f64>>,
    /// Input index → merged index.
    remap: Vec<usize>,
    /// Merged index → first input index merged into it.
    first: Vec<usize>,
}

fn merge_points(points: &[Point2<f64>], eps: f64) -> Merged {
    let cell = eps.max(1e-12);
    let eps2 = eps * eps;
    let cell_of = |p: &Point2<f64>| ((p.x / cell).floor() as i64, (p.y / cell).floor() as i64);

    let mut grid: FxHashMap<(i64, i64), Vec<usize>> = FxHashMap::default();
    let mut merged = Merged {
        points: Vec::new(),
        remap: Vec::with_capacity(points.len()),
        first: Vec::new(),
    };

    for (i, p) in points.iter().enumerate() {
        let (cx, cy) = cell_of(p);
        let mut found = None;
        'search: for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(bucket) = grid.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &u in bucket {
                    if (merged.points[u] - p).norm_squared() <= eps2 {
                        found = Some(u);
                        break 'search;
                    }
                }
            }
        }

        let u = match found {
            Some(u) => u,
            None => {
                let u = merged.points.len();
                merged.points.push(*p);
                merged.first.push(i);
                grid.entry((cx, cy)).or_default().push(u);
                u
            }
        };
        merged.remap.push(u);
    }

    if merged.points.len() < points.len() {
        tracing::debug!(
            merged = points.len() - merged.points.len(),
            "merged coincident points"
        );
    }
    merged
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

enum Recovery {
    Done,
    /// The edge passes through this vertex; recover both halves instead.
    Split(usize),
    Failed,
}

/// Forces edge `a`-`b` into the triangulation.
fn recover(tri: &mut Triangulation, a: usize, b: usize, tol: f64) -> Recovery {
    if a == b || tri.has_edge(a, b) {
        return Recovery::Done;
    }
    let (pa, pb) = (tri.pts[a], tri.pts[b]);

    let through = (0..tri.n_real)
        .filter(|&v| v != a && v != b)
        .filter_map(|v| on_segment(&pa, &pb, &tri.pts[v], tol).map(|t| (t, v)))
        .min_by(|x, y| x.0.total_cmp(&y.0));
    if let Some((_, v)) = through {
        return Recovery::Split(v);
    }

    let crossing: FxHashSet<usize> = tri
        .triangles()
        .filter(|(_, t)| {
            (0..3).any(|k| {
                let (p, q) = (t[k], t[(k + 1) % 3]);
                p != a
                    && p != b
                    && q != a
                    && q != b
                    && segments_cross(&pa, &pb, &tri.pts[p], &tri.pts[q])
            })
        })
        .map(|(slot, _)| slot)
        .collect();
    if crossing.is_empty() {
        return Recovery::Failed;
    }

    // Boundary of the removed region, one outgoing edge per corner.
    let mut next: FxHashMap<usize, usize> = FxHashMap::default();
    for &slot in &crossing {
        let Some(t) = tri.tri(slot) else {
            continue;
        };
        for k in 0..3 {
            let (p, q) = (t[k], t[(k + 1) % 3]);
            let inner = tri.neighbor(p, q).is_some_and(|n| crossing.contains(&n));
            if !inner && next.insert(p, q).is_some() {
                return Recovery::Failed;
            }
        }
    }

    let mut polygon = vec![a];
    let mut cur = a;
    loop {
        let Some(&n) = next.get(&cur) else {
            return Recovery::Failed;
        };
        if n == a {
            break;
        }
        if polygon.len() >= next.len() {
            return Recovery::Failed;
        }
        polygon.push(n);
        cur = n;
    }
    if polygon.len() != next.len() {
        return Recovery::Failed;
    }
    let Some(bi) = polygon.iter().position(|&v| v == b) else {
        return Recovery::Failed;
    };

    let mut fill = Vec::with_capacity(crossing.len());
    fill_pocket(&tri.pts, a, b, &polygon[1..bi], &mut fill);
    fill_pocket(&tri.pts, b, a, &polygon[bi + 1..], &mut fill);
    let flat = fill
        .iter()
        .any(|t| orient2d(&tri.pts[t[0]], &tri.pts[t[1]], &tri.pts[t[2]]) <= 0.0);
    if flat || fill.len() != crossing.len() {
        return Recovery::Failed;
    }

    let removed: Vec<[usize; 3]> = crossing.iter().filter_map(|&s| tri.remove_tri(s)).collect();
    let mut added = Vec::with_capacity(fill.len());
    for t in fill {
        match tri.add_tri(t) {
            Some(slot) => added.push(slot),
            None => {
                for slot in added {
                    tri.remove_tri(slot);
                }
                for t in removed {
                    tri.add_tri(t);
                }
                return Recovery::Failed;
            }
        }
    }
    Recovery::Done
}

/// Triangulates the counter-clockwise pocket `a, chain.., b` closed by the
/// fixed edge `b`-`a`.
///
/// The apex is the chain vertex whose circle with `a` and `b` holds no other
/// chain vertex; both sides of the apex are filled the same way.
fn fill_pocket(
    pts: &[Point2<f64>],
    a: usize,
    b: usize,
    chain: &[usize],
    out: &mut Vec<[usize; 3]>,
) {
    let Some(&first) = chain.first() else {
        return;
    };
    let (mut c, mut ci) = (first, 0);
    for (i, &v) in chain.iter().enumerate().skip(1) {
        if incircle(&pts[a], &pts[c], &pts[b], &pts[v]) > 0.0 {
            c = v;
            ci = i;
        }
    }
    fill_pocket(pts, a, c, &chain[..ci], out);
    fill_pocket(pts, c, b, &chain[ci + 1..], out);
    out.push([a, c, b]);
}

/// Triangles enclosed by an odd number of constraint edges (or any positive
/// number with `trim_holes` off).
fn inside_triangles(
    tri: &Triangulation,
    constraints: &FxHashSet<(usize, usize)>,
    trim_holes: bool,
) -> Vec<[usize; 3]> {
    let touches_super = |t: &[usize; 3]| t.iter().any(|&i| tri.is_super(i));

    // 0-1 BFS: crossing a constraint edge costs one.
    let mut depth: FxHashMap<usize, u32> = FxHashMap::default();
    let mut queue = VecDeque::new();
    for (slot, t) in tri.triangles() {
        if touches_super(&t) {
            depth.insert(slot, 0);
            queue.push_back(slot);
        }
    }
    while let Some(slot) = queue.pop_front() {
        let (Some(&d), Some(t)) = (depth.get(&slot), tri.tri(slot)) else {
            continue;
        };
        for k in 0..3 {
            let (p, q) = (t[k], t[(k + 1) % 3]);
            let Some(n) = tri.neighbor(p, q) else {
                continue;
            };
            let nd = d + u32::from(constraints.contains(&edge_key(p, q)));
            if depth.get(&n).map_or(true, |&old| nd < old) {
                depth.insert(n, nd);
                if nd == d {
                    queue.push_front(n);
                } else {
                    queue.push_back(n);
                }
            }
        }
    }

    tri.triangles()
        .filter(|(slot, t)| {
            !touches_super(t)
                && depth.get(slot).is_some_and(|&d| {
                    if trim_holes {
                        d % 2 == 1
                    } else {
                        d >= 1
                    }
                })
        })
        .map(|(_, t)| t)
        .collect()
}
