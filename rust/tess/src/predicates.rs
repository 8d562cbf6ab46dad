// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floating-point geometric predicates in the plane.
//!
//! These are plain double-precision evaluations. `incircle` treats results
//! within a relative error bound as zero so that near-cocircular points do
//! not flip triangles back and forth.

use nalgebra::Point2;

/// Twice the signed area of `abc`; positive when counter-clockwise.
#[inline]
pub fn orient2d(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Positive when `d` lies strictly inside the circumcircle of the
/// counter-clockwise triangle `abc`, negative outside, zero when too close
/// to call.
pub fn incircle(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>, d: &Point2<f64>) -> f64 {
    let (adx, ady) = (a.x - d.x, a.y - d.y);
    let (bdx, bdy) = (b.x - d.x, b.y - d.y);
    let (cdx, cdy) = (c.x - d.x, c.y - d.y);

    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;

    let det = alift * (bdx * cdy - cdx * bdy)
        + blift * (cdx * ady - adx * cdy)
        + clift * (adx * bdy - bdx * ady);

    let permanent = alift * ((bdx * cdy).abs() + (cdx * bdy).abs())
        + blift * ((cdx * ady).abs() + (adx * cdy).abs())
        + clift * ((adx * bdy).abs() + (bdx * ady).abs());

    if det.abs() <= 1e-12 * permanent {
        0.0
    } else {
        det
    }
}

/// True when the open segments `ab` and `cd` cross at a single interior
/// point. Touching at an endpoint or overlapping collinearly is not a
/// crossing.
pub fn segments_cross(
    a: &Point2<f64>,
    b: &Point2<f64>,
    c: &Point2<f64>,
    d: &Point2<f64>,
) -> bool {
    let o1 = orient2d(a, b, c);
    let o2 = orient2d(a, b, d);
    let o3 = orient2d(c, d, a);
    let o4 = orient2d(c, d, b);
    o1 * o2 < 0.0 && o3 * o4 < 0.0
}

/// If `p` lies within `tol` of the open segment `ab`, returns its parameter
/// along `ab` (strictly between 0 and 1).
pub fn on_segment(a: &Point2<f64>, b: &Point2<f64>, p: &Point2<f64>, tol: f64) -> Option<f64> {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 <= 0.0 {
        return None;
    }
    let t = (p - a).dot(&ab) / len2;
    let dist = orient2d(a, b, p).abs() / len2.sqrt();
    let margin = tol / len2.sqrt();
    (dist <= tol && t > margin && t < 1.0 - margin).then_some(t)
}

/// Signed area of a closed polygon; positive when counter-clockwise.
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let p = &points[i];
        let q = &points[(i + 1) % n];
        sum += p.x * q.y - q.x * p.y;
    }
    sum / 2.0
}

/// Check if a polygon is convex (all turns have the same sign).
pub fn is_convex(points: &[Point2<f64>]) -> bool {
    if points.len() < 3 {
        return false;
    }

    let n = points.len();
    let mut sign = 0i8;

    for i in 0..n {
        let cross = orient2d(&points[i], &points[(i + 1) % n], &points[(i + 2) % n]);
        if cross.abs() > 1e-10 {
            let current = if cross > 0.0 { 1i8 } else { -1i8 };
            if sign == 0 {
                sign = current;
            } else if sign != current {
                return false;
            }
        }
    }

    // A star polygon turns the same way everywhere but winds more than once.
    sign != 0
        && signed_area(points).signum() as i8 == sign
        && total_turn(points).abs() < 3.0 * std::f64::consts::PI
}

fn total_turn(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = points[(i + 1) % n] - points[i];
            let b = points[(i + 2) % n] - points[(i + 1) % n];
            (a.x * b.y - a.y * b.x).atan2(a.dot(&b))
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    #[test]
    fn orientation_sign() {
        assert!(orient2d(&p(0.0, 0.0), &p(1.0, 0.0), &p(0.0, 1.0)) > 0.0);
        assert!(orient2d(&p(0.0, 0.0), &p(0.0, 1.0), &p(1.0, 0.0)) < 0.0);
        assert_eq!(orient2d(&p(0.0, 0.0), &p(1.0, 1.0), &p(2.0, 2.0)), 0.0);
    }

    #[test]
    fn incircle_sign() {
        let (a, b, c) = (p(0.0, 0.0), p(2.0, 0.0), p(0.0, 2.0));
        assert!(incircle(&a, &b, &c, &p(1.0, 1.0)) > 0.0);
        assert!(incircle(&a, &b, &c, &p(3.0, 3.0)) < 0.0);
        // Cocircular point on the circle.
        assert_eq!(incircle(&a, &b, &c, &p(2.0, 2.0)), 0.0);
    }

    #[test]
    fn crossing_excludes_shared_endpoints() {
        assert!(segments_cross(&p(0.0, 0.0), &p(2.0, 2.0), &p(0.0, 2.0), &p(2.0, 0.0)));
        assert!(!segments_cross(&p(0.0, 0.0), &p(2.0, 2.0), &p(2.0, 2.0), &p(3.0, 0.0)));
        assert!(!segments_cross(&p(0.0, 0.0), &p(1.0, 0.0), &p(2.0, 0.0), &p(3.0, 0.0)));
    }

    #[test]
    fn point_on_segment() {
        let t = on_segment(&p(0.0, 0.0), &p(4.0, 0.0), &p(1.0, 1e-9), 1e-6).unwrap();
        assert!((t - 0.25).abs() < 1e-12);
        assert!(on_segment(&p(0.0, 0.0), &p(4.0, 0.0), &p(4.0, 0.0), 1e-6).is_none());
        assert!(on_segment(&p(0.0, 0.0), &p(4.0, 0.0), &p(2.0, 1.0), 1e-6).is_none());
    }

    #[test]
    fn convexity() {
        let square = [p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)];
        let dart = [p(0.0, 0.0), p(2.0, 1.0), p(4.0, 0.0), p(2.0, 3.0)];
        assert!(is_convex(&square));
        assert!(!is_convex(&dart));

        let mut cw = square;
        cw.reverse();
        assert!(is_convex(&cw));
        assert!(signed_area(&cw) < 0.0);
    }
}
