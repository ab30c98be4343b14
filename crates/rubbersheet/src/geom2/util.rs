use nalgebra::Vector2;

use super::types::GeomCfg;

/// Twice the signed area of triangle (a, b, c). Positive for a→b→c counterclockwise.
#[inline]
pub fn orient2d(a: Vector2<f64>, b: Vector2<f64>, c: Vector2<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    ab.x * ac.y - ab.y * ac.x
}

/// Signed shoelace area (CCW positive).
pub fn polygon_area(points: &[Vector2<f64>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut a = 0.0;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        a += p.x * q.y - q.x * p.y;
    }
    0.5 * a
}

/// Strict convexity test for a polygon given in boundary order (either orientation).
///
/// Every consecutive triple must turn the same way, with no collinear triple,
/// and the total turning must be one full revolution (rejects self-intersecting stars).
pub fn is_convex_polygon(points: &[Vector2<f64>], cfg: GeomCfg) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let scale = longest_edge_sq(points);
    if !(scale.is_finite()) || scale <= 0.0 {
        return false;
    }
    let mut sign = 0.0_f64;
    let mut turning = 0.0_f64;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let o = orient2d(a, b, c);
        if o.abs() <= cfg.eps_det * scale {
            return false;
        }
        if sign == 0.0 {
            sign = o.signum();
        } else if o.signum() != sign {
            return false;
        }
        let u = b - a;
        let v = c - b;
        turning += (u.x * v.y - u.y * v.x).atan2(u.dot(&v));
    }
    (turning.abs() - std::f64::consts::TAU).abs() < 1e-6
}

/// Largest squared distance between consecutive points (closed ring).
pub(crate) fn longest_edge_sq(points: &[Vector2<f64>]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| (points[(i + 1) % n] - points[i]).norm_squared())
        .fold(0.0, f64::max)
}
