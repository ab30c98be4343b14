//! Basic 2D types and tolerances shared by the TIN and the rubber sheet.
//!
//! - `GeomCfg`: centralizes epsilons for collinearity, inclusion, and circle tests.
//! - `TiePoint`: source position with an optional target (mapped) position.
//! - `Affine2`: 2D affine map, exact three-point construction and least-squares fit.
//!
//! Code cross-refs: `util::orient2d`, `tin::Triangle`, `warp::RubberSheet`

use nalgebra::{DMatrix, DVector, Matrix2, Vector2};

use super::util::orient2d;

/// Geometry configuration (tolerances).
///
/// All epsilons are relative to the local length scale, so the same defaults
/// work for pixel grids and projected metre coordinates alike.
#[derive(Clone, Copy, Debug)]
pub struct GeomCfg {
    /// Relative area below which three points count as collinear.
    pub eps_det: f64,
    /// Relative slack of inclusive point-in-triangle / on-edge classification.
    pub eps_feas: f64,
    /// Relative slack of the open circumcircle test.
    pub eps_circle: f64,
}

impl Default for GeomCfg {
    fn default() -> Self {
        Self {
            eps_det: 1e-12,
            eps_feas: 1e-9,
            eps_circle: 1e-9,
        }
    }
}

/// A control point: a source position, optionally annotated with the target
/// position it should be carried to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TiePoint {
    pub source: Vector2<f64>,
    pub target: Option<Vector2<f64>>,
}

impl TiePoint {
    /// Tie point with a known correspondence.
    #[inline]
    pub fn new(source: Vector2<f64>, target: Vector2<f64>) -> Self {
        Self {
            source,
            target: Some(target),
        }
    }
    /// Plain position without a target (Delaunay-only input).
    #[inline]
    pub fn unmapped(source: Vector2<f64>) -> Self {
        Self {
            source,
            target: None,
        }
    }
    /// Identity correspondence: the point maps onto itself.
    #[inline]
    pub fn fixed(source: Vector2<f64>) -> Self {
        Self::new(source, source)
    }
}

impl From<Vector2<f64>> for TiePoint {
    fn from(source: Vector2<f64>) -> Self {
        Self::unmapped(source)
    }
}

/// 2D affine map: `x ↦ M x + t`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2 {
    pub m: Matrix2<f64>,
    pub t: Vector2<f64>,
}

impl Affine2 {
    #[inline]
    pub fn identity() -> Self {
        Self {
            m: Matrix2::identity(),
            t: Vector2::zeros(),
        }
    }
    #[inline]
    pub fn apply(&self, p: Vector2<f64>) -> Vector2<f64> {
        self.m * p + self.t
    }
    /// `self ∘ inner`: apply `inner` first.
    #[inline]
    pub fn compose(&self, inner: &Affine2) -> Affine2 {
        Affine2 {
            m: self.m * inner.m,
            t: self.m * inner.t + self.t,
        }
    }
    #[inline]
    pub fn inverse(&self) -> Option<Self> {
        self.m.try_inverse().map(|minv| Self {
            m: minv,
            t: -minv * self.t,
        })
    }
    #[inline]
    pub fn is_orientation_preserving(&self) -> bool {
        self.m.determinant() > 0.0
    }

    /// The unique affine map carrying `src[i]` onto `dst[i]` for i in {0,1,2}.
    ///
    /// With edge matrices `S = [s1-s0, s2-s0]` and `D = [d1-d0, d2-d0]` the
    /// linear part is `D S⁻¹` and the translation is `d0 - M s0`.
    /// Returns None if the source points are collinear.
    pub fn from_triangles(src: [Vector2<f64>; 3], dst: [Vector2<f64>; 3]) -> Option<Self> {
        let s = Matrix2::from_columns(&[src[1] - src[0], src[2] - src[0]]);
        let d = Matrix2::from_columns(&[dst[1] - dst[0], dst[2] - dst[0]]);
        let sinv = s.try_inverse()?;
        let m = d * sinv;
        if !m.iter().all(|v| v.is_finite()) {
            return None;
        }
        Some(Self {
            m,
            t: dst[0] - m * src[0],
        })
    }

    /// Least-squares affine fit over `(source, target)` pairs.
    ///
    /// Solves the 2n×6 system with an SVD. Needs at least three pairs whose
    /// sources are not collinear; returns None otherwise.
    pub fn fit_least_squares(pairs: &[(Vector2<f64>, Vector2<f64>)], cfg: GeomCfg) -> Option<Self> {
        if pairs.len() < 3 || !spans_plane(pairs.iter().map(|(s, _)| *s), cfg) {
            return None;
        }
        let n = pairs.len();
        let mut a = DMatrix::<f64>::zeros(2 * n, 6);
        let mut b = DVector::<f64>::zeros(2 * n);
        for (k, (s, d)) in pairs.iter().enumerate() {
            let r = 2 * k;
            a[(r, 0)] = s.x;
            a[(r, 1)] = s.y;
            a[(r, 2)] = 1.0;
            a[(r + 1, 3)] = s.x;
            a[(r + 1, 4)] = s.y;
            a[(r + 1, 5)] = 1.0;
            b[r] = d.x;
            b[r + 1] = d.y;
        }
        let svd = a.svd(true, true);
        let x = svd.solve(&b, cfg.eps_det).ok()?;
        Some(Self {
            m: Matrix2::new(x[0], x[1], x[3], x[4]),
            t: Vector2::new(x[2], x[5]),
        })
    }
}

/// True when some triple of `points` is not collinear.
fn spans_plane(points: impl Iterator<Item = Vector2<f64>>, cfg: GeomCfg) -> bool {
    let pts: Vec<Vector2<f64>> = points.collect();
    let Some(&p0) = pts.first() else {
        return false;
    };
    let Some(&far) = pts
        .iter()
        .max_by(|a, b| {
            (**a - p0)
                .norm_squared()
                .partial_cmp(&(**b - p0).norm_squared())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    else {
        return false;
    };
    let scale = (far - p0).norm_squared();
    if scale <= 0.0 {
        return false;
    }
    pts.iter()
        .any(|p| orient2d(p0, far, *p).abs() > cfg.eps_det * scale)
}
