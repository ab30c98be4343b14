//! One-call entry points over the builder types.
//!
//! Prefer the builders (`TinBuilder`, `RubberSheetBuilder`) when a value is
//! reused; these helpers cover the common "quad + ties in, points out" case.

pub use crate::geom2::{Affine2, GeomCfg, TiePoint};
pub use crate::tin::{map_triangulate, triangulate, Quad, Tin, TinError, TriangleMap};
pub use crate::warp::{CornerMapping, RubberSheet, RubberSheetBuilder, TransformError};

use nalgebra::Vector2;

/// Build a rubber sheet over `corners` with fixed corners and warp `points` in one go.
pub fn warp_points(
    corners: [Vector2<f64>; 4],
    ties: &[TiePoint],
    points: &[Vector2<f64>],
    cfg: GeomCfg,
) -> Result<Vec<Vector2<f64>>, TransformError> {
    let quad = Quad::new(corners, cfg)?;
    RubberSheetBuilder::new(quad).build(ties)?.transform(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn unit_corners() -> [Vector2<f64>; 4] {
        [
            vector![0.0, 0.0],
            vector![1.0, 0.0],
            vector![1.0, 1.0],
            vector![0.0, 1.0],
        ]
    }

    #[test]
    fn identity_ties_leave_points_unchanged() {
        let mut rng = StdRng::seed_from_u64(42);
        let ties: Vec<TiePoint> = (0..8)
            .map(|_| TiePoint::fixed(vector![rng.gen_range(0.1..0.9), rng.gen_range(0.1..0.9)]))
            .collect();
        let pts: Vec<Vector2<f64>> = (0..50)
            .map(|_| vector![rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)])
            .collect();
        let out = warp_points(unit_corners(), &ties, &pts, GeomCfg::default()).unwrap();
        for (p, q) in pts.iter().zip(out.iter()) {
            assert!((p - q).norm() < 1e-12);
        }
    }

    #[test]
    fn non_convex_domain_is_a_build_error() {
        let mut corners = unit_corners();
        corners.swap(1, 2);
        let err = warp_points(corners, &[], &[], GeomCfg::default()).unwrap_err();
        assert!(matches!(err, TransformError::Build(TinError::Degenerate(_))));
    }
}
