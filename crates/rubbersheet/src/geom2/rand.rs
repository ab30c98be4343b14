//! Reproducible random tie points inside a convex quadrilateral.
//!
//! Model
//! - Split the quad along p0–p2, pick one half with probability proportional
//!   to its area, then draw a uniform point in it (folded barycentric sampling).
//! - The target is the source displaced by a uniform offset in `[-jitter, jitter]²`.
//! - Determinism uses a replay token `(seed, index)` mixed into a single RNG.
//!
//! Code cross-refs: `TiePoint`, `tin::Quad`

use super::util::orient2d;
use super::TiePoint;
use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Sampler configuration.
#[derive(Clone, Copy, Debug)]
pub struct TieCfg {
    /// Number of tie points to draw.
    pub count: usize,
    /// Maximal absolute displacement per axis between source and target.
    pub jitter: f64,
    /// Keep sources at least this fraction of the quad size away from its
    /// boundary, measured in barycentric units. Clamped to [0, 0.3].
    pub margin: f64,
}

impl Default for TieCfg {
    fn default() -> Self {
        Self {
            count: 16,
            jitter: 0.0,
            margin: 0.01,
        }
    }
}

/// Replay token to make draws reproducible and indexable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayToken {
    pub seed: u64,
    pub index: u64,
}

impl ReplayToken {
    #[inline]
    fn to_std_rng(self) -> StdRng {
        // SplitMix64-style mixing, cheap and stable.
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        let k = mix(self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15)));
        StdRng::seed_from_u64(k)
    }
}

/// Draw `cfg.count` tie points inside the convex quad `corners`.
///
/// Notes
/// - The quad is assumed convex and given in boundary order; validate it with
///   `tin::Quad::new` first if it comes from user input.
/// - Targets always exist (`jitter = 0` yields identity ties).
pub fn draw_tie_points(corners: [Vector2<f64>; 4], cfg: TieCfg, tok: ReplayToken) -> Vec<TiePoint> {
    let mut rng = tok.to_std_rng();
    let halves = [
        [corners[0], corners[1], corners[2]],
        [corners[0], corners[2], corners[3]],
    ];
    let a0 = orient2d(halves[0][0], halves[0][1], halves[0][2]).abs();
    let a1 = orient2d(halves[1][0], halves[1][1], halves[1][2]).abs();
    let total = a0 + a1;
    let margin = cfg.margin.clamp(0.0, 0.3);
    let jitter = cfg.jitter.abs();
    (0..cfg.count)
        .map(|_| {
            let pick = if total > 0.0 && rng.gen::<f64>() * total >= a0 {
                1
            } else {
                0
            };
            let [a, b, c] = halves[pick];
            let mut u: f64 = rng.gen();
            let mut v: f64 = rng.gen();
            if u + v > 1.0 {
                u = 1.0 - u;
                v = 1.0 - v;
            }
            // Shrink toward the centroid to respect the margin.
            let w = 1.0 - u - v;
            let s = 1.0 - 3.0 * margin;
            let (u, v, w) = (
                margin + s * u,
                margin + s * v,
                margin + s * w,
            );
            let source = a * w + b * u + c * v;
            let offset = if jitter > 0.0 {
                Vector2::new(
                    rng.gen_range(-jitter..=jitter),
                    rng.gen_range(-jitter..=jitter),
                )
            } else {
                Vector2::zeros()
            };
            TiePoint::new(source, source + offset)
        })
        .collect()
}
