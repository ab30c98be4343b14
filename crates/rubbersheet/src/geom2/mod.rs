//! 2D primitives: positions, tie points, affine maps, and orientation predicates.
//!
//! Purpose
//! - Keep the numeric building blocks of the TIN and the rubber sheet small and
//!   explicit (eps-aware, scale-relative tolerances).
//! - Tolerances travel in a `GeomCfg` value passed to every constructor; there
//!   is no process-wide default state.
//!
//! Code cross-refs: `Affine2`, `TiePoint`, `GeomCfg`, `orient2d`

pub mod rand;
mod types;
mod util;

pub use types::{Affine2, GeomCfg, TiePoint};
pub use util::{is_convex_polygon, orient2d, polygon_area};
pub(crate) use util::longest_edge_sq;
