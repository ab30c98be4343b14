//! Delaunay triangulation and rubber-sheet (piecewise-affine) warping.
//!
//! Pipeline: a convex bounding `Quad` and tie points (source → target) go
//! through `tin::TinBuilder` (incremental Delaunay insertion with edge-flip
//! repair), `tin::TriangleMap` (exact affine map per triangle), and end in
//! `warp::RubberSheet`, which answers point queries read-only.
//!
//! Tolerances are explicit (`GeomCfg`) and travel with the `Quad`; nothing
//! depends on process-wide state.

pub mod api;
pub mod geom2;
pub mod tin;
pub mod warp;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use geom2::{Affine2, GeomCfg, TiePoint};
pub use nalgebra::{Matrix2 as Mat2, Vector2 as Vec2};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::geom2::rand::{draw_tie_points, ReplayToken, TieCfg};
    pub use crate::geom2::{Affine2, GeomCfg, TiePoint};
    pub use crate::tin::{triangulate, Quad, Tin, TinBuilder, TinError, TriangleMap};
    pub use crate::warp::{CornerMapping, RubberSheet, RubberSheetBuilder, TransformError};
    pub use nalgebra::{Matrix2 as Mat2, Vector2 as Vec2};
}

