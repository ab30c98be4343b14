//! Delaunay TIN inside a convex quadrilateral and its source→target triangle map.
//!
//! Purpose
//! - Build a Delaunay triangulation of control points by incremental insertion
//!   (seed quad split along p0–p2, point location, local re-split, edge-flip repair).
//! - Derive, per triangle, the exact affine map carrying source vertices onto
//!   their target positions; `warp::RubberSheet` applies it.
//!
//! Conventions
//! - Circumcircles are open: a vertex exactly on a circle is not a violation.
//! - Points on an existing edge split both incident triangles (no zero-area triangles).
//! - A violation across a non-convex quad is skipped with a warning and counted in
//!   `TinStats::skipped_flips`; in exact arithmetic it cannot occur.
//! - Errors abort the build; no partial triangulation is ever returned.
//!
//! Code cross-refs: `geom2::{TiePoint, Affine2, GeomCfg}`, `warp::RubberSheet`

mod build;
mod map;
mod types;

pub use build::{triangulate, Tin, TinBuilder, TinStats, TriangleId};
pub use map::{map_triangulate, MappedTriangle, TriangleMap};
pub use types::{
    Circle, Degeneracy, Invariant, Location, Quad, TinError, Triangle, Vertex, VertexId,
};

#[cfg(test)]
mod tests;
