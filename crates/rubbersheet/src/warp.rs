//! Piecewise-affine (rubber-sheet) transform over a triangle map.
//!
//! A query point is classified into the first source triangle that contains it
//! (boundary inclusive) and mapped by that triangle's affine map. Neighbouring
//! maps agree on shared edges because they share destination vertices, so the
//! warp is C0 across edges and linear inside each triangle. It is never
//! replaced by a global fit.
//!
//! Batch policy: `transform` fails the whole batch and lists every input index
//! that fell outside the domain; `transform_each` reports per point.

use std::fmt;

use nalgebra::{Matrix2, Vector2};

use crate::geom2::{Affine2, GeomCfg, TiePoint};
use crate::tin::{map_triangulate, MappedTriangle, Quad, TinError, Triangle, TriangleMap, Vertex};

/// How the four quad corners are carried into the target space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum CornerMapping {
    /// Corners map onto themselves.
    #[default]
    Fixed,
    /// Corner `k` maps onto the given position.
    Explicit([Vector2<f64>; 4]),
    /// Corners follow the least-squares affine fit of all tie points.
    FittedAffine,
}

/// Errors of building or applying a rubber sheet.
#[derive(Clone, Debug, PartialEq)]
pub enum TransformError {
    /// The listed input indices lie outside the triangulated domain.
    OutsideDomain { indices: Vec<usize> },
    /// Destination triangle `triangle` is folded or collapsed; no inverse exists.
    NotInvertible { triangle: usize },
    /// `FittedAffine` corners need at least three non-collinear tie points.
    Underdetermined { ties: usize },
    Build(TinError),
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::OutsideDomain { indices } => write!(
                f,
                "{} point(s) outside the triangulated domain (indices {:?})",
                indices.len(),
                indices
            ),
            TransformError::NotInvertible { triangle } => write!(
                f,
                "destination triangle {triangle} is folded or collapsed; the warp is not invertible"
            ),
            TransformError::Underdetermined { ties } => write!(
                f,
                "affine corner fit needs >= 3 non-collinear tie points, got {ties}"
            ),
            TransformError::Build(err) => write!(f, "triangulation failed: {err}"),
        }
    }
}

impl std::error::Error for TransformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransformError::Build(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TinError> for TransformError {
    fn from(err: TinError) -> Self {
        TransformError::Build(err)
    }
}

/// Read-only piecewise-affine transform; safe to share across threads.
#[derive(Clone, Debug)]
pub struct RubberSheet {
    map: TriangleMap,
}

impl RubberSheet {
    pub fn new(map: TriangleMap) -> Self {
        Self { map }
    }

    pub fn map(&self) -> &TriangleMap {
        &self.map
    }
    pub fn len(&self) -> usize {
        self.map.len()
    }
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
    /// Source/destination triangle pairs with their affine maps.
    pub fn triangles(&self) -> &[MappedTriangle] {
        self.map.entries()
    }

    /// Map one point; None outside the domain.
    pub fn transform_point(&self, p: Vector2<f64>) -> Option<Vector2<f64>> {
        self.map.find(p).map(|row| row.affine.apply(p))
    }

    /// Map a batch, 1:1 and in order. Fails as a whole if any point is outside.
    pub fn transform(&self, points: &[Vector2<f64>]) -> Result<Vec<Vector2<f64>>, TransformError> {
        let mut out = Vec::with_capacity(points.len());
        let mut outside = Vec::new();
        for (k, p) in points.iter().enumerate() {
            match self.transform_point(*p) {
                Some(q) => out.push(q),
                None => outside.push(k),
            }
        }
        if outside.is_empty() {
            Ok(out)
        } else {
            tracing::debug!(outside = outside.len(), total = points.len(), "batch rejected");
            Err(TransformError::OutsideDomain { indices: outside })
        }
    }

    /// Map a batch, reporting failures per point.
    pub fn transform_each(&self, points: &[Vector2<f64>]) -> Vec<Result<Vector2<f64>, TransformError>> {
        points
            .iter()
            .enumerate()
            .map(|(k, p)| {
                self.transform_point(*p)
                    .ok_or(TransformError::OutsideDomain { indices: vec![k] })
            })
            .collect()
    }

    /// Linear part of the local affine map at `p` (constant inside each triangle).
    pub fn jacobian_at(&self, p: Vector2<f64>) -> Option<Matrix2<f64>> {
        self.map.find(p).map(|row| row.affine.m)
    }

    /// Reverse rubber sheet over the destination triangles.
    ///
    /// Requires every destination triangle to keep the source orientation
    /// with non-zero area; a folded sheet has no inverse.
    pub fn inverse(&self) -> Result<RubberSheet, TransformError> {
        let cfg = self.map.cfg();
        let mut rows = Vec::with_capacity(self.map.len());
        for (k, row) in self.map.iter().enumerate() {
            rows.push(invert_row(row, cfg).ok_or(TransformError::NotInvertible { triangle: k })?);
        }
        Ok(RubberSheet::new(TriangleMap::from_entries(rows, cfg)))
    }
}

fn invert_row(row: &MappedTriangle, cfg: GeomCfg) -> Option<MappedTriangle> {
    let scale = row.source.area().abs().max(f64::MIN_POSITIVE);
    if row.target_orientation() <= 2.0 * cfg.eps_det * scale {
        return None;
    }
    let ids = row.source.ids();
    let source = Triangle::new(
        Vertex::new(ids[0], row.target[0]),
        Vertex::new(ids[1], row.target[1]),
        Vertex::new(ids[2], row.target[2]),
        cfg,
    )
    .ok()?;
    // Positive orientation keeps slot order, so the old sources line up slot by slot.
    let target = row.source.positions();
    let affine = row.affine.inverse()?;
    Some(MappedTriangle {
        source,
        target,
        affine,
    })
}

/// Builds a rubber sheet from tie points inside a quad.
#[derive(Clone, Debug)]
pub struct RubberSheetBuilder {
    quad: Quad,
    corners: CornerMapping,
}

impl RubberSheetBuilder {
    pub fn new(quad: Quad) -> Self {
        Self {
            quad,
            corners: CornerMapping::Fixed,
        }
    }

    pub fn corners(mut self, corners: CornerMapping) -> Self {
        self.corners = corners;
        self
    }

    /// Corner targets implied by the configured `CornerMapping`.
    pub fn corner_targets(&self, ties: &[TiePoint]) -> Result<[Vector2<f64>; 4], TransformError> {
        let corners = self.quad.corners();
        match self.corners {
            CornerMapping::Fixed => Ok(corners),
            CornerMapping::Explicit(targets) => Ok(targets),
            CornerMapping::FittedAffine => {
                let pairs: Vec<(Vector2<f64>, Vector2<f64>)> = ties
                    .iter()
                    .filter_map(|t| t.target.map(|d| (t.source, d)))
                    .collect();
                let fit = Affine2::fit_least_squares(&pairs, self.quad.cfg())
                    .ok_or(TransformError::Underdetermined { ties: pairs.len() })?;
                Ok(corners.map(|c| fit.apply(c)))
            }
        }
    }

    pub fn build(&self, ties: &[TiePoint]) -> Result<RubberSheet, TransformError> {
        let targets = self.corner_targets(ties)?;
        let map = map_triangulate(&self.quad, targets, ties)?;
        tracing::debug!(ties = ties.len(), triangles = map.len(), corners = ?self.corners, "rubber sheet built");
        Ok(RubberSheet::new(map))
    }
}
