//! Geometric types of the TIN: vertices, triangles, circumcircles, and the
//! bounding quadrilateral, plus the construction error taxonomy.
//!
//! Kept small and explicit so `build` and `map` read as the algorithm only.

use std::fmt;

use nalgebra::Vector2;

use crate::geom2::{is_convex_polygon, longest_edge_sq, orient2d, polygon_area, GeomCfg};

/// Stable vertex identifier: corners are 0..4, inserted point `i` is `4 + i`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub usize);

/// A triangle corner: identity plus source position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub id: VertexId,
    pub pos: Vector2<f64>,
}

impl Vertex {
    #[inline]
    pub fn new(id: VertexId, pos: Vector2<f64>) -> Self {
        Self { id, pos }
    }
}

/// Where a point sits relative to a triangle.
///
/// Edge `k` is the edge opposite vertex `k`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    Inside,
    OnEdge(usize),
    OnVertex(usize),
    Outside,
}

/// Circumcircle, treated as an OPEN disk by `contains`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Vector2<f64>,
    pub radius: f64,
}

impl Circle {
    /// Strict interior test. Points on the circle (within `eps` of the radius,
    /// relative) are outside, so cocircular quads never flip back and forth.
    #[inline]
    pub fn contains(&self, p: Vector2<f64>, eps: f64) -> bool {
        (p - self.center).norm() < self.radius * (1.0 - eps)
    }
}

/// Non-degenerate triangle with vertices stored counter-clockwise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    v: [Vertex; 3],
}

impl Triangle {
    /// Build from three corners; collinear input is rejected.
    pub fn new(a: Vertex, b: Vertex, c: Vertex, cfg: GeomCfg) -> Result<Self, TinError> {
        let o = orient2d(a.pos, b.pos, c.pos);
        let scale = longest_edge_sq(&[a.pos, b.pos, c.pos]);
        if !(o.is_finite()) || o.abs() <= cfg.eps_det * scale {
            return Err(TinError::Degenerate(Degeneracy::CollinearTriangle {
                vertices: [a.id, b.id, c.id],
            }));
        }
        let v = if o > 0.0 { [a, b, c] } else { [a, c, b] };
        Ok(Self { v })
    }

    #[inline]
    pub fn vertices(&self) -> [Vertex; 3] {
        self.v
    }
    #[inline]
    pub fn vertex(&self, k: usize) -> Vertex {
        self.v[k % 3]
    }
    #[inline]
    pub fn ids(&self) -> [VertexId; 3] {
        [self.v[0].id, self.v[1].id, self.v[2].id]
    }
    #[inline]
    pub fn positions(&self) -> [Vector2<f64>; 3] {
        [self.v[0].pos, self.v[1].pos, self.v[2].pos]
    }
    /// Endpoints of edge `k` (opposite vertex `k`), in CCW order.
    #[inline]
    pub fn edge(&self, k: usize) -> (Vertex, Vertex) {
        (self.v[(k + 1) % 3], self.v[(k + 2) % 3])
    }

    /// Exact identity membership.
    #[inline]
    pub fn has_vertex(&self, id: VertexId) -> bool {
        self.v.iter().any(|v| v.id == id)
    }

    /// Number of vertex ids shared with `other` (0..=3).
    pub fn shared_count(&self, other: &Triangle) -> usize {
        self.v.iter().filter(|v| other.has_vertex(v.id)).count()
    }

    /// Slot of the vertex of `self` not shared with `other`, when they share an edge.
    pub fn apex_against(&self, other: &Triangle) -> Option<usize> {
        if self.shared_count(other) != 2 {
            return None;
        }
        (0..3).find(|&k| !other.has_vertex(self.v[k].id))
    }

    /// The vertex of `other` that is not a vertex of `self` (the off-edge vertex).
    pub fn opposite_vertex(&self, other: &Triangle) -> Option<Vertex> {
        other.apex_against(self).map(|k| other.v[k])
    }

    /// Edge index whose endpoints are `a` and `b` (either order).
    pub fn edge_with(&self, a: VertexId, b: VertexId) -> Option<usize> {
        (0..3).find(|&k| {
            let (p, q) = self.edge(k);
            (p.id == a && q.id == b) || (p.id == b && q.id == a)
        })
    }

    /// Classify `p` against this triangle (inclusive boundary, scale-relative slack).
    pub fn locate(&self, p: Vector2<f64>, cfg: GeomCfg) -> Location {
        let scale = longest_edge_sq(&self.positions()).sqrt();
        for k in 0..3 {
            if (p - self.v[k].pos).norm() <= cfg.eps_feas * scale {
                return Location::OnVertex(k);
            }
        }
        let mut on_edge = None;
        for k in 0..3 {
            let (a, b) = self.edge(k);
            let len = (b.pos - a.pos).norm();
            let dist = orient2d(a.pos, b.pos, p) / len;
            let tol = cfg.eps_feas * len;
            if dist < -tol {
                return Location::Outside;
            }
            if dist <= tol {
                on_edge = Some(k);
            }
        }
        match on_edge {
            Some(k) => Location::OnEdge(k),
            None => Location::Inside,
        }
    }

    /// Inclusive point-in-triangle test: edges and vertices count as contained.
    #[inline]
    pub fn contains_or_is_vertex(&self, p: Vector2<f64>, cfg: GeomCfg) -> bool {
        self.locate(p, cfg) != Location::Outside
    }

    pub fn circumcircle(&self) -> Circle {
        let a = self.v[0].pos;
        let b = self.v[1].pos - a;
        let c = self.v[2].pos - a;
        let d = 2.0 * (b.x * c.y - b.y * c.x);
        let b2 = b.norm_squared();
        let c2 = c.norm_squared();
        let u = Vector2::new((c.y * b2 - b.y * c2) / d, (b.x * c2 - c.x * b2) / d);
        Circle {
            center: a + u,
            radius: u.norm(),
        }
    }

    #[inline]
    pub fn area(&self) -> f64 {
        0.5 * orient2d(self.v[0].pos, self.v[1].pos, self.v[2].pos)
    }

    #[inline]
    pub fn centroid(&self) -> Vector2<f64> {
        (self.v[0].pos + self.v[1].pos + self.v[2].pos) / 3.0
    }

    /// The three triangles fanning from `p`, which must lie strictly inside.
    pub fn sub_triangles(&self, p: Vertex, cfg: GeomCfg) -> Result<[Triangle; 3], TinError> {
        let [a, b, c] = self.v;
        Ok([
            Triangle::new(a, b, p, cfg)?,
            Triangle::new(b, c, p, cfg)?,
            Triangle::new(c, a, p, cfg)?,
        ])
    }

    /// The two triangles formed by a point `p` on edge `k`.
    pub fn split_edge(&self, k: usize, p: Vertex, cfg: GeomCfg) -> Result<[Triangle; 2], TinError> {
        let apex = self.v[k % 3];
        let (a, b) = self.edge(k);
        Ok([
            Triangle::new(apex, a, p, cfg)?,
            Triangle::new(apex, p, b, cfg)?,
        ])
    }
}

/// Convex bounding quadrilateral (the triangulation domain).
#[derive(Clone, Debug)]
pub struct Quad {
    corners: [Vector2<f64>; 4],
    cfg: GeomCfg,
}

impl Quad {
    /// Corners in boundary order (either orientation); must be strictly convex.
    pub fn new(corners: [Vector2<f64>; 4], cfg: GeomCfg) -> Result<Self, TinError> {
        if !is_convex_polygon(&corners, cfg) {
            return Err(TinError::Degenerate(Degeneracy::NonConvexQuad));
        }
        Ok(Self { corners, cfg })
    }

    /// Axis-aligned rectangle `[min, max]`.
    pub fn from_bounds(min: Vector2<f64>, max: Vector2<f64>, cfg: GeomCfg) -> Result<Self, TinError> {
        Self::new(
            [
                min,
                Vector2::new(max.x, min.y),
                max,
                Vector2::new(min.x, max.y),
            ],
            cfg,
        )
    }

    #[inline]
    pub fn corners(&self) -> [Vector2<f64>; 4] {
        self.corners
    }
    #[inline]
    pub fn cfg(&self) -> GeomCfg {
        self.cfg
    }

    /// Unsigned area.
    pub fn area(&self) -> f64 {
        polygon_area(&self.corners).abs()
    }

    /// Seed triangles, split along the diagonal p0–p2; corner `k` gets `VertexId(k)`.
    pub fn triangles(&self) -> Result<[Triangle; 2], TinError> {
        let v: Vec<Vertex> = self
            .corners
            .iter()
            .enumerate()
            .map(|(k, p)| Vertex::new(VertexId(k), *p))
            .collect();
        Ok([
            Triangle::new(v[0], v[1], v[2], self.cfg)?,
            Triangle::new(v[0], v[2], v[3], self.cfg)?,
        ])
    }

    /// Inside or on the boundary (scale-relative slack).
    pub fn contains(&self, p: Vector2<f64>) -> bool {
        let sign = polygon_area(&self.corners).signum();
        (0..4).all(|k| {
            let a = self.corners[k];
            let b = self.corners[(k + 1) % 4];
            let len = (b - a).norm();
            sign * orient2d(a, b, p) / len >= -self.cfg.eps_feas * len
        })
    }

    pub fn contains_all<'a>(&self, points: impl IntoIterator<Item = &'a Vector2<f64>>) -> bool {
        points.into_iter().all(|p| self.contains(*p))
    }
}

/// Why a geometric input was rejected.
#[derive(Clone, Debug, PartialEq)]
pub enum Degeneracy {
    /// Three points passed as a triangle are collinear (zero area).
    CollinearTriangle { vertices: [VertexId; 3] },
    /// The domain is not a strictly convex, simple quadrilateral.
    NonConvexQuad,
    /// Input point `index` coincides with an existing vertex.
    DuplicateVertex { index: usize, existing: VertexId },
}

/// Internal conditions that must never occur; they indicate numeric trouble or a bug.
#[derive(Clone, Debug, PartialEq)]
pub enum Invariant {
    /// Two live triangles share all three vertices.
    DuplicateTriangle { vertices: [VertexId; 3] },
    /// Input point `index` is inside the domain but no triangle contains it.
    Unlocated { index: usize },
    /// The repair loop exceeded its flip budget.
    FlipBudgetExhausted { flips: usize },
}

/// Errors surfaced while building a TIN or its triangle map.
#[derive(Clone, Debug, PartialEq)]
pub enum TinError {
    /// Input point `index` lies outside the bounding quadrilateral.
    OutsideDomain { index: usize, point: Vector2<f64> },
    Degenerate(Degeneracy),
    Invariant(Invariant),
    /// A vertex used by the triangle map carries no target position.
    MissingTarget { vertex: VertexId },
}

impl fmt::Display for TinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TinError::OutsideDomain { index, point } => write!(
                f,
                "point {index} at ({}, {}) lies outside the bounding quadrilateral",
                point.x, point.y
            ),
            TinError::Degenerate(Degeneracy::CollinearTriangle { vertices }) => {
                write!(f, "vertices {vertices:?} are collinear (degenerate triangle)")
            }
            TinError::Degenerate(Degeneracy::NonConvexQuad) => {
                write!(f, "domain is not a convex quadrilateral in simple order")
            }
            TinError::Degenerate(Degeneracy::DuplicateVertex { index, existing }) => write!(
                f,
                "point {index} coincides with existing vertex {}",
                existing.0
            ),
            TinError::Invariant(Invariant::DuplicateTriangle { vertices }) => {
                write!(f, "invariant violated: duplicate triangle {vertices:?}")
            }
            TinError::Invariant(Invariant::Unlocated { index }) => write!(
                f,
                "invariant violated: point {index} is inside the domain but in no triangle"
            ),
            TinError::Invariant(Invariant::FlipBudgetExhausted { flips }) => write!(
                f,
                "invariant violated: Delaunay repair did not settle after {flips} flips"
            ),
            TinError::MissingTarget { vertex } => {
                write!(f, "vertex {} has no target position", vertex.0)
            }
        }
    }
}

impl std::error::Error for TinError {}
