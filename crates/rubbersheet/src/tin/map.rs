//! Source triangle → (destination triangle, affine map) table.

use nalgebra::Vector2;

use crate::geom2::{orient2d, Affine2, GeomCfg, TiePoint};

use super::build::{Tin, TinBuilder};
use super::types::{Degeneracy, Quad, TinError, Triangle, VertexId};

/// One row of the table: the destination keeps the source's vertex slots.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MappedTriangle {
    pub source: Triangle,
    pub target: [Vector2<f64>; 3],
    /// Carries `source` slot i exactly onto `target[i]`.
    pub affine: Affine2,
}

impl MappedTriangle {
    /// Twice the signed area of the destination triangle; `<= 0` means folded or collapsed.
    #[inline]
    pub fn target_orientation(&self) -> f64 {
        orient2d(self.target[0], self.target[1], self.target[2])
    }
}

/// Immutable triangle map derived from a completed TIN whose vertices all carry targets.
#[derive(Clone, Debug)]
pub struct TriangleMap {
    entries: Vec<MappedTriangle>,
    cfg: GeomCfg,
}

impl TriangleMap {
    /// Derive the table from `tin`; every vertex, corners included, needs a target.
    pub fn from_tin(tin: &Tin) -> Result<Self, TinError> {
        let cfg = tin.cfg();
        let mut entries = Vec::with_capacity(tin.triangles().len());
        for tri in tin.triangles() {
            let mut target = [Vector2::<f64>::zeros(); 3];
            for (slot, id) in tri.ids().into_iter().enumerate() {
                target[slot] = tin
                    .vertex(id)
                    .and_then(|v| v.target)
                    .ok_or(TinError::MissingTarget { vertex: id })?;
            }
            let affine = Affine2::from_triangles(tri.positions(), target).ok_or(
                TinError::Degenerate(Degeneracy::CollinearTriangle {
                    vertices: tri.ids(),
                }),
            )?;
            entries.push(MappedTriangle {
                source: *tri,
                target,
                affine,
            });
        }
        Ok(Self { entries, cfg })
    }

    /// Assemble from precomputed rows (used for inversion).
    pub(crate) fn from_entries(entries: Vec<MappedTriangle>, cfg: GeomCfg) -> Self {
        Self { entries, cfg }
    }

    pub fn entries(&self) -> &[MappedTriangle] {
        &self.entries
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn cfg(&self) -> GeomCfg {
        self.cfg
    }
    pub fn iter(&self) -> std::slice::Iter<'_, MappedTriangle> {
        self.entries.iter()
    }

    /// First row whose source triangle contains `p` (inclusive).
    pub fn find(&self, p: Vector2<f64>) -> Option<&MappedTriangle> {
        self.entries
            .iter()
            .find(|e| e.source.contains_or_is_vertex(p, self.cfg))
    }
}

impl<'a> IntoIterator for &'a TriangleMap {
    type Item = &'a MappedTriangle;
    type IntoIter = std::slice::Iter<'a, MappedTriangle>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Triangulate `ties` inside `quad` and derive the triangle map.
///
/// Every tie must carry a target (checked before any triangulation work);
/// the quad corners are carried onto `corner_targets`.
pub fn map_triangulate(
    quad: &Quad,
    corner_targets: [Vector2<f64>; 4],
    ties: &[TiePoint],
) -> Result<TriangleMap, TinError> {
    if let Some(k) = ties.iter().position(|t| t.target.is_none()) {
        return Err(TinError::MissingTarget {
            vertex: VertexId(4 + k),
        });
    }
    let tin = TinBuilder::new(quad.clone())
        .with_corner_targets(corner_targets)
        .build(ties)?;
    TriangleMap::from_tin(&tin)
}
