//! Incremental Delaunay construction inside a convex quadrilateral.
//!
//! Seed with the quad's two triangles, insert points in input order, and after
//! each insertion restore the Delaunay property by edge flips driven by a
//! worklist of changed triangles. Triangles live in an arena with stable ids;
//! removed slots are tombstoned so stale worklist entries are simply skipped.

use std::collections::VecDeque;

use nalgebra::Vector2;

use crate::geom2::{is_convex_polygon, GeomCfg, TiePoint};

use super::types::{Degeneracy, Invariant, Location, Quad, TinError, Triangle, Vertex, VertexId};

/// Stable handle into the working triangle arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TriangleId(pub usize);

/// Counters collected while building.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TinStats {
    pub inserted: usize,
    pub flips: usize,
    /// Violations left in place because the shared-edge quad was not convex.
    pub skipped_flips: usize,
}

/// Completed, immutable triangulation.
#[derive(Clone, Debug)]
pub struct Tin {
    quad: Quad,
    vertices: Vec<TiePoint>,
    triangles: Vec<Triangle>,
    stats: TinStats,
}

impl Tin {
    pub fn quad(&self) -> &Quad {
        &self.quad
    }
    /// All vertices indexed by `VertexId` (corners first, then inserted points).
    pub fn vertices(&self) -> &[TiePoint] {
        &self.vertices
    }
    pub fn vertex(&self, id: VertexId) -> Option<&TiePoint> {
        self.vertices.get(id.0)
    }
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }
    pub fn stats(&self) -> TinStats {
        self.stats
    }
    pub fn cfg(&self) -> GeomCfg {
        self.quad.cfg()
    }

    /// Sum of triangle areas.
    pub fn area(&self) -> f64 {
        self.triangles.iter().map(|t| t.area()).sum()
    }

    /// Index of the first triangle containing `p` (inclusive).
    pub fn locate(&self, p: Vector2<f64>) -> Option<usize> {
        let cfg = self.cfg();
        self.triangles
            .iter()
            .position(|t| t.contains_or_is_vertex(p, cfg))
    }

    /// Global check: no vertex lies strictly inside any triangle's circumcircle.
    pub fn is_delaunay(&self) -> bool {
        let cfg = self.cfg();
        self.triangles.iter().all(|t| {
            let circle = t.circumcircle();
            self.vertices
                .iter()
                .enumerate()
                .filter(|(k, _)| !t.has_vertex(VertexId(*k)))
                .all(|(_, v)| !circle.contains(v.source, cfg.eps_circle))
        })
    }
}

/// Builder for a TIN over a fixed quad. Corner targets are optional; the
/// triangle map requires them.
#[derive(Clone, Debug)]
pub struct TinBuilder {
    quad: Quad,
    corner_targets: [Option<Vector2<f64>>; 4],
}

impl TinBuilder {
    pub fn new(quad: Quad) -> Self {
        Self {
            quad,
            corner_targets: [None; 4],
        }
    }

    pub fn with_corner_targets(mut self, targets: [Vector2<f64>; 4]) -> Self {
        self.corner_targets = targets.map(Some);
        self
    }

    /// Build the Delaunay TIN of `points`. Fails fast; never returns a partial result.
    pub fn build(&self, points: &[TiePoint]) -> Result<Tin, TinError> {
        let cfg = self.quad.cfg();
        for (index, p) in points.iter().enumerate() {
            if !self.quad.contains(p.source) {
                return Err(TinError::OutsideDomain {
                    index,
                    point: p.source,
                });
            }
        }
        let mut vertices: Vec<TiePoint> = self
            .quad
            .corners()
            .iter()
            .zip(self.corner_targets.iter())
            .map(|(c, t)| TiePoint {
                source: *c,
                target: *t,
            })
            .collect();
        vertices.extend_from_slice(points);

        let mut ws = Workspace::new(cfg, vertices.len());
        let seeds: Vec<TriangleId> = self
            .quad
            .triangles()?
            .into_iter()
            .map(|t| ws.arena.insert(t))
            .collect();
        ws.repair(seeds)?;
        for (index, p) in points.iter().enumerate() {
            let v = Vertex::new(VertexId(4 + index), p.source);
            ws.insert(index, v)?;
        }
        let triangles: Vec<Triangle> = ws.arena.iter().map(|(_, t)| *t).collect();
        tracing::debug!(
            points = points.len(),
            triangles = triangles.len(),
            flips = ws.stats.flips,
            skipped_flips = ws.stats.skipped_flips,
            "tin built"
        );
        Ok(Tin {
            quad: self.quad.clone(),
            vertices,
            triangles,
            stats: ws.stats,
        })
    }
}

/// Delaunay TIN of `points` inside `quad` (targets, if any, are carried along).
pub fn triangulate(quad: &Quad, points: &[TiePoint]) -> Result<Tin, TinError> {
    TinBuilder::new(quad.clone()).build(points)
}

/// Triangle arena with tombstones; ids are never reused.
#[derive(Debug, Default)]
struct Arena {
    slots: Vec<Option<Triangle>>,
}

impl Arena {
    fn insert(&mut self, t: Triangle) -> TriangleId {
        self.slots.push(Some(t));
        TriangleId(self.slots.len() - 1)
    }
    fn remove(&mut self, id: TriangleId) -> Option<Triangle> {
        self.slots.get_mut(id.0).and_then(Option::take)
    }
    fn get(&self, id: TriangleId) -> Option<&Triangle> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }
    fn iter(&self) -> impl Iterator<Item = (TriangleId, &Triangle)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(k, t)| t.as_ref().map(|t| (TriangleId(k), t)))
    }
}

/// Outcome of trying to flip the shared edge of two triangles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Flip {
    Done([Triangle; 2]),
    /// The shared-edge quad is not strictly convex; the flip is impossible.
    Skipped,
}

struct Workspace {
    arena: Arena,
    cfg: GeomCfg,
    stats: TinStats,
    flip_budget: usize,
}

impl Workspace {
    fn new(cfg: GeomCfg, vertex_count: usize) -> Self {
        // Lawson flips are bounded by O(n²); the budget only catches runaway loops.
        let n = vertex_count + 4;
        Self {
            arena: Arena::default(),
            cfg,
            stats: TinStats::default(),
            flip_budget: 4 * n * n + 64,
        }
    }

    fn locate(&self, p: Vector2<f64>) -> Option<(TriangleId, Triangle, Location)> {
        self.arena.iter().find_map(|(id, t)| match t.locate(p, self.cfg) {
            Location::Outside => None,
            loc => Some((id, *t, loc)),
        })
    }

    fn insert(&mut self, index: usize, v: Vertex) -> Result<(), TinError> {
        let (tid, tri, loc) = self
            .locate(v.pos)
            .ok_or(TinError::Invariant(Invariant::Unlocated { index }))?;
        let created: Vec<Triangle> = match loc {
            Location::OnVertex(k) => {
                return Err(TinError::Degenerate(Degeneracy::DuplicateVertex {
                    index,
                    existing: tri.vertex(k).id,
                }));
            }
            Location::Inside => tri.sub_triangles(v, self.cfg)?.to_vec(),
            Location::OnEdge(k) => {
                let (a, b) = tri.edge(k);
                let mut out = tri.split_edge(k, v, self.cfg)?.to_vec();
                let neighbour = self
                    .arena
                    .iter()
                    .find(|(id, t)| *id != tid && t.has_vertex(a.id) && t.has_vertex(b.id))
                    .map(|(id, t)| (id, *t));
                if let Some((nid, ntri)) = neighbour {
                    let nk = ntri
                        .edge_with(a.id, b.id)
                        .ok_or(TinError::Invariant(Invariant::Unlocated { index }))?;
                    out.extend(ntri.split_edge(nk, v, self.cfg)?);
                    self.arena.remove(nid);
                }
                out
            }
            Location::Outside => return Err(TinError::Invariant(Invariant::Unlocated { index })),
        };
        self.arena.remove(tid);
        let ids: Vec<TriangleId> = created.into_iter().map(|t| self.arena.insert(t)).collect();
        self.stats.inserted += 1;
        tracing::trace!(index, ?loc, created = ids.len(), "inserted point");
        self.repair(ids)
    }

    /// Triangles sharing exactly one edge with `tri` (excluding `id` itself).
    fn adjacent(&self, id: TriangleId, tri: &Triangle) -> Result<Vec<(TriangleId, Triangle)>, TinError> {
        let mut out = Vec::new();
        for (oid, other) in self.arena.iter() {
            if oid == id {
                continue;
            }
            match tri.shared_count(other) {
                3 => {
                    return Err(TinError::Invariant(Invariant::DuplicateTriangle {
                        vertices: tri.ids(),
                    }))
                }
                2 => out.push((oid, *other)),
                _ => {}
            }
        }
        Ok(out)
    }

    /// Restore the Delaunay property starting from `changed`.
    fn repair(&mut self, changed: Vec<TriangleId>) -> Result<(), TinError> {
        let mut work: VecDeque<TriangleId> = changed.into();
        while let Some(id) = work.pop_front() {
            // Already flipped away by an earlier entry.
            let Some(tri) = self.arena.get(id).copied() else {
                continue;
            };
            let neighbours = self.adjacent(id, &tri)?;
            if neighbours.is_empty() {
                continue;
            }
            let circle = tri.circumcircle();
            for (nid, ntri) in neighbours {
                let Some(off) = tri.opposite_vertex(&ntri) else {
                    continue;
                };
                if !circle.contains(off.pos, self.cfg.eps_circle) {
                    continue;
                }
                match alternative_triangles(&tri, &ntri, self.cfg)? {
                    Flip::Done(pair) => {
                        self.arena.remove(id);
                        self.arena.remove(nid);
                        for t in pair {
                            work.push_back(self.arena.insert(t));
                        }
                        self.stats.flips += 1;
                        if self.stats.flips > self.flip_budget {
                            return Err(TinError::Invariant(Invariant::FlipBudgetExhausted {
                                flips: self.stats.flips,
                            }));
                        }
                        break;
                    }
                    Flip::Skipped => {
                        self.stats.skipped_flips += 1;
                        tracing::warn!(
                            triangle = ?tri.ids(),
                            neighbour = ?ntri.ids(),
                            "flip skipped: shared-edge quad is not convex; Delaunay property locally unrestored"
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

/// Re-split the quad formed by two edge-adjacent triangles along its other diagonal.
///
/// With `t` = (a, b, c) counter-clockwise and shared edge b–c, the off-edge
/// vertex `d` of `n` closes the quad a, b, d, c; the flip yields (a, b, d) and (a, d, c).
pub(crate) fn alternative_triangles(t: &Triangle, n: &Triangle, cfg: GeomCfg) -> Result<Flip, TinError> {
    let (Some(k), Some(d)) = (t.apex_against(n), t.opposite_vertex(n)) else {
        return Ok(Flip::Skipped);
    };
    let a = t.vertex(k);
    let (b, c) = t.edge(k);
    if !is_convex_polygon(&[a.pos, b.pos, d.pos, c.pos], cfg) {
        return Ok(Flip::Skipped);
    }
    Ok(Flip::Done([
        Triangle::new(a, b, d, cfg)?,
        Triangle::new(a, d, c, cfg)?,
    ]))
}
