use std::collections::BTreeSet;

use super::build::{alternative_triangles, Flip};
use super::*;
use crate::geom2::rand::{draw_tie_points, ReplayToken, TieCfg};
use crate::geom2::{GeomCfg, TiePoint};
use nalgebra::{vector, Vector2};
use proptest::prelude::*;

fn square(side: f64) -> Quad {
    Quad::from_bounds(vector![0.0, 0.0], vector![side, side], GeomCfg::default()).unwrap()
}

fn irregular() -> Quad {
    Quad::new(
        [
            vector![0.0, 0.0],
            vector![10.0, 1.0],
            vector![11.0, 9.0],
            vector![-1.0, 8.0],
        ],
        GeomCfg::default(),
    )
    .unwrap()
}

fn v(id: usize, x: f64, y: f64) -> Vertex {
    Vertex::new(VertexId(id), vector![x, y])
}

fn used_ids(tin: &Tin) -> BTreeSet<VertexId> {
    tin.triangles().iter().flat_map(|t| t.ids()).collect()
}

#[test]
fn quad_rejects_non_convex_input() {
    let cfg = GeomCfg::default();
    let bowtie = [
        vector![0.0, 0.0],
        vector![1.0, 1.0],
        vector![1.0, 0.0],
        vector![0.0, 1.0],
    ];
    assert_eq!(
        Quad::new(bowtie, cfg).unwrap_err(),
        TinError::Degenerate(Degeneracy::NonConvexQuad)
    );
    let dart = [
        vector![0.0, 0.0],
        vector![4.0, 2.0],
        vector![0.0, 4.0],
        vector![1.0, 2.0],
    ];
    assert!(Quad::new(dart, cfg).is_err());
}

#[test]
fn quad_seed_triangles_split_along_p0_p2() {
    let q = square(10.0);
    let [t0, t1] = q.triangles().unwrap();
    for t in [t0, t1] {
        assert!(t.has_vertex(VertexId(0)) && t.has_vertex(VertexId(2)));
    }
    assert!(t0.has_vertex(VertexId(1)));
    assert!(t1.has_vertex(VertexId(3)));
    assert!((t0.area() + t1.area() - q.area()).abs() < 1e-12);
}

#[test]
fn quad_containment_is_boundary_inclusive() {
    let q = square(10.0);
    let pts = [
        vector![0.0, 0.0],
        vector![10.0, 5.0],
        vector![5.0, 5.0],
        vector![0.0, 10.0],
    ];
    assert!(q.contains_all(pts.iter()));
    assert!(!q.contains(vector![10.0 + 1e-3, 5.0]));
    assert!(!q.contains_all([vector![1.0, 1.0], vector![-0.5, 1.0]].iter()));
}

#[test]
fn triangle_rejects_collinear_and_orders_ccw() {
    let cfg = GeomCfg::default();
    let err = Triangle::new(v(0, 0.0, 0.0), v(1, 1.0, 1.0), v(2, 3.0, 3.0), cfg).unwrap_err();
    assert!(matches!(
        err,
        TinError::Degenerate(Degeneracy::CollinearTriangle { .. })
    ));
    // Clockwise input is stored counter-clockwise.
    let t = Triangle::new(v(0, 0.0, 0.0), v(1, 0.0, 1.0), v(2, 1.0, 0.0), cfg).unwrap();
    assert!(t.area() > 0.0);
    assert!(t.has_vertex(VertexId(1)) && !t.has_vertex(VertexId(7)));
}

#[test]
fn triangle_point_location() {
    let cfg = GeomCfg::default();
    let t = Triangle::new(v(0, 0.0, 0.0), v(1, 4.0, 0.0), v(2, 0.0, 4.0), cfg).unwrap();
    assert_eq!(t.locate(vector![1.0, 1.0], cfg), Location::Inside);
    assert_eq!(t.locate(vector![4.0, 0.0], cfg), Location::OnVertex(1));
    // Hypotenuse is opposite vertex 0.
    assert_eq!(t.locate(vector![2.0, 2.0], cfg), Location::OnEdge(0));
    assert_eq!(t.locate(vector![2.0, 0.0], cfg), Location::OnEdge(2));
    assert_eq!(t.locate(vector![3.0, 3.0], cfg), Location::Outside);
    assert!(t.contains_or_is_vertex(vector![0.0, 2.0], cfg));
    assert!(!t.contains_or_is_vertex(vector![-0.1, 2.0], cfg));
}

#[test]
fn circumcircle_is_open() {
    let cfg = GeomCfg::default();
    let t = Triangle::new(v(0, 0.0, 0.0), v(1, 2.0, 0.0), v(2, 0.0, 2.0), cfg).unwrap();
    let c = t.circumcircle();
    assert!((c.center - vector![1.0, 1.0]).norm() < 1e-12);
    assert!((c.radius - 2.0_f64.sqrt()).abs() < 1e-12);
    assert!(c.contains(vector![1.0, 1.0], cfg.eps_circle));
    // The fourth square corner is cocircular: not a violation.
    assert!(!c.contains(vector![2.0, 2.0], cfg.eps_circle));
}

#[test]
fn sub_triangles_and_edge_split_preserve_area() {
    let cfg = GeomCfg::default();
    let t = Triangle::new(v(0, 0.0, 0.0), v(1, 6.0, 0.0), v(2, 0.0, 6.0), cfg).unwrap();
    let subs = t.sub_triangles(v(3, 1.0, 2.0), cfg).unwrap();
    let total: f64 = subs.iter().map(|s| s.area()).sum();
    assert!((total - t.area()).abs() < 1e-12);
    assert!(subs.iter().all(|s| s.has_vertex(VertexId(3))));
    let halves = t.split_edge(0, v(4, 3.0, 3.0), cfg).unwrap();
    assert!((halves[0].area() + halves[1].area() - t.area()).abs() < 1e-12);
    // A point on an edge must not be fanned: one child would be collinear.
    assert!(t.sub_triangles(v(5, 3.0, 0.0), cfg).is_err());
}

#[test]
fn empty_square_keeps_cocircular_seed_split() {
    let tin = triangulate(&square(10.0), &[]).unwrap();
    assert_eq!(tin.triangles().len(), 2);
    assert_eq!(tin.stats().flips, 0);
    assert!(tin.triangles().iter().all(|t| t.has_vertex(VertexId(0))));
    assert!(tin.is_delaunay());
}

#[test]
fn thin_kite_seed_is_flipped_to_short_diagonal() {
    let quad = Quad::new(
        [
            vector![0.0, 0.0],
            vector![5.0, -1.0],
            vector![10.0, 0.0],
            vector![5.0, 1.0],
        ],
        GeomCfg::default(),
    )
    .unwrap();
    let tin = triangulate(&quad, &[]).unwrap();
    assert_eq!(tin.stats().flips, 1);
    assert!(tin
        .triangles()
        .iter()
        .all(|t| t.has_vertex(VertexId(1)) && t.has_vertex(VertexId(3))));
    assert!(tin.is_delaunay());
}

#[test]
fn point_on_seed_diagonal_splits_both_seeds() {
    let ties = [TiePoint::new(vector![5.0, 5.0], vector![6.0, 4.0])];
    let tin = triangulate(&square(10.0), &ties).unwrap();
    assert_eq!(tin.triangles().len(), 4);
    assert!(tin.triangles().iter().all(|t| t.has_vertex(VertexId(4))));
    assert!((tin.area() - 100.0).abs() < 1e-9);
    assert!(tin.is_delaunay());
}

#[test]
fn point_on_domain_boundary_splits_one_triangle() {
    let ties = [TiePoint::unmapped(vector![5.0, 0.0])];
    let tin = triangulate(&square(10.0), &ties).unwrap();
    assert_eq!(tin.triangles().len(), 3);
    assert!((tin.area() - 100.0).abs() < 1e-9);
    assert_eq!(used_ids(&tin).len(), 5);
}

#[test]
fn outside_point_fails_before_insertion() {
    let pts = [
        TiePoint::unmapped(vector![1.0, 1.0]),
        TiePoint::unmapped(vector![11.0, 1.0]),
    ];
    match triangulate(&square(10.0), &pts) {
        Err(TinError::OutsideDomain { index, point }) => {
            assert_eq!(index, 1);
            assert_eq!(point, vector![11.0, 1.0]);
        }
        other => panic!("expected OutsideDomain, got {other:?}"),
    }
}

#[test]
fn duplicate_points_are_degenerate() {
    let pts = [
        TiePoint::unmapped(vector![3.0, 4.0]),
        TiePoint::unmapped(vector![3.0, 4.0]),
    ];
    assert_eq!(
        triangulate(&square(10.0), &pts).unwrap_err(),
        TinError::Degenerate(Degeneracy::DuplicateVertex {
            index: 1,
            existing: VertexId(4)
        })
    );
    let corner = [TiePoint::unmapped(vector![10.0, 10.0])];
    assert!(matches!(
        triangulate(&square(10.0), &corner),
        Err(TinError::Degenerate(Degeneracy::DuplicateVertex {
            index: 0,
            existing: VertexId(2)
        }))
    ));
}

#[test]
fn flip_is_skipped_when_shared_quad_is_not_convex() {
    let cfg = GeomCfg::default();
    // Shared edge b–c; d lies across it but the quad a, b, d, c is reflex at b.
    let t = Triangle::new(v(0, 0.0, 0.0), v(1, 4.0, 0.0), v(2, 0.0, 4.0), cfg).unwrap();
    let n = Triangle::new(v(1, 4.0, 0.0), v(3, 6.0, -1.0), v(2, 0.0, 4.0), cfg).unwrap();
    assert_eq!(alternative_triangles(&t, &n, cfg).unwrap(), Flip::Skipped);
    // Convex case flips onto the other diagonal.
    let m = Triangle::new(v(1, 4.0, 0.0), v(3, 3.0, 3.0), v(2, 0.0, 4.0), cfg).unwrap();
    match alternative_triangles(&t, &m, cfg).unwrap() {
        Flip::Done(pair) => {
            assert!(pair
                .iter()
                .all(|p| p.has_vertex(VertexId(0)) && p.has_vertex(VertexId(3))));
            let before = t.area() + m.area();
            assert!((pair[0].area() + pair[1].area() - before).abs() < 1e-12);
        }
        Flip::Skipped => panic!("convex quad must flip"),
    }
    // Non-adjacent triangles cannot be flipped.
    let far = Triangle::new(v(5, 10.0, 10.0), v(6, 11.0, 10.0), v(7, 10.0, 11.0), cfg).unwrap();
    assert_eq!(alternative_triangles(&t, &far, cfg).unwrap(), Flip::Skipped);
}

#[test]
fn worked_example_maps_tie_point_and_fixes_corners() {
    let quad = square(10.0);
    let ties = [TiePoint::new(vector![5.0, 5.0], vector![6.0, 4.0])];
    let map = map_triangulate(&quad, quad.corners(), &ties).unwrap();
    assert_eq!(map.len(), 4);
    let row = map.find(vector![5.0, 5.0]).unwrap();
    assert!((row.affine.apply(vector![5.0, 5.0]) - vector![6.0, 4.0]).norm() < 1e-12);
    let corner = map.find(vector![0.0, 0.0]).unwrap();
    assert!(corner.affine.apply(vector![0.0, 0.0]).norm() < 1e-12);
}

#[test]
fn triangle_map_requires_targets() {
    let quad = square(10.0);
    let ties = [
        TiePoint::new(vector![2.0, 3.0], vector![2.0, 3.0]),
        TiePoint::unmapped(vector![7.0, 3.0]),
    ];
    assert_eq!(
        map_triangulate(&quad, quad.corners(), &ties).unwrap_err(),
        TinError::MissingTarget {
            vertex: VertexId(5)
        }
    );
    // Corners without targets fail at table construction.
    let tin = triangulate(&quad, &ties[..1]).unwrap();
    assert!(matches!(
        TriangleMap::from_tin(&tin),
        Err(TinError::MissingTarget { vertex }) if vertex.0 < 4
    ));
}

fn sample(quad: &Quad, n: usize, seed: u64, jitter: f64) -> Vec<TiePoint> {
    draw_tie_points(
        quad.corners(),
        TieCfg {
            count: n,
            jitter,
            margin: 0.02,
        },
        ReplayToken { seed, index: 0 },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn random_tins_are_delaunay_and_cover_the_quad(seed in any::<u64>(), n in 0usize..30) {
        let quad = irregular();
        let ties = sample(&quad, n, seed, 0.0);
        let tin = triangulate(&quad, &ties).unwrap();
        prop_assert!(tin.is_delaunay());
        prop_assert!((tin.area() - quad.area()).abs() < 1e-9 * quad.area());
        prop_assert!(tin.triangles().iter().all(|t| t.area() > 0.0));
        // Interior points in general position: 2(N+1) triangles.
        prop_assert_eq!(tin.triangles().len(), 2 * (n + 1));
        let expected: BTreeSet<VertexId> = (0..n + 4).map(VertexId).collect();
        prop_assert_eq!(used_ids(&tin), expected);
        prop_assert_eq!(tin.stats().inserted, n);
    }

    #[test]
    fn triangle_map_is_exact_and_continuous(seed in any::<u64>(), n in 1usize..25) {
        let quad = irregular();
        let ties = sample(&quad, n, seed, 0.4);
        let map = map_triangulate(&quad, quad.corners(), &ties).unwrap();
        for row in &map {
            for (slot, p) in row.source.positions().into_iter().enumerate() {
                prop_assert!((row.affine.apply(p) - row.target[slot]).norm() < 1e-9);
            }
        }
        let rows = map.entries();
        for i in 0..rows.len() {
            for j in (i + 1)..rows.len() {
                let (a, b) = (&rows[i], &rows[j]);
                if a.source.shared_count(&b.source) != 2 {
                    continue;
                }
                let shared: Vec<Vector2<f64>> = a
                    .source
                    .vertices()
                    .into_iter()
                    .filter(|v| b.source.has_vertex(v.id))
                    .map(|v| v.pos)
                    .collect();
                let mid = (shared[0] + shared[1]) * 0.5;
                prop_assert!((a.affine.apply(mid) - b.affine.apply(mid)).norm() < 1e-9);
            }
        }
    }
}
