//! Criterion benchmarks for rubber-sheet point queries.
//! Focus: 1000-point batches against sheets built from {10, 50, 200} ties.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Vector2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rubbersheet::geom2::rand::{draw_tie_points, ReplayToken, TieCfg};
use rubbersheet::tin::Quad;
use rubbersheet::warp::RubberSheetBuilder;
use rubbersheet::GeomCfg;

fn bench_warp(c: &mut Criterion) {
    let mut group = c.benchmark_group("warp");
    let quad = Quad::from_bounds(
        Vector2::new(0.0, 0.0),
        Vector2::new(1000.0, 1000.0),
        GeomCfg::default(),
    )
    .unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let queries: Vec<Vector2<f64>> = (0..1000)
        .map(|_| Vector2::new(rng.gen_range(0.0..1000.0), rng.gen_range(0.0..1000.0)))
        .collect();
    for &n in &[10usize, 50, 200] {
        let ties = draw_tie_points(
            quad.corners(),
            TieCfg {
                count: n,
                jitter: 5.0,
                margin: 0.01,
            },
            ReplayToken { seed: 99, index: n as u64 },
        );
        let sheet = RubberSheetBuilder::new(quad.clone()).build(&ties).unwrap();
        group.bench_with_input(BenchmarkId::new("transform_1000", n), &n, |b, _| {
            b.iter(|| {
                let _out = sheet.transform(&queries).unwrap();
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_warp);
criterion_main!(benches);
