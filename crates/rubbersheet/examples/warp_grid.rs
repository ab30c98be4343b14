//! Warp a regular grid with a handful of random tie points and print the displacement.
//!
//! Usage:
//!   cargo run -p rubbersheet --example warp_grid -- [seed]

use nalgebra::Vector2;
use rubbersheet::prelude::*;

fn main() {
    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(2025);
    let quad = Quad::from_bounds(
        Vector2::new(0.0, 0.0),
        Vector2::new(100.0, 100.0),
        GeomCfg::default(),
    )
    .expect("square domain");
    let ties = draw_tie_points(
        quad.corners(),
        TieCfg {
            count: 12,
            jitter: 4.0,
            margin: 0.05,
        },
        ReplayToken { seed, index: 0 },
    );
    let sheet = match RubberSheetBuilder::new(quad).build(&ties) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("build failed: {err}");
            return;
        }
    };
    println!("triangles: {}", sheet.len());
    for j in 0..=4 {
        let row: Vec<String> = (0..=4)
            .map(|i| {
                let p = Vector2::new(25.0 * i as f64, 25.0 * j as f64);
                let q = sheet.transform_point(p).unwrap_or(p);
                format!("{:+.2},{:+.2}", q.x - p.x, q.y - p.y)
            })
            .collect();
        println!("{}", row.join("  "));
    }
}
