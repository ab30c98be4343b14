use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rubbersheet::geom2::rand::{draw_tie_points, ReplayToken, TieCfg};
use rubbersheet::tin::{Quad, Tin, TinBuilder};
use rubbersheet::warp::{CornerMapping, RubberSheetBuilder};
use rubbersheet::GeomCfg;
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use tracing_subscriber::fmt::SubscriberBuilder;

mod io;
mod provenance;

use io::{parse_corners, Corners};
use provenance::Payload;

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Delaunay triangulation and rubber-sheet warping over tie points")]
struct Cmd {
    /// Optional run tag; propagated to provenance and logs
    #[arg(long)]
    tag: Option<String>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CornerArg {
    /// Corners map onto themselves
    Fixed,
    /// Corners follow the least-squares affine fit of the ties
    Affine,
}

#[derive(Subcommand)]
enum Action {
    /// Build the Delaunay TIN of the tie sources and write it as JSON
    Triangulate {
        #[arg(long, value_parser = parse_corners)]
        quad: Corners,
        #[arg(long)]
        input: String,
        #[arg(long)]
        out: String,
    },
    /// Warp query points with the rubber sheet defined by the ties
    Warp {
        #[arg(long, value_parser = parse_corners)]
        quad: Corners,
        #[arg(long)]
        ties: String,
        #[arg(long)]
        input: String,
        #[arg(long)]
        out: String,
        #[arg(long, value_enum, default_value_t = CornerArg::Fixed)]
        corners: CornerArg,
    },
    /// Write a reproducible random tie CSV inside the quad
    Demo {
        #[arg(long, value_parser = parse_corners)]
        quad: Corners,
        #[arg(long, default_value_t = 16)]
        count: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 0.0)]
        jitter: f64,
        #[arg(long)]
        out: String,
    },
    /// Print a small provenance JSON block
    Report,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Triangulate { quad, input, out } => triangulate(quad, input, out, cmd.tag),
        Action::Warp {
            quad,
            ties,
            input,
            out,
            corners,
        } => warp(quad, ties, input, out, corners, cmd.tag),
        Action::Demo {
            quad,
            count,
            seed,
            jitter,
            out,
        } => demo(quad, count, seed, jitter, out, cmd.tag),
        Action::Report => report(cmd.tag),
    }
}

#[derive(Serialize)]
struct VertexOut {
    id: usize,
    source: [f64; 2],
    target: Option<[f64; 2]>,
}

#[derive(Serialize)]
struct MeshOut {
    vertices: Vec<VertexOut>,
    /// Vertex ids per triangle, counter-clockwise.
    triangles: Vec<[usize; 3]>,
    delaunay: bool,
    inserted: usize,
    flips: usize,
    skipped_flips: usize,
}

impl MeshOut {
    fn from_tin(tin: &Tin) -> Self {
        let stats = tin.stats();
        Self {
            vertices: tin
                .vertices()
                .iter()
                .enumerate()
                .map(|(id, v)| VertexOut {
                    id,
                    source: [v.source.x, v.source.y],
                    target: v.target.map(|t| [t.x, t.y]),
                })
                .collect(),
            triangles: tin
                .triangles()
                .iter()
                .map(|t| t.ids().map(|id| id.0))
                .collect(),
            delaunay: tin.is_delaunay(),
            inserted: stats.inserted,
            flips: stats.flips,
            skipped_flips: stats.skipped_flips,
        }
    }
}

#[derive(Serialize)]
struct WarpOut {
    /// One entry per input point; `null` where the point fell outside the domain.
    points: Vec<Option<[f64; 2]>>,
    outside: Vec<usize>,
    triangles: usize,
}

fn write_json<T: Serialize>(out: &str, value: &T) -> Result<()> {
    let out_path = Path::new(out);
    io::ensure_parent(out_path)?;
    std::fs::write(out_path, serde_json::to_vec_pretty(value)?)
        .with_context(|| format!("writing {out}"))?;
    Ok(())
}

fn triangulate(quad: Corners, input: String, out: String, tag: Option<String>) -> Result<()> {
    tracing::info!(input, out, tag = ?tag, "triangulate");
    let domain = Quad::new(quad.0, GeomCfg::default())?;
    let ties = io::read_ties(&input)?;
    let mut builder = TinBuilder::new(domain);
    if ties.iter().all(|t| t.target.is_some()) {
        builder = builder.with_corner_targets(quad.0);
    }
    let tin = builder.build(&ties)?;
    let mesh = MeshOut::from_tin(&tin);
    tracing::info!(
        triangles = mesh.triangles.len(),
        flips = mesh.flips,
        skipped_flips = mesh.skipped_flips,
        "tin_written"
    );
    write_json(&out, &mesh)?;
    let payload = Payload::new(
        "triangulate",
        json!({ "quad": corners_json(&quad), "input": input, "ties": ties.len() }),
    )
    .tagged(tag);
    provenance::write_sidecar(&out, payload)?;
    Ok(())
}

fn warp(
    quad: Corners,
    ties_path: String,
    input: String,
    out: String,
    corners: CornerArg,
    tag: Option<String>,
) -> Result<()> {
    tracing::info!(ties = ties_path, input, out, corners = ?corners, tag = ?tag, "warp");
    let domain = Quad::new(quad.0, GeomCfg::default())?;
    let ties = io::read_ties(&ties_path)?;
    let mapping = match corners {
        CornerArg::Fixed => CornerMapping::Fixed,
        CornerArg::Affine => CornerMapping::FittedAffine,
    };
    let sheet = RubberSheetBuilder::new(domain).corners(mapping).build(&ties)?;
    let points = io::read_points(&input)?;
    let mut outside = Vec::new();
    let warped: Vec<Option<[f64; 2]>> = sheet
        .transform_each(&points)
        .into_iter()
        .enumerate()
        .map(|(k, r)| match r {
            Ok(q) => Some([q.x, q.y]),
            Err(_) => {
                outside.push(k);
                None
            }
        })
        .collect();
    if !outside.is_empty() {
        tracing::warn!(outside = outside.len(), total = points.len(), "points outside domain");
    }
    let result = WarpOut {
        points: warped,
        outside,
        triangles: sheet.len(),
    };
    write_json(&out, &result)?;
    let payload = Payload::new(
        "warp",
        json!({
            "quad": corners_json(&quad),
            "ties": ties_path,
            "input": input,
            "corners": format!("{corners:?}").to_lowercase(),
        }),
    )
    .tagged(tag);
    provenance::write_sidecar(&out, payload)?;
    Ok(())
}

fn demo(
    quad: Corners,
    count: usize,
    seed: u64,
    jitter: f64,
    out: String,
    tag: Option<String>,
) -> Result<()> {
    tracing::info!(count, seed, jitter, out, "demo");
    let domain = Quad::new(quad.0, GeomCfg::default())?;
    let cfg = TieCfg {
        count,
        jitter,
        ..TieCfg::default()
    };
    let ties = draw_tie_points(domain.corners(), cfg, ReplayToken { seed, index: 0 });
    io::write_ties(Path::new(&out), &ties)?;
    let payload = Payload::new(
        "demo",
        json!({ "quad": corners_json(&quad), "count": count, "seed": seed, "jitter": jitter }),
    )
    .tagged(tag);
    provenance::write_sidecar(&out, payload)?;
    Ok(())
}

fn report(tag: Option<String>) -> Result<()> {
    let obj = provenance::block(&Payload::new("report", json!({})).tagged(tag));
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

fn corners_json(quad: &Corners) -> serde_json::Value {
    json!(quad.0.iter().map(|c| [c.x, c.y]).collect::<Vec<_>>())
}
