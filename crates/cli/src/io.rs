//! CSV input/output and argument parsing helpers.
//!
//! Tie CSVs carry `sx,sy` and optionally `tx,ty`; query CSVs carry `x,y`.

use anyhow::{anyhow, bail, Context, Result};
use polars::prelude::*;
use rubbersheet::{TiePoint, Vec2};
use std::fs::File;
use std::path::Path;

/// Four quad corners parsed from `"x0,y0;x1,y1;x2,y2;x3,y3"`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Corners(pub [Vec2<f64>; 4]);

pub fn parse_corners(s: &str) -> Result<Corners, String> {
    let parts: Vec<&str> = s.split(';').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(format!("expected 4 corners separated by ';', got {}", parts.len()));
    }
    let mut out = [Vec2::<f64>::zeros(); 4];
    for (k, part) in parts.iter().enumerate() {
        let xy: Vec<f64> = part
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("corner {k}: {e}"))?;
        if xy.len() != 2 {
            return Err(format!("corner {k}: expected `x,y`, got `{part}`"));
        }
        out[k] = Vec2::new(xy[0], xy[1]);
    }
    Ok(Corners(out))
}

fn read_csv(path: &str) -> Result<DataFrame> {
    let lf = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(100))
        .finish()
        .with_context(|| format!("opening {path}"))?;
    let df = lf.collect().with_context(|| format!("reading {path}"))?;
    tracing::info!(path, rows = df.height(), cols = df.width(), "csv_loaded");
    Ok(df)
}

fn column_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = df
        .column(name)
        .with_context(|| format!("missing column `{name}`"))?
        .cast(&DataType::Float64)?;
    let ca = series.f64()?;
    ca.into_iter()
        .enumerate()
        .map(|(row, v)| v.ok_or_else(|| anyhow!("null in column `{name}` at row {row}")))
        .collect()
}

/// Load tie points; targets are present iff both `tx` and `ty` columns exist.
pub fn read_ties(path: &str) -> Result<Vec<TiePoint>> {
    let df = read_csv(path)?;
    let sx = column_f64(&df, "sx")?;
    let sy = column_f64(&df, "sy")?;
    let targets = match (df.column("tx").is_ok(), df.column("ty").is_ok()) {
        (true, true) => Some((column_f64(&df, "tx")?, column_f64(&df, "ty")?)),
        (false, false) => None,
        _ => bail!("{path}: `tx` and `ty` must appear together"),
    };
    let ties = (0..sx.len())
        .map(|k| {
            let source = Vec2::new(sx[k], sy[k]);
            match &targets {
                Some((tx, ty)) => TiePoint::new(source, Vec2::new(tx[k], ty[k])),
                None => TiePoint::unmapped(source),
            }
        })
        .collect();
    Ok(ties)
}

/// Load query points from `x,y` columns.
pub fn read_points(path: &str) -> Result<Vec<Vec2<f64>>> {
    let df = read_csv(path)?;
    let x = column_f64(&df, "x")?;
    let y = column_f64(&df, "y")?;
    Ok(x.into_iter().zip(y).map(|(x, y)| Vec2::new(x, y)).collect())
}

/// Write tie points as `sx,sy,tx,ty` (targets required).
pub fn write_ties(path: &Path, ties: &[TiePoint]) -> Result<()> {
    let targets: Vec<Vec2<f64>> = ties
        .iter()
        .enumerate()
        .map(|(k, t)| t.target.ok_or_else(|| anyhow!("tie {k} has no target")))
        .collect::<Result<_>>()?;
    let mut df = polars::df!(
        "sx" => ties.iter().map(|t| t.source.x).collect::<Vec<f64>>(),
        "sy" => ties.iter().map(|t| t.source.y).collect::<Vec<f64>>(),
        "tx" => targets.iter().map(|t| t.x).collect::<Vec<f64>>(),
        "ty" => targets.iter().map(|t| t.y).collect::<Vec<f64>>()
    )?;
    ensure_parent(path)?;
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file).finish(&mut df)?;
    Ok(())
}

pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    Ok(())
}
