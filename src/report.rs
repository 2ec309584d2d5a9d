//! Scan orchestration and report export
//!
//! Runs the detectors in dependency order over one enriched bar batch and
//! collects everything a reporting consumer needs: pivots, sweep indices,
//! break events and the scored FVG table.

use crate::bars::Bar;
use crate::config::ScanConfig;
use crate::fvg::{detect_fvgs, resolve_clean, Fvg};
use crate::scoring::score_all;
use crate::structure::{detect_breaks, detect_pivots, detect_sweeps, BosEvent, Pivot};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// All signals detected in one bar batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub symbol: String,
    pub pivots: Vec<Pivot>,
    pub sweeps: Vec<usize>,
    pub breaks: Vec<BosEvent>,
    pub fvgs: Vec<Fvg>,
}

/// Run the full detector pipeline over an enriched bar batch
///
/// Pivots feed the sweep and break detectors; gaps are detected, resolved
/// for cleanliness and scored. Detectors share nothing but the immutable
/// bar slice, and a short batch simply produces an empty report.
pub fn scan(symbol: &str, bars: &[Bar], config: &ScanConfig) -> ScanReport {
    let pivots = detect_pivots(bars);
    let sweeps = detect_sweeps(bars, &pivots);
    let breaks = detect_breaks(bars, &pivots, config.bos_buffer);

    let mut fvgs = detect_fvgs(bars);
    resolve_clean(bars, &mut fvgs);
    score_all(bars, &mut fvgs, &config.weights);

    ScanReport {
        symbol: symbol.to_string(),
        pivots,
        sweeps,
        breaks,
        fvgs,
    }
}

/// Write the scored FVG table as CSV
pub fn write_signals_csv(report: &ScanReport, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create signals file: {:?}", path))?;

    writeln!(file, "index,direction,low,high,size_atr,clean,score")?;
    for fvg in &report.fvgs {
        writeln!(
            file,
            "{},{},{:.4},{:.4},{:.4},{},{}",
            fvg.index, fvg.direction, fvg.low, fvg.high, fvg.size_atr, fvg.clean, fvg.score
        )?;
    }

    Ok(())
}

/// Write the enriched bar sequence as CSV, derived columns included
pub fn write_bars_csv(bars: &[Bar], path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create bars file: {:?}", path))?;

    writeln!(
        file,
        "timestamp,open,high,low,close,volume,atr,rvol,vwap,session"
    )?;
    for bar in bars {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{},{}",
            bar.timestamp.to_rfc3339(),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume,
            fmt_opt(bar.atr),
            fmt_opt(bar.rvol),
            fmt_opt(bar.vwap),
            bar.session
        )?;
    }

    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_default()
}

/// Write the full report as a JSON artifact
pub fn write_report_json(report: &ScanReport, path: &Path) -> Result<()> {
    let json = serde_json::to_vec_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report file: {:?}", path))?;
    Ok(())
}

/// Write all gaps across symbols as one CSV, best score first
///
/// Sorting is stable, so equal scores keep their per-symbol detection
/// order.
pub fn write_summary_csv(reports: &[ScanReport], path: &Path) -> Result<()> {
    let mut rows: Vec<(&str, &Fvg)> = reports
        .iter()
        .flat_map(|r| r.fvgs.iter().map(move |f| (r.symbol.as_str(), f)))
        .collect();
    rows.sort_by(|a, b| b.1.score.cmp(&a.1.score));

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create summary file: {:?}", path))?;

    writeln!(file, "symbol,index,direction,low,high,size_atr,clean,score")?;
    for (symbol, fvg) in rows {
        writeln!(
            file,
            "{},{},{},{:.4},{:.4},{:.4},{},{}",
            symbol, fvg.index, fvg.direction, fvg.low, fvg.high, fvg.size_atr, fvg.clean, fvg.score
        )?;
    }

    Ok(())
}
