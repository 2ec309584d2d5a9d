use anyhow::Result;
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use ict_scanner::bars::{find_bar_files, load_bars_csv, symbol_from_path};
use ict_scanner::config::{load_config_path, ScanConfig};
use ict_scanner::indicators::{enrich, filter_rth};
use ict_scanner::report::{
    scan, write_bars_csv, write_report_json, write_signals_csv, write_summary_csv, ScanReport,
};

#[derive(Parser, Debug)]
#[command(name = "scanner")]
#[command(about = "ICT liquidity sweep + FVG signal scanner")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Print verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan bar files for structure signals and export reports
    Scan {
        /// A bar CSV file, or a directory of <SYMBOL>.csv files
        #[arg(short, long, default_value = "data")]
        data: PathBuf,

        /// TOML config with scoring weights (defaults when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory for reports
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Only scan regular-session bars (09:30-16:00 ET)
        #[arg(long)]
        session_only: bool,

        /// Process only files whose name contains this symbol
        #[arg(short, long)]
        symbol: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Commands::Scan {
            data,
            config,
            output_dir,
            session_only,
            symbol,
        } => run_scan(data, config, output_dir, session_only, symbol),
    }
}

fn run_scan(
    data: PathBuf,
    config_path: Option<PathBuf>,
    output_dir: PathBuf,
    session_only: bool,
    symbol: Option<String>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => load_config_path(&path)?,
        None => ScanConfig::default(),
    };
    if session_only {
        config.session_only = true;
    }

    let files = if data.is_dir() {
        find_bar_files(&data, symbol.as_deref())?
    } else {
        vec![data.clone()]
    };
    if files.is_empty() {
        anyhow::bail!("No bar files found in {:?}", data);
    }

    std::fs::create_dir_all(&output_dir)?;
    info!("Scanning {} bar file(s)...", files.len());

    let results: Vec<Result<ScanReport>> = files
        .par_iter()
        .map(|path| process_file(path, &config, &output_dir))
        .collect();

    let mut reports = Vec::new();
    for (path, result) in files.iter().zip(results) {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => warn!("{:?}: {:#}", path, e),
        }
    }

    if reports.is_empty() {
        anyhow::bail!("All bar files failed to scan");
    }

    let summary_path = output_dir.join("summary.csv");
    write_summary_csv(&reports, &summary_path)?;

    let total_fvgs: usize = reports.iter().map(|r| r.fvgs.len()).sum();
    info!(
        "Done: {} symbol(s), {} FVG(s), summary at {:?}",
        reports.len(),
        total_fvgs,
        summary_path
    );

    Ok(())
}

fn process_file(path: &Path, config: &ScanConfig, output_dir: &Path) -> Result<ScanReport> {
    let symbol = symbol_from_path(path);

    let mut bars = load_bars_csv(path)?;
    if config.session_only {
        bars = filter_rth(&bars);
    }
    enrich(&mut bars, config.atr_period, config.rvol_period);

    let report = scan(&symbol, &bars, config);

    write_bars_csv(&bars, &output_dir.join(format!("{}_bars.csv", symbol)))?;
    write_signals_csv(&report, &output_dir.join(format!("{}_signals.csv", symbol)))?;
    write_report_json(&report, &output_dir.join(format!("{}_report.json", symbol)))?;

    info!(
        "{}: {} bars, {} pivots, {} sweeps, {} breaks, {} FVGs",
        symbol,
        bars.len(),
        report.pivots.len(),
        report.sweeps.len(),
        report.breaks.len(),
        report.fvgs.len()
    );

    Ok(report)
}
