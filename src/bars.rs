use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Time-of-day bucket used as a signal quality marker (New York time)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Session {
    Am,
    Lunch,
    Pm,
    #[default]
    Other,
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Session::Am => write!(f, "AM"),
            Session::Lunch => write!(f, "LUNCH"),
            Session::Pm => write!(f, "PM"),
            Session::Other => write!(f, "OTHER"),
        }
    }
}

/// A single OHLCV bar with derived columns attached by enrichment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,

    /// Rolling average true range, None during warm-up
    #[serde(default)]
    pub atr: Option<f64>,
    /// Volume relative to its rolling mean, None during warm-up
    #[serde(default)]
    pub rvol: Option<f64>,
    /// Session-anchored VWAP, None until volume has printed
    #[serde(default)]
    pub vwap: Option<f64>,
    #[serde(default)]
    pub session: Session,
}

impl Bar {
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// CSV row structure for bar files (timestamp,open,high,low,close,volume)
#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Find all .csv bar files in a directory, optionally filtered by symbol
pub fn find_bar_files(data_dir: &Path, symbol_filter: Option<&str>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(data_dir)
        .with_context(|| format!("Failed to read directory: {:?}", data_dir))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.extension().map_or(false, |ext| ext == "csv") {
            if let Some(filter) = symbol_filter {
                let filename = path.file_name().unwrap().to_string_lossy();
                if !filename.to_uppercase().contains(&filter.to_uppercase()) {
                    continue;
                }
            }
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Symbol for a bar file, derived from the file stem (e.g. "data/aapl.csv" -> "AAPL")
pub fn symbol_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

/// Parse bars from a CSV file
///
/// Rows are sorted by timestamp and deduplicated so downstream detectors
/// always see a strictly ascending sequence.
pub fn load_bars_csv(path: &Path) -> Result<Vec<Bar>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open bar file: {:?}", path))?;

    let mut csv_reader = csv::Reader::from_reader(std::io::BufReader::new(file));
    let mut bars = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result.with_context(|| format!("Failed to parse CSV row in {:?}", path))?;

        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
            .with_context(|| format!("Failed to parse timestamp: {}", row.timestamp))?
            .with_timezone(&Utc);

        bars.push(Bar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
            atr: None,
            rvol: None,
            vwap: None,
            session: Session::Other,
        });
    }

    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);

    tracing::debug!("Loaded {} bars from {:?}", bars.len(), path);

    Ok(bars)
}
