// Library crate - exports the bar model, detectors and report pipeline

pub mod bars;
pub mod config;
pub mod fvg;
pub mod indicators;
pub mod report;
pub mod scoring;
pub mod structure;

// Re-export commonly used types
pub use bars::{Bar, Session};
pub use config::ScanConfig;
pub use fvg::{Fvg, FvgDirection};
pub use report::{scan, ScanReport};
pub use scoring::ScoreWeights;
pub use structure::{BosEvent, BreakDirection, Pivot, PivotKind};
