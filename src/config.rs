//! Scanner configuration
//!
//! All knobs have defaults so the scanner runs without a config file; a
//! TOML file can override any subset of them.
//!
//! ```toml
//! bos_buffer = 0.25
//! session_only = true
//!
//! [weights]
//! clean_fvg = 3.0
//! fvg_size = 2.0
//! session_quality = 1.0
//! ```

use crate::indicators::{DEFAULT_ATR_PERIOD, DEFAULT_RVOL_PERIOD};
use crate::scoring::ScoreWeights;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a scan run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Scoring weights for detected gaps
    pub weights: ScoreWeights,
    /// ATR multiple a close must clear beyond a pivot to count as a break
    pub bos_buffer: f64,
    /// Rolling window for the average true range
    pub atr_period: usize,
    /// Rolling window for relative volume
    pub rvol_period: usize,
    /// Restrict scanning to regular-session bars (09:30-16:00 ET)
    pub session_only: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            bos_buffer: 0.1,
            atr_period: DEFAULT_ATR_PERIOD,
            rvol_period: DEFAULT_RVOL_PERIOD,
            session_only: false,
        }
    }
}

/// Parse a config from a TOML string
pub fn load_config_str(raw: &str) -> Result<ScanConfig> {
    toml::from_str(raw).context("failed to parse scanner config TOML")
}

/// Load a config from a TOML file
pub fn load_config_path(path: &Path) -> Result<ScanConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {:?}", path))?;
    load_config_str(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.bos_buffer, 0.1);
        assert_eq!(config.atr_period, 14);
        assert_eq!(config.rvol_period, 20);
        assert!(!config.session_only);
        assert_eq!(config.weights.clean_fvg, 0.0);
    }

    #[test]
    fn test_partial_weights_default_to_zero() {
        let config = load_config_str(
            r#"
            [weights]
            clean_fvg = 3.0
            "#,
        )
        .unwrap();

        assert_eq!(config.weights.clean_fvg, 3.0);
        assert_eq!(config.weights.fvg_size, 0.0);
        assert_eq!(config.weights.session_quality, 0.0);
        assert_eq!(config.bos_buffer, 0.1);
    }

    #[test]
    fn test_full_config_round_trip() {
        let config = load_config_str(
            r#"
            bos_buffer = 0.25
            atr_period = 10
            rvol_period = 30
            session_only = true

            [weights]
            clean_fvg = 3.0
            fvg_size = 2.0
            session_quality = 1.0
            "#,
        )
        .unwrap();

        assert_eq!(config.bos_buffer, 0.25);
        assert_eq!(config.atr_period, 10);
        assert_eq!(config.rvol_period, 30);
        assert!(config.session_only);
        assert_eq!(config.weights.session_quality, 1.0);
    }

    #[test]
    fn test_negative_weights_are_not_rejected() {
        let config = load_config_str(
            r#"
            [weights]
            fvg_size = -2.5
            "#,
        )
        .unwrap();
        assert_eq!(config.weights.fvg_size, -2.5);
    }
}
