//! Fair value gap detection and lifecycle
//!
//! A fair value gap is a 3-bar directional imbalance: three same-colour
//! candles where the middle bar's range clears the first bar entirely and
//! stays clear of the third, leaving an untraded band between the outer
//! bars. The band is tracked against later price action to decide whether
//! it stays "clean".

use crate::bars::Bar;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FvgDirection {
    Bullish,
    Bearish,
}

impl std::fmt::Display for FvgDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FvgDirection::Bullish => write!(f, "bullish"),
            FvgDirection::Bearish => write!(f, "bearish"),
        }
    }
}

/// A detected fair value gap
///
/// `index` is the third bar of the pattern. `clean` and `score` start at
/// their defaults and are stamped by `resolve_clean` and the scorer; the
/// record is not touched again after that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fvg {
    pub index: usize,
    pub direction: FvgDirection,
    pub low: f64,
    pub high: f64,
    /// Band width divided by the middle bar's ATR
    pub size_atr: f64,
    pub clean: bool,
    pub score: i64,
}

/// Detect fair value gaps over every 3-bar window
///
/// All three candles must close in their open's direction. The band is
/// [first high, third low] for bullish gaps and [third high, first low]
/// for bearish ones, and the middle bar must not overlap either outer bar.
/// Candidates whose middle bar has no usable ATR are dropped rather than
/// sized against a zero or missing value. At most one gap per ending index.
pub fn detect_fvgs(bars: &[Bar]) -> Vec<Fvg> {
    let mut gaps = Vec::new();

    for i in 2..bars.len() {
        let c1 = &bars[i - 2];
        let c2 = &bars[i - 1];
        let c3 = &bars[i];

        let up = c1.is_bullish() && c2.is_bullish() && c3.is_bullish();
        let down = c1.is_bearish() && c2.is_bearish() && c3.is_bearish();
        if !(up || down) {
            continue;
        }

        let (low, high, direction) =
            if up && c1.high < c3.low && c2.low > c1.high && c2.high < c3.low {
                (c1.high, c3.low, FvgDirection::Bullish)
            } else if down && c1.low > c3.high && c2.high < c1.low && c2.low > c3.high {
                (c3.high, c1.low, FvgDirection::Bearish)
            } else {
                continue;
            };

        let Some(atr) = c2.atr.filter(|a| *a > 0.0) else {
            continue;
        };

        gaps.push(Fvg {
            index: i,
            direction,
            low,
            high,
            size_atr: (high - low) / atr,
            clean: false,
            score: 0,
        });
    }

    gaps
}

/// A gap is clean while no later bar's range touches its band
pub fn is_clean(bars: &[Bar], fvg: &Fvg) -> bool {
    !bars[fvg.index + 1..]
        .iter()
        .any(|bar| bar.low <= fvg.high && bar.high >= fvg.low)
}

/// Stamp the clean flag on every gap in a batch
///
/// Cleanliness is a suffix property: it is only decidable once the batch
/// is finished, so this runs after detection, never incrementally.
pub fn resolve_clean(bars: &[Bar], gaps: &mut [Fvg]) {
    for gap in gaps.iter_mut() {
        gap.clean = is_clean(bars, gap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bars::Session;
    use chrono::{TimeZone, Utc};

    fn make_bars(rows: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
        rows.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Bar {
                timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, i as u32, 0).unwrap(),
                open,
                high,
                low,
                close,
                volume: 1.0,
                atr: Some(1.0),
                rvol: None,
                vwap: None,
                session: Session::Other,
            })
            .collect()
    }

    fn bullish_gap_bars() -> Vec<Bar> {
        make_bars(&[
            (1.0, 2.0, 1.0, 2.0),
            (2.2, 3.0, 2.2, 3.0),
            (3.2, 4.0, 3.2, 4.0),
            (3.5, 3.8, 3.4, 3.6),
        ])
    }

    #[test]
    fn test_fvg_detection_and_clean() {
        let bars = bullish_gap_bars();
        let gaps = detect_fvgs(&bars);

        assert_eq!(gaps.len(), 1);
        let gap = &gaps[0];
        assert_eq!(gap.index, 2);
        assert_eq!(gap.direction, FvgDirection::Bullish);
        assert_eq!(gap.low, 2.0);
        assert_eq!(gap.high, 3.2);
        assert!((gap.size_atr - 1.2).abs() < 1e-9);
        assert!(is_clean(&bars, gap));
    }

    #[test]
    fn test_fvg_touched_invalidates_clean_flag() {
        let mut bars = bullish_gap_bars();
        bars.push(make_bars(&[(3.0, 4.5, 2.0, 3.1)]).remove(0));
        bars[4].timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 4, 0).unwrap();

        let mut gaps = detect_fvgs(&bars);
        assert_eq!(gaps.len(), 1);

        resolve_clean(&bars, &mut gaps);
        assert!(!gaps[0].clean);
    }

    #[test]
    fn test_fvg_bearish_mirror() {
        let bars = make_bars(&[
            (4.0, 4.0, 3.0, 3.0),
            (2.8, 2.8, 2.0, 2.0),
            (1.8, 1.8, 1.0, 1.0),
            (1.5, 1.6, 1.4, 1.45),
        ]);

        let gaps = detect_fvgs(&bars);
        assert_eq!(gaps.len(), 1);
        let gap = &gaps[0];
        assert_eq!(gap.direction, FvgDirection::Bearish);
        assert_eq!(gap.low, 1.8);
        assert_eq!(gap.high, 3.0);
        assert!((gap.size_atr - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_fvg_requires_uniform_colour() {
        let mut bars = bullish_gap_bars();
        // Middle candle turns bearish, geometry unchanged
        bars[1].open = 3.0;
        bars[1].close = 2.2;

        assert!(detect_fvgs(&bars).is_empty());
    }

    #[test]
    fn test_fvg_middle_bar_must_clear_outer_bars() {
        let mut bars = bullish_gap_bars();
        // Middle bar dips into the first bar's range
        bars[1].low = 1.9;

        assert!(detect_fvgs(&bars).is_empty());
    }

    #[test]
    fn test_fvg_skipped_without_atr() {
        let mut bars = bullish_gap_bars();
        bars[1].atr = None;
        assert!(detect_fvgs(&bars).is_empty());

        bars[1].atr = Some(0.0);
        assert!(detect_fvgs(&bars).is_empty());
    }

    #[test]
    fn test_fvg_short_batch() {
        let bars = make_bars(&[(1.0, 2.0, 1.0, 2.0), (2.2, 3.0, 2.2, 3.0)]);
        assert!(detect_fvgs(&bars).is_empty());
    }
}
