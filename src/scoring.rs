//! Weighted FVG scoring
//!
//! Each factor contributes its configured weight (or a fixed fraction of
//! it); contributions are summed as reals and truncated to an integer at
//! the end. Weights are taken as-is: missing keys default to zero and no
//! range validation is performed.

use crate::bars::{Bar, Session};
use crate::fvg::Fvg;
use serde::{Deserialize, Serialize};

/// Normalized gap sizes in this band earn the full size weight
const SIZE_FULL_BAND: (f64, f64) = (0.2, 0.8);
/// Sizes outside the full band but inside this one earn half weight
const SIZE_HALF_BAND: (f64, f64) = (0.1, 1.2);

/// Scoring weights, one per factor
///
/// Every field defaults to zero, so a config file can name any subset of
/// weights and the rest simply contribute nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub clean_fvg: f64,
    pub fvg_size: f64,
    pub session_quality: f64,
}

/// Score a single gap given the session of its defining bar
pub fn score_fvg(fvg: &Fvg, session: Session, weights: &ScoreWeights) -> i64 {
    let mut score = 0.0;

    if fvg.clean {
        score += weights.clean_fvg;
    }

    let size = fvg.size_atr;
    if size >= SIZE_FULL_BAND.0 && size <= SIZE_FULL_BAND.1 {
        score += weights.fvg_size;
    } else if (size >= SIZE_HALF_BAND.0 && size < SIZE_FULL_BAND.0)
        || (size > SIZE_FULL_BAND.1 && size <= SIZE_HALF_BAND.1)
    {
        score += weights.fvg_size / 2.0;
    }

    if matches!(session, Session::Am | Session::Pm) {
        score += weights.session_quality;
    }

    score as i64
}

/// Stamp scores on every gap in a batch
pub fn score_all(bars: &[Bar], gaps: &mut [Fvg], weights: &ScoreWeights) {
    for gap in gaps.iter_mut() {
        gap.score = score_fvg(gap, bars[gap.index].session, weights);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fvg::FvgDirection;

    fn gap(size_atr: f64, clean: bool) -> Fvg {
        Fvg {
            index: 2,
            direction: FvgDirection::Bullish,
            low: 1.0,
            high: 1.0 + size_atr,
            size_atr,
            clean,
            score: 0,
        }
    }

    fn weights() -> ScoreWeights {
        ScoreWeights {
            clean_fvg: 3.0,
            fvg_size: 2.0,
            session_quality: 1.0,
        }
    }

    #[test]
    fn test_all_factors_stack() {
        let score = score_fvg(&gap(0.5, true), Session::Am, &weights());
        assert_eq!(score, 6);
    }

    #[test]
    fn test_size_bands() {
        let w = ScoreWeights {
            fvg_size: 2.0,
            ..Default::default()
        };

        // Dead zones
        assert_eq!(score_fvg(&gap(0.05, false), Session::Other, &w), 0);
        assert_eq!(score_fvg(&gap(1.3, false), Session::Other, &w), 0);

        // Half-weight shoulders
        assert_eq!(score_fvg(&gap(0.1, false), Session::Other, &w), 1);
        assert_eq!(score_fvg(&gap(0.15, false), Session::Other, &w), 1);
        assert_eq!(score_fvg(&gap(1.2, false), Session::Other, &w), 1);

        // Full band, boundaries included
        assert_eq!(score_fvg(&gap(0.2, false), Session::Other, &w), 2);
        assert_eq!(score_fvg(&gap(0.8, false), Session::Other, &w), 2);

        // Just past the full band falls back to half weight
        assert_eq!(score_fvg(&gap(0.81, false), Session::Other, &w), 1);
    }

    #[test]
    fn test_session_quality_sessions() {
        let w = ScoreWeights {
            session_quality: 4.0,
            ..Default::default()
        };
        let g = gap(0.05, false);

        assert_eq!(score_fvg(&g, Session::Am, &w), 4);
        assert_eq!(score_fvg(&g, Session::Pm, &w), 4);
        assert_eq!(score_fvg(&g, Session::Lunch, &w), 0);
        assert_eq!(score_fvg(&g, Session::Other, &w), 0);
    }

    #[test]
    fn test_fractional_sum_truncates() {
        // 1.5 (half size weight) + 0 => 1
        let w = ScoreWeights {
            fvg_size: 3.0,
            ..Default::default()
        };
        assert_eq!(score_fvg(&gap(0.1, false), Session::Other, &w), 1);
    }

    #[test]
    fn test_negative_weights_accepted() {
        let w = ScoreWeights {
            clean_fvg: -5.0,
            ..Default::default()
        };
        assert_eq!(score_fvg(&gap(0.05, true), Session::Other, &w), -5);
    }

    #[test]
    fn test_deterministic() {
        let g = gap(0.5, true);
        let w = weights();
        let first = score_fvg(&g, Session::Pm, &w);
        for _ in 0..10 {
            assert_eq!(score_fvg(&g, Session::Pm, &w), first);
        }
    }

    #[test]
    fn test_monotone_in_each_weight() {
        let g = gap(0.5, true);
        let base = weights();
        let score = score_fvg(&g, Session::Am, &base);

        for bump in [
            ScoreWeights {
                clean_fvg: base.clean_fvg + 1.0,
                ..base
            },
            ScoreWeights {
                fvg_size: base.fvg_size + 1.0,
                ..base
            },
            ScoreWeights {
                session_quality: base.session_quality + 1.0,
                ..base
            },
        ] {
            assert!(score_fvg(&g, Session::Am, &bump) >= score);
        }
    }
}
