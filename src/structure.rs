//! Market structure detectors: swing pivots, liquidity sweeps, breaks of structure
//!
//! All three operate on a finished, ascending bar batch and return their
//! findings as plain collections. Degenerate input (too few bars, no pivots)
//! yields empty results.

use crate::bars::Bar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Bars required on each side of a pivot candidate
const PIVOT_WING: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PivotKind {
    High,
    Low,
}

impl std::fmt::Display for PivotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PivotKind::High => write!(f, "high"),
            PivotKind::Low => write!(f, "low"),
        }
    }
}

/// A confirmed swing extreme: strictly beyond both neighbors on each side
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pivot {
    pub index: usize,
    pub price: f64,
    pub kind: PivotKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakDirection {
    Bullish,
    Bearish,
}

impl std::fmt::Display for BreakDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakDirection::Bullish => write!(f, "bullish"),
            BreakDirection::Bearish => write!(f, "bearish"),
        }
    }
}

/// A close beyond an armed pivot plus the volatility buffer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BosEvent {
    pub index: usize,
    pub direction: BreakDirection,
    /// Price of the pivot this close broke through
    pub pivot_price: f64,
}

/// Detect swing pivots over a 5-bar window
///
/// A high pivot's high strictly exceeds the highs of the two bars on each
/// side; low pivots mirror with lows. One bar can emit both kinds when its
/// range dominates both neighbor pairs. Fewer than 5 bars yields nothing.
pub fn detect_pivots(bars: &[Bar]) -> Vec<Pivot> {
    let mut pivots = Vec::new();
    if bars.len() < 2 * PIVOT_WING + 1 {
        return pivots;
    }

    for i in PIVOT_WING..bars.len() - PIVOT_WING {
        let high = bars[i].high;
        let low = bars[i].low;

        if high > bars[i - 1].high
            && high > bars[i - 2].high
            && high > bars[i + 1].high
            && high > bars[i + 2].high
        {
            pivots.push(Pivot {
                index: i,
                price: high,
                kind: PivotKind::High,
            });
        }

        if low < bars[i - 1].low
            && low < bars[i - 2].low
            && low < bars[i + 1].low
            && low < bars[i + 2].low
        {
            pivots.push(Pivot {
                index: i,
                price: low,
                kind: PivotKind::Low,
            });
        }
    }

    pivots
}

/// Detect bars that swept a prior pivot: wick beyond it, close back inside
///
/// Pivots are scanned in creation order and the first match per side wins.
/// Quadratic in the worst case (bars x pivots); fine for intraday batches.
/// Returns deduplicated ascending bar indices.
pub fn detect_sweeps(bars: &[Bar], pivots: &[Pivot]) -> Vec<usize> {
    let pivot_highs: Vec<&Pivot> = pivots.iter().filter(|p| p.kind == PivotKind::High).collect();
    let pivot_lows: Vec<&Pivot> = pivots.iter().filter(|p| p.kind == PivotKind::Low).collect();

    let mut indices = BTreeSet::new();

    for (i, bar) in bars.iter().enumerate().skip(1) {
        for p in &pivot_highs {
            if i <= p.index {
                continue;
            }
            if bar.high > p.price && bar.close < p.price {
                indices.insert(i);
                break;
            }
        }
        for p in &pivot_lows {
            if i <= p.index {
                continue;
            }
            if bar.low < p.price && bar.close > p.price {
                indices.insert(i);
                break;
            }
        }
    }

    indices.into_iter().collect()
}

/// One side of the break-of-structure state machine
#[derive(Debug, Clone, Copy)]
enum ArmedSlot {
    Armed { index: usize, price: f64 },
    Consumed,
}

impl ArmedSlot {
    fn is_consumed(&self) -> bool {
        matches!(self, ArmedSlot::Consumed)
    }
}

/// Detect breaks of structure against the last pivot of each kind
///
/// Both slots are seeded once from the full pivot list and never re-armed:
/// at most one bullish and one bearish event per scan. A close must clear
/// the pivot by `atr * buffer_mult`; bars with no ATR are skipped. The
/// breaking bar is always strictly after the pivot it consumes.
pub fn detect_breaks(bars: &[Bar], pivots: &[Pivot], buffer_mult: f64) -> Vec<BosEvent> {
    let mut armed_high = ArmedSlot::Consumed;
    let mut armed_low = ArmedSlot::Consumed;

    for p in pivots {
        let slot = ArmedSlot::Armed {
            index: p.index,
            price: p.price,
        };
        match p.kind {
            PivotKind::High => armed_high = slot,
            PivotKind::Low => armed_low = slot,
        }
    }

    let mut events = Vec::new();

    for (i, bar) in bars.iter().enumerate() {
        if armed_high.is_consumed() && armed_low.is_consumed() {
            break;
        }

        let Some(atr) = bar.atr else {
            continue;
        };
        let buffer = atr * buffer_mult;

        if let ArmedSlot::Armed { index, price } = armed_high {
            if i > index && bar.close > price + buffer {
                events.push(BosEvent {
                    index: i,
                    direction: BreakDirection::Bullish,
                    pivot_price: price,
                });
                armed_high = ArmedSlot::Consumed;
            }
        }

        if let ArmedSlot::Armed { index, price } = armed_low {
            if i > index && bar.close < price - buffer {
                events.push(BosEvent {
                    index: i,
                    direction: BreakDirection::Bearish,
                    pivot_price: price,
                });
                armed_low = ArmedSlot::Consumed;
            }
        }
    }

    events
}
