//! Derived bar columns: ATR, relative volume, session VWAP and session labels
//!
//! Detectors never compute these themselves; they are attached to the bar
//! sequence up front so every downstream stage reads the same values.

use crate::bars::{Bar, Session};
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::America::New_York;

pub const DEFAULT_ATR_PERIOD: usize = 14;
pub const DEFAULT_RVOL_PERIOD: usize = 20;

/// Rolling average true range
///
/// True range uses the prior close (the bar's own close on the first bar),
/// averaged over `period` bars. Warm-up positions are None.
pub fn compute_atr(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let mut atr = vec![None; bars.len()];
    if period == 0 || bars.is_empty() {
        return atr;
    }

    let tr: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let prev_close = if i > 0 { bars[i - 1].close } else { bar.close };
            (bar.high - bar.low)
                .max((bar.high - prev_close).abs())
                .max((bar.low - prev_close).abs())
        })
        .collect();

    let mut window_sum = 0.0;
    for i in 0..tr.len() {
        window_sum += tr[i];
        if i >= period {
            window_sum -= tr[i - period];
        }
        if i + 1 >= period {
            atr[i] = Some(window_sum / period as f64);
        }
    }

    atr
}

/// Volume relative to its rolling mean over the trailing `period` bars
pub fn compute_rvol(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let mut rvol = vec![None; bars.len()];
    if period == 0 || bars.is_empty() {
        return rvol;
    }

    let mut window_sum = 0.0;
    for (i, bar) in bars.iter().enumerate() {
        window_sum += bar.volume;
        if i >= period {
            window_sum -= bars[i - period].volume;
        }
        if i + 1 >= period {
            let mean = window_sum / period as f64;
            if mean > 0.0 {
                rvol[i] = Some(bar.volume / mean);
            }
        }
    }

    rvol
}

/// Cumulative close*volume / volume, reset at each New York day boundary
pub fn session_vwap(bars: &[Bar]) -> Vec<Option<f64>> {
    let mut vwap = vec![None; bars.len()];
    let mut current_date = None;
    let mut cum_pv = 0.0;
    let mut cum_vol = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let date = bar.timestamp.with_timezone(&New_York).date_naive();
        if current_date != Some(date) {
            current_date = Some(date);
            cum_pv = 0.0;
            cum_vol = 0.0;
        }

        cum_pv += bar.close * bar.volume;
        cum_vol += bar.volume;

        if cum_vol > 0.0 {
            vwap[i] = Some(cum_pv / cum_vol);
        }
    }

    vwap
}

/// Session bucket for a bar timestamp (New York wall clock)
///
/// AM = [09:30, 11:00), LUNCH = [11:30, 13:00), PM = [13:30, 15:30),
/// everything else OTHER.
pub fn session_label(timestamp: DateTime<Utc>) -> Session {
    let et = timestamp.with_timezone(&New_York);
    let (h, m) = (et.hour(), et.minute());

    if (h > 9 || (h == 9 && m >= 30)) && h < 11 {
        Session::Am
    } else if (h > 11 || (h == 11 && m >= 30)) && h < 13 {
        Session::Lunch
    } else if (h > 13 || (h == 13 && m >= 30)) && (h < 15 || (h == 15 && m < 30)) {
        Session::Pm
    } else {
        Session::Other
    }
}

/// Keep only regular-session bars (09:30-16:00 ET, both ends inclusive)
pub fn filter_rth(bars: &[Bar]) -> Vec<Bar> {
    bars.iter()
        .filter(|bar| {
            let et = bar.timestamp.with_timezone(&New_York);
            let (h, m) = (et.hour(), et.minute());
            let after_open = h > 9 || (h == 9 && m >= 30);
            let before_close = h < 16 || (h == 16 && m == 0);
            after_open && before_close
        })
        .cloned()
        .collect()
}

/// Attach all derived columns to a bar sequence in place
pub fn enrich(bars: &mut [Bar], atr_period: usize, rvol_period: usize) {
    let atr = compute_atr(bars, atr_period);
    let rvol = compute_rvol(bars, rvol_period);
    let vwap = session_vwap(bars);

    for (i, bar) in bars.iter_mut().enumerate() {
        bar.atr = atr[i];
        bar.rvol = rvol[i];
        bar.vwap = vwap[i];
        bar.session = session_label(bar.timestamp);
    }
}
