//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|), with the
//! first bar using high-low alone.
//! ATR uses Wilder smoothing (alpha = 1/period), seeded with the mean of the
//! first `period` true ranges. The first valid value sits at index
//! `period - 1`, so `period` bars are enough.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// Compute the True Range series from bars.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    true_range_hlc(bars.iter().map(|b| (b.high, b.low, b.close)))
}

/// True Range over raw `(high, low, close)` triples, oldest first.
///
/// Same definition as [`true_range`], for callers holding unparsed records.
pub fn true_range_hlc(hlc: impl IntoIterator<Item = (f64, f64, f64)>) -> Vec<f64> {
    let mut tr = Vec::new();
    let mut prev_close: Option<f64> = None;

    for (h, l, c) in hlc {
        let value = match prev_close {
            None => h - l,
            Some(pc) if h.is_nan() || l.is_nan() || pc.is_nan() => f64::NAN,
            Some(pc) => (h - l).max((h - pc).abs()).max((l - pc).abs()),
        };
        tr.push(value);
        prev_close = Some(c);
    }

    tr
}

/// Apply Wilder smoothing to a series. Alpha = 1/period.
///
/// Seed: mean of the first run of `period` consecutive non-NaN values.
/// A NaN after the seed taints every later output.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n < period || period == 0 {
        return result;
    }

    let seed_start = (0..=n - period).find(|&i| values[i..i + period].iter().all(|v| !v.is_nan()));
    let Some(seed_start) = seed_start else {
        return result;
    };
    let seed_end = seed_start + period;

    let seed: f64 = values[seed_start..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = seed;

    let alpha = 1.0 / period as f64;
    let mut prev = seed;

    for i in seed_end..n {
        if values[i].is_nan() {
            return result;
        }
        let smoothed = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = smoothed;
        prev = smoothed;
    }

    result
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        wilder_smooth(&true_range(bars), self.period)
    }
}

/// Latest ATR value, or `None` when history is too short or the value is NaN.
pub fn latest_atr(bars: &[Bar], period: usize) -> Option<f64> {
    latest_atr_hlc(bars.iter().map(|b| (b.high, b.low, b.close)), period)
}

/// [`latest_atr`] over raw `(high, low, close)` triples, oldest first.
pub fn latest_atr_hlc(
    hlc: impl IntoIterator<Item = (f64, f64, f64)>,
    period: usize,
) -> Option<f64> {
    if period == 0 {
        return None;
    }
    let tr = true_range_hlc(hlc);
    if tr.len() < period {
        return None;
    }
    wilder_smooth(&tr, period)
        .last()
        .copied()
        .filter(|v| !v.is_nan())
}
