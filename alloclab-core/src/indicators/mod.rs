//! Indicators: pure functions from bar history to a numeric series.
//!
//! Strategies compute what they need on each call from the window they are
//! handed. Nothing is cached between calls.

pub mod atr;

pub use atr::{latest_atr, latest_atr_hlc, true_range, true_range_hlc, wilder_smooth, Atr};

use crate::domain::Bar;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warmup).
///
/// No indicator value at bar t may depend on bars after t.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "atr_14").
    fn name(&self) -> &str;

    /// Number of leading NaN values before the first valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                symbol: "TEST".to_string(),
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
