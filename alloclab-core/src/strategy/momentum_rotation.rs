//! Momentum rotation: hold the benchmark, rotate into the growth asset at
//! month end once the benchmark trades above its recorded entry price.

use log::{debug, info};

use super::Strategy;
use crate::calendar::is_end_of_month_str;
use crate::domain::{Asset, PriceWindow, TargetAllocation};
use crate::error::StrategyError;

pub const DEFAULT_BENCHMARK: &str = "SPY";
pub const DEFAULT_ROTATION: &str = "TSLA";

/// Benchmark / rotation-target pair with a one-shot entry price.
///
/// The first call that sees both tickers records the benchmark's close as
/// the entry price. It is never updated afterwards.
#[derive(Debug, Clone)]
pub struct MomentumRotation {
    /// `[benchmark, rotation]`
    tickers: [String; 2],
    entry_price: Option<f64>,
}

impl MomentumRotation {
    /// SPY benchmark, TSLA rotation target.
    pub fn new() -> Self {
        Self::with_tickers(DEFAULT_BENCHMARK, DEFAULT_ROTATION)
    }

    pub fn with_tickers(benchmark: impl Into<String>, rotation: impl Into<String>) -> Self {
        Self {
            tickers: [benchmark.into(), rotation.into()],
            entry_price: None,
        }
    }

    pub fn benchmark(&self) -> &str {
        &self.tickers[0]
    }

    pub fn rotation(&self) -> &str {
        &self.tickers[1]
    }

    /// Benchmark close captured on the first non-empty call.
    pub fn entry_price(&self) -> Option<f64> {
        self.entry_price
    }
}

impl Default for MomentumRotation {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for MomentumRotation {
    fn name(&self) -> &str {
        "momentum_rotation"
    }

    fn assets(&self) -> &[String] {
        &self.tickers
    }

    fn data(&self) -> Vec<Asset> {
        self.tickers.iter().map(Asset::new).collect()
    }

    fn run(&mut self, window: &PriceWindow) -> Result<TargetAllocation, StrategyError> {
        let Some(latest) = window.latest(self.benchmark()) else {
            return Ok(TargetAllocation::cash());
        };
        if !window.has_ticker(self.rotation()) {
            return Ok(TargetAllocation::cash());
        }

        let Some(entry) = self.entry_price else {
            info!(
                "{}: entry price set to {} on {}",
                self.benchmark(),
                latest.close,
                latest.date
            );
            self.entry_price = Some(latest.close);
            return Ok(TargetAllocation::all_in(self.benchmark()));
        };

        let month_end = is_end_of_month_str(&latest.date)?;
        let target = if month_end && latest.close > entry {
            self.rotation()
        } else {
            self.benchmark()
        };
        debug!(
            "{}: month_end={month_end} close={} entry={entry} -> {target}",
            latest.date, latest.close
        );
        Ok(TargetAllocation::all_in(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::closes_on;

    fn primed(entry: f64) -> MomentumRotation {
        let mut s = MomentumRotation::new();
        s.run(&closes_on("2023-01-02", &[("SPY", entry), ("TSLA", 120.0)]))
            .unwrap();
        s
    }

    #[test]
    fn accessors() {
        let s = MomentumRotation::new();
        assert_eq!(s.interval().as_str(), "1day");
        assert_eq!(s.assets(), &["SPY".to_string(), "TSLA".to_string()]);
        assert_eq!(s.data(), vec![Asset::new("SPY"), Asset::new("TSLA")]);
    }

    #[test]
    fn empty_window_returns_cash_and_keeps_state() {
        let mut s = MomentumRotation::new();
        let alloc = s.run(&PriceWindow::default()).unwrap();
        assert!(alloc.is_empty());
        assert_eq!(s.entry_price(), None);
    }

    #[test]
    fn missing_rotation_ticker_returns_cash() {
        let mut s = MomentumRotation::new();
        let alloc = s.run(&closes_on("2023-01-31", &[("SPY", 100.0)])).unwrap();
        assert!(alloc.is_empty());
        assert_eq!(s.entry_price(), None);
    }

    #[test]
    fn first_call_records_entry_and_buys_benchmark() {
        let mut s = MomentumRotation::new();
        // Month end and a huge rally do not matter on the first call
        let alloc = s
            .run(&closes_on("2023-01-31", &[("SPY", 100.0), ("TSLA", 150.0)]))
            .unwrap();
        assert_eq!(alloc, TargetAllocation::all_in("SPY"));
        assert_eq!(s.entry_price(), Some(100.0));
    }

    #[test]
    fn entry_price_is_never_updated() {
        let mut s = primed(100.0);
        s.run(&closes_on("2023-01-30", &[("SPY", 80.0), ("TSLA", 1.0)]))
            .unwrap();
        s.run(&closes_on("2023-01-31", &[("SPY", 130.0), ("TSLA", 1.0)]))
            .unwrap();
        assert_eq!(s.entry_price(), Some(100.0));
    }

    #[test]
    fn not_month_end_holds_benchmark() {
        let mut s = primed(100.0);
        let alloc = s
            .run(&closes_on("2023-01-30", &[("SPY", 500.0), ("TSLA", 1.0)]))
            .unwrap();
        assert_eq!(alloc, TargetAllocation::all_in("SPY"));
    }

    #[test]
    fn month_end_above_entry_rotates() {
        let mut s = primed(100.0);
        let alloc = s
            .run(&closes_on("2023-01-31", &[("SPY", 110.0), ("TSLA", 1.0)]))
            .unwrap();
        assert_eq!(alloc, TargetAllocation::all_in("TSLA"));
    }

    #[test]
    fn month_end_below_or_at_entry_holds_benchmark() {
        let mut s = primed(100.0);
        let below = s
            .run(&closes_on("2023-01-31", &[("SPY", 90.0), ("TSLA", 1.0)]))
            .unwrap();
        assert_eq!(below, TargetAllocation::all_in("SPY"));
        let equal = s
            .run(&closes_on("2023-01-31", &[("SPY", 100.0), ("TSLA", 1.0)]))
            .unwrap();
        assert_eq!(equal, TargetAllocation::all_in("SPY"));
    }

    #[test]
    fn repeated_hold_calls_are_idempotent() {
        let mut s = primed(100.0);
        let window = closes_on("2023-03-15", &[("SPY", 105.0), ("TSLA", 200.0)]);
        let first = s.run(&window).unwrap();
        let second = s.run(&window).unwrap();
        assert_eq!(first, second);
        assert_eq!(s.entry_price(), Some(100.0));
    }

    #[test]
    fn malformed_date_is_an_error_after_entry() {
        let mut s = primed(100.0);
        let result = s.run(&closes_on("2023/01/31", &[("SPY", 110.0), ("TSLA", 1.0)]));
        assert!(matches!(result, Err(StrategyError::InvalidDate { .. })));
    }

    #[test]
    fn custom_tickers() {
        let mut s = MomentumRotation::with_tickers("VTI", "ARKK");
        s.run(&closes_on("2023-05-01", &[("VTI", 200.0), ("ARKK", 40.0)]))
            .unwrap();
        let alloc = s
            .run(&closes_on("2023-05-31", &[("VTI", 210.0), ("ARKK", 41.0)]))
            .unwrap();
        assert_eq!(alloc, TargetAllocation::all_in("ARKK"));
    }
}
