//! Volatility gate: equal weight across the tickers, full cash for a
//! cooldown whenever one ticker's ATR% spikes.
//!
//! Tickers are checked in order and the first one over the threshold ends
//! the call. Tickers after it are not evaluated at all.

use chrono::NaiveDate;
use log::{debug, info};

use super::Strategy;
use crate::calendar::{days_between, parse_date};
use crate::domain::{PriceWindow, TargetAllocation};
use crate::error::StrategyError;
use crate::indicators::latest_atr_hlc;

pub const DEFAULT_TICKERS: [&str; 2] = ["SPY", "QQQ"];
pub const DEFAULT_CASH_HOLD_DAYS: i64 = 10;
pub const DEFAULT_ATR_PERIOD: usize = 14;
pub const DEFAULT_MAX_VOLATILITY_PCT: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct VolatilityGate {
    tickers: Vec<String>,
    cash_hold_days: i64,
    atr_period: usize,
    max_volatility_pct: f64,
    /// Date of the most recent volatility-triggered switch to cash.
    last_cash_switch: NaiveDate,
}

impl VolatilityGate {
    /// SPY / QQQ, 10-day cooldown, ATR(14), 10% threshold.
    pub fn new() -> Self {
        Self {
            tickers: DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect(),
            cash_hold_days: DEFAULT_CASH_HOLD_DAYS,
            atr_period: DEFAULT_ATR_PERIOD,
            max_volatility_pct: DEFAULT_MAX_VOLATILITY_PCT,
            last_cash_switch: NaiveDate::MIN,
        }
    }

    pub fn with_tickers<S: Into<String>>(mut self, tickers: impl IntoIterator<Item = S>) -> Self {
        self.tickers = tickers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cash_hold_days(mut self, days: i64) -> Self {
        self.cash_hold_days = days;
        self
    }

    /// # Panics
    ///
    /// Panics if `period` is 0. `StrategyConfig::validate` rejects that
    /// value before the factory gets here.
    pub fn with_atr_period(mut self, period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        self.atr_period = period;
        self
    }

    pub fn with_max_volatility_pct(mut self, pct: f64) -> Self {
        self.max_volatility_pct = pct;
        self
    }

    /// Start as if a cash switch already happened on `date`.
    pub fn with_last_cash_switch(mut self, date: NaiveDate) -> Self {
        self.last_cash_switch = date;
        self
    }

    pub fn last_cash_switch(&self) -> NaiveDate {
        self.last_cash_switch
    }

    pub fn cash_hold_days(&self) -> i64 {
        self.cash_hold_days
    }

    /// True while `date` is within `cash_hold_days` of the last switch.
    pub fn in_cooldown(&self, date: NaiveDate) -> bool {
        days_between(self.last_cash_switch, date) <= self.cash_hold_days
    }

    /// Latest ATR as a percentage of the latest close.
    ///
    /// Reads high/low/close straight from the records; bar dates are not
    /// parsed. `None` when the ATR is unavailable or the close is not
    /// positive.
    pub fn volatility_pct(&self, window: &PriceWindow, ticker: &str) -> Option<f64> {
        let hlc = window.records_for(ticker).map(|r| {
            (
                r.high.unwrap_or(f64::NAN),
                r.low.unwrap_or(f64::NAN),
                r.close,
            )
        });
        let atr = latest_atr_hlc(hlc, self.atr_period)?;
        match window.latest(ticker).map(|r| r.close) {
            Some(close) if close > 0.0 => Some(atr / close * 100.0),
            _ => None,
        }
    }

    fn equal_weight(&self) -> f64 {
        1.0 / self.tickers.len() as f64
    }
}

impl Default for VolatilityGate {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for VolatilityGate {
    fn name(&self) -> &str {
        "volatility_gate"
    }

    fn assets(&self) -> &[String] {
        &self.tickers
    }

    fn run(&mut self, window: &PriceWindow) -> Result<TargetAllocation, StrategyError> {
        let Some(latest) = self.tickers.first().and_then(|t| window.latest(t)) else {
            return Ok(TargetAllocation::cash());
        };
        let current = parse_date(&latest.date)?;

        if self.in_cooldown(current) {
            debug!(
                "{current}: in cash cooldown since {}",
                self.last_cash_switch
            );
            return Ok(TargetAllocation::cash());
        }

        let weight = self.equal_weight();
        let mut alloc = TargetAllocation::cash();
        for ticker in &self.tickers {
            let Some(vol_pct) = self.volatility_pct(window, ticker) else {
                debug!("{current}: {ticker} volatility unavailable, weight 0");
                alloc.set(ticker.as_str(), 0.0);
                continue;
            };

            if vol_pct > self.max_volatility_pct {
                info!(
                    "{current}: {ticker} ATR {vol_pct:.2}% > {}%, switching to cash",
                    self.max_volatility_pct
                );
                self.last_cash_switch = current;
                return Ok(TargetAllocation::cash());
            }
            alloc.set(ticker.as_str(), weight);
        }

        Ok(alloc)
    }
}
