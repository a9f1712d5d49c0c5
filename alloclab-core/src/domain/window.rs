//! Price window: the trailing bar history handed to a strategy on each call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::bar::{Bar, BarRecord};
use crate::error::StrategyError;

/// Ordered (oldest first) daily records, each mapping ticker → bar.
///
/// Wire shape: `{"ohlcv": [{"SPY": {...}, "QQQ": {...}}, ...]}`.
/// A record may omit a ticker that had no bar on that day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceWindow {
    pub ohlcv: Vec<BTreeMap<String, BarRecord>>,
}

impl PriceWindow {
    pub fn new(ohlcv: Vec<BTreeMap<String, BarRecord>>) -> Self {
        Self { ohlcv }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Number of daily records.
    pub fn len(&self) -> usize {
        self.ohlcv.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ohlcv.is_empty()
    }

    /// Push a new daily record at the end of the window.
    pub fn push(&mut self, record: BTreeMap<String, BarRecord>) {
        self.ohlcv.push(record);
    }

    /// The last `n` records (or the whole window if shorter).
    pub fn tail(&self, n: usize) -> PriceWindow {
        let start = self.ohlcv.len().saturating_sub(n);
        Self {
            ohlcv: self.ohlcv[start..].to_vec(),
        }
    }

    /// Every bar for `ticker`, oldest first, skipping records without it.
    pub fn records_for<'a>(&'a self, ticker: &'a str) -> impl Iterator<Item = &'a BarRecord> + 'a {
        self.ohlcv.iter().filter_map(move |rec| rec.get(ticker))
    }

    /// True if at least one record carries `ticker`.
    pub fn has_ticker(&self, ticker: &str) -> bool {
        self.records_for(ticker).next().is_some()
    }

    /// Most recent bar for `ticker`.
    pub fn latest(&self, ticker: &str) -> Option<&BarRecord> {
        self.ohlcv.iter().rev().find_map(|rec| rec.get(ticker))
    }

    /// Close prices for `ticker`, oldest first.
    pub fn closes(&self, ticker: &str) -> Vec<f64> {
        self.records_for(ticker).map(|r| r.close).collect()
    }

    /// Parsed bars for `ticker`, oldest first.
    pub fn bars(&self, ticker: &str) -> Result<Vec<Bar>, StrategyError> {
        self.records_for(ticker)
            .map(|r| Bar::from_record(ticker, r))
            .collect()
    }
}
