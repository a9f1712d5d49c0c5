//! Bars: the wire record a driver hands over, and the parsed form indicators use.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::parse_date;
use crate::error::StrategyError;

/// One day of data for one ticker, as supplied in a price window.
///
/// Only `date` and `close` are guaranteed. The date stays a string until a
/// strategy needs it, so a malformed date only fails the call that reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarRecord {
    pub date: String,
    pub close: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl BarRecord {
    /// Close-only record.
    pub fn close_only(date: impl Into<String>, close: f64) -> Self {
        Self {
            date: date.into(),
            close,
            open: None,
            high: None,
            low: None,
            volume: None,
        }
    }
}

/// OHLCV bar for a single symbol on a single day.
///
/// Fields missing from the source record are `NaN` (prices) or 0 (volume).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Parse a wire record. Fails only on a malformed date.
    pub fn from_record(symbol: &str, record: &BarRecord) -> Result<Self, StrategyError> {
        Ok(Self {
            symbol: symbol.to_string(),
            date: parse_date(&record.date)?,
            open: record.open.unwrap_or(f64::NAN),
            high: record.high.unwrap_or(f64::NAN),
            low: record.low.unwrap_or(f64::NAN),
            close: record.close,
            volume: record.volume.map(|v| v.max(0.0) as u64).unwrap_or(0),
        })
    }

    /// Back to the wire form. NaN prices are dropped.
    pub fn to_record(&self) -> BarRecord {
        let present = |v: f64| (!v.is_nan()).then_some(v);
        BarRecord {
            date: self.date.format(crate::calendar::DATE_FORMAT).to_string(),
            close: self.close,
            open: present(self.open),
            high: present(self.high),
            low: present(self.low),
            volume: Some(self.volume as f64),
        }
    }

    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}
