//! Static strategy metadata: trading interval and asset data descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bar interval a strategy trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1day")]
    OneDay,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneDay => "1day",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request for plain OHLCV data on one ticker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub ticker: String,
}

impl Asset {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asset({})", self.ticker)
    }
}
