//! Target allocation: the only output of a decision call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ticker → desired fraction of portfolio value.
///
/// Weights are expected in `[0, 1]`; nothing forces them to sum to 1.
/// An empty allocation means "hold cash / open nothing new".
///
/// Serializes as a plain JSON object, e.g. `{"QQQ":0.5,"SPY":0.5}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetAllocation(BTreeMap<String, f64>);

impl TargetAllocation {
    /// Empty allocation (cash).
    pub fn cash() -> Self {
        Self::default()
    }

    /// 100% in a single ticker.
    pub fn all_in(ticker: impl Into<String>) -> Self {
        let mut alloc = Self::default();
        alloc.set(ticker, 1.0);
        alloc
    }

    pub fn set(&mut self, ticker: impl Into<String>, weight: f64) {
        self.0.insert(ticker.into(), weight);
    }

    pub fn weight(&self, ticker: &str) -> Option<f64> {
        self.0.get(ticker).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> f64 {
        self.0.values().sum()
    }

    /// True if every weight lies in `[0, 1]`.
    pub fn weights_in_range(&self) -> bool {
        self.0.values().all(|w| (0.0..=1.0).contains(w))
    }

    /// Ticker holding the largest weight, if any weight is positive.
    pub fn dominant(&self) -> Option<&str> {
        self.0
            .iter()
            .filter(|(_, w)| **w > 0.0)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k.as_str())
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.0
    }

    pub fn into_inner(self) -> BTreeMap<String, f64> {
        self.0
    }
}

impl From<BTreeMap<String, f64>> for TargetAllocation {
    fn from(map: BTreeMap<String, f64>) -> Self {
        Self(map)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for TargetAllocation {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
