//! Multi-ticker timeline assembly.
//!
//! Given bars for several tickers, build one daily record per date in the
//! union of their dates. A ticker with no bar on a date is simply absent
//! from that record; nothing is forward-filled.

use alloclab_core::domain::{Bar, BarRecord, PriceWindow};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Daily records on a common date axis.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    /// The common date axis (sorted ascending).
    pub dates: Vec<NaiveDate>,
    /// One record per entry in `dates`.
    pub records: Vec<BTreeMap<String, BarRecord>>,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Window ending at record `index` (inclusive).
    ///
    /// `window_size == 0` returns every record up to `index`.
    pub fn window_at(&self, index: usize, window_size: usize) -> PriceWindow {
        let end = (index + 1).min(self.records.len());
        let start = if window_size == 0 {
            0
        } else {
            end.saturating_sub(window_size)
        };
        PriceWindow::new(self.records[start..end].to_vec())
    }
}

/// Align tickers onto the union of their dates.
pub fn build_timeline(bars: &BTreeMap<String, Vec<Bar>>) -> Timeline {
    let dates: Vec<NaiveDate> = bars
        .values()
        .flat_map(|series| series.iter().map(|b| b.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let by_date: BTreeMap<&str, BTreeMap<NaiveDate, &Bar>> = bars
        .iter()
        .map(|(symbol, series)| {
            (
                symbol.as_str(),
                series.iter().map(|b| (b.date, b)).collect(),
            )
        })
        .collect();

    let records = dates
        .iter()
        .map(|date| {
            by_date
                .iter()
                .filter_map(|(symbol, lookup)| {
                    lookup.get(date).map(|bar| (symbol.to_string(), bar.to_record()))
                })
                .collect()
        })
        .collect();

    Timeline { dates, records }
}
