//! Replay loop: the scheduler that calls a strategy once per date.
//!
//! For each date on the timeline the strategy receives the trailing window
//! ending on that date and returns an allocation. A failed call either
//! halts the replay or is logged and skipped, per `ErrorPolicy`.

use alloclab_core::domain::TargetAllocation;
use alloclab_core::error::StrategyError;
use alloclab_core::strategy::Strategy;
use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::timeline::Timeline;

/// What the driver does when a decision call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop and return the error.
    #[default]
    Halt,
    /// Log, record the date as skipped, move on.
    Skip,
}

#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Trailing records per call; 0 passes the full history so far.
    pub window_size: usize,
    pub on_error: ErrorPolicy,
    /// Dates before this are warm-up history: they appear in windows but the
    /// strategy is not called on them. `None` decides on every date.
    pub first_decision: Option<NaiveDate>,
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("decision on {date} failed: {source}")]
    Strategy {
        date: NaiveDate,
        #[source]
        source: StrategyError,
    },
}

/// One decision call's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub date: NaiveDate,
    pub allocation: TargetAllocation,
}

/// A date the driver skipped after a failed call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDecision {
    pub date: NaiveDate,
    pub reason: String,
}

/// Aggregate counts over a replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub decisions: usize,
    /// Decisions with no positive weight.
    pub cash_days: usize,
    /// Days each ticker held a positive weight.
    pub days_held: BTreeMap<String, usize>,
    /// Times the allocation differed from the previous decision.
    pub changes: usize,
}

impl ReplaySummary {
    pub fn from_decisions(decisions: &[Decision]) -> Self {
        let mut summary = Self {
            decisions: decisions.len(),
            ..Self::default()
        };
        let mut prev: Option<&TargetAllocation> = None;
        for d in decisions {
            let mut held = false;
            for (ticker, weight) in d.allocation.iter() {
                if weight > 0.0 {
                    held = true;
                    *summary.days_held.entry(ticker.to_string()).or_default() += 1;
                }
            }
            if !held {
                summary.cash_days += 1;
            }
            if prev.is_some_and(|p| p != &d.allocation) {
                summary.changes += 1;
            }
            prev = Some(&d.allocation);
        }
        summary
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReplayOutcome {
    pub decisions: Vec<Decision>,
    pub skipped: Vec<SkippedDecision>,
    pub summary: ReplaySummary,
}

/// Drive `strategy` across every date of `timeline`.
pub fn run_replay(
    strategy: &mut dyn Strategy,
    timeline: &Timeline,
    opts: &ReplayOptions,
) -> Result<ReplayOutcome, ReplayError> {
    let mut decisions = Vec::with_capacity(timeline.len());
    let mut skipped = Vec::new();

    for (i, &date) in timeline.dates.iter().enumerate() {
        if opts.first_decision.is_some_and(|first| date < first) {
            continue;
        }
        let window = timeline.window_at(i, opts.window_size);
        match strategy.run(&window) {
            Ok(allocation) => {
                debug!("{} {date}: {:?}", strategy.name(), allocation.as_map());
                decisions.push(Decision { date, allocation });
            }
            Err(source) => match opts.on_error {
                ErrorPolicy::Halt => return Err(ReplayError::Strategy { date, source }),
                ErrorPolicy::Skip => {
                    warn!("{} {date}: skipping interval: {source}", strategy.name());
                    skipped.push(SkippedDecision {
                        date,
                        reason: source.to_string(),
                    });
                }
            },
        }
    }

    let summary = ReplaySummary::from_decisions(&decisions);
    Ok(ReplayOutcome {
        decisions,
        skipped,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloclab_core::domain::BarRecord;
    use alloclab_core::strategy::MomentumRotation;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, day).unwrap()
    }

    fn timeline(rows: &[(NaiveDate, &str, f64)]) -> Timeline {
        let mut tl = Timeline::default();
        for (date, label, spy) in rows {
            let rec = [
                ("SPY".to_string(), BarRecord::close_only(*label, *spy)),
                ("TSLA".to_string(), BarRecord::close_only(*label, 150.0)),
            ]
            .into_iter()
            .collect();
            tl.dates.push(*date);
            tl.records.push(rec);
        }
        tl
    }

    #[test]
    fn one_decision_per_date() {
        let tl = timeline(&[
            (d(1, 30), "2023-01-30", 100.0),
            (d(1, 31), "2023-01-31", 105.0),
            (d(2, 1), "2023-02-01", 104.0),
        ]);
        let mut strat = MomentumRotation::new();
        let out = run_replay(&mut strat, &tl, &ReplayOptions::default()).unwrap();
        assert_eq!(out.decisions.len(), 3);
        assert_eq!(out.decisions[1].allocation, TargetAllocation::all_in("TSLA"));
        assert_eq!(out.summary.days_held["SPY"], 2);
        assert_eq!(out.summary.days_held["TSLA"], 1);
        assert_eq!(out.summary.changes, 2);
        assert_eq!(out.summary.cash_days, 0);
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn halt_policy_returns_first_error() {
        let tl = timeline(&[
            (d(1, 30), "2023-01-30", 100.0),
            (d(1, 31), "31/01/2023", 105.0),
            (d(2, 1), "2023-02-01", 104.0),
        ]);
        let mut strat = MomentumRotation::new();
        let err = run_replay(&mut strat, &tl, &ReplayOptions::default()).unwrap_err();
        let ReplayError::Strategy { date, .. } = err;
        assert_eq!(date, d(1, 31));
    }

    #[test]
    fn skip_policy_continues() {
        let tl = timeline(&[
            (d(1, 30), "2023-01-30", 100.0),
            (d(1, 31), "31/01/2023", 105.0),
            (d(2, 1), "2023-02-01", 104.0),
        ]);
        let mut strat = MomentumRotation::new();
        let opts = ReplayOptions {
            on_error: ErrorPolicy::Skip,
            ..ReplayOptions::default()
        };
        let out = run_replay(&mut strat, &tl, &opts).unwrap();
        assert_eq!(out.decisions.len(), 2);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].date, d(1, 31));
        assert!(out.skipped[0].reason.contains("31/01/2023"));
    }

    #[test]
    fn warmup_dates_feed_history_without_decisions() {
        let tl = timeline(&[
            (d(1, 27), "2023-01-27", 90.0),
            (d(1, 30), "2023-01-30", 100.0),
            (d(1, 31), "2023-01-31", 105.0),
        ]);
        let mut strat = MomentumRotation::new();
        let opts = ReplayOptions {
            first_decision: Some(d(1, 30)),
            ..ReplayOptions::default()
        };
        let out = run_replay(&mut strat, &tl, &opts).unwrap();
        assert_eq!(out.decisions.len(), 2);
        assert_eq!(out.decisions[0].date, d(1, 30));
        // Entry is captured on the first decision date, not during warm-up
        assert_eq!(strat.entry_price(), Some(100.0));
        assert_eq!(out.decisions[1].allocation, TargetAllocation::all_in("TSLA"));
    }

    #[test]
    fn summary_counts_cash() {
        let decisions = vec![
            Decision {
                date: d(1, 2),
                allocation: TargetAllocation::cash(),
            },
            Decision {
                date: d(1, 3),
                allocation: [("SPY", 0.0), ("QQQ", 0.0)].into_iter().collect(),
            },
            Decision {
                date: d(1, 4),
                allocation: [("SPY", 0.5), ("QQQ", 0.5)].into_iter().collect(),
            },
        ];
        let s = ReplaySummary::from_decisions(&decisions);
        assert_eq!(s.cash_days, 2);
        assert_eq!(s.days_held["QQQ"], 1);
        assert_eq!(s.changes, 2);
    }
}
