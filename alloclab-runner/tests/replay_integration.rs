//! Integration tests for the runner: both stock strategies on the
//! Q1 2023 CSV fixtures.
//!
//! Fixtures (weekdays 2023-01-02 .. 2023-03-31):
//! - SPY rises 0.20 per day from 100, range ±1
//! - TSLA oscillates around 150, range ±3
//! - QQQ is flat at 50 with range ±0.5, except ±15 on 2023-02-13 .. 02-17

use alloclab_core::domain::TargetAllocation;
use alloclab_core::StrategyConfig;
use alloclab_runner::config::ReplayConfig;
use alloclab_runner::export::{export_decisions_csv, export_json, import_json};
use alloclab_runner::replay::ErrorPolicy;
use alloclab_runner::runner::run_single_replay;
use chrono::NaiveDate;
use std::path::PathBuf;

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn d(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, m, day).unwrap()
}

fn config(strategy: StrategyConfig) -> ReplayConfig {
    let mut cfg = ReplayConfig::new(strategy, d(1, 1), d(3, 31));
    cfg.replay.data_dir = fixture_dir();
    cfg
}

#[test]
fn momentum_rotation_rotates_on_each_month_end() {
    let result = run_single_replay(&config(StrategyConfig::momentum_rotation())).unwrap();

    assert_eq!(result.decisions.len(), 65);
    assert!(!result.has_synthetic);

    let rotated: Vec<NaiveDate> = result
        .decisions
        .iter()
        .filter(|dec| dec.allocation == TargetAllocation::all_in("TSLA"))
        .map(|dec| dec.date)
        .collect();
    assert_eq!(rotated, vec![d(1, 31), d(2, 28), d(3, 31)]);

    assert_eq!(result.summary.days_held["SPY"], 62);
    assert_eq!(result.summary.days_held["TSLA"], 3);
    assert_eq!(result.summary.cash_days, 0);
    // into TSLA and back out twice, plus the final rotation
    assert_eq!(result.summary.changes, 5);
}

#[test]
fn volatility_gate_goes_to_cash_on_qqq_spike() {
    let result = run_single_replay(&config(StrategyConfig::volatility_gate())).unwrap();
    let equal: TargetAllocation = [("SPY", 0.5), ("QQQ", 0.5)].into_iter().collect();
    let warmup: TargetAllocation = [("SPY", 0.0), ("QQQ", 0.0)].into_iter().collect();
    let cash = TargetAllocation::cash();

    for dec in &result.decisions {
        let expected = if dec.date < d(1, 19) {
            // fixtures start on 01-02, so there is no earlier history to warm up on
            &warmup
        } else if dec.date >= d(2, 15) && dec.date <= d(3, 9) {
            // tripped on 02-15, re-tripped when the cooldown lapsed on 02-27
            &cash
        } else {
            &equal
        };
        assert_eq!(&dec.allocation, expected, "on {}", dec.date);
    }
    assert_eq!(result.summary.cash_days, 13 + 17);
}

#[test]
fn mid_range_start_warms_up_on_earlier_bars() {
    let mut cfg = config(StrategyConfig::volatility_gate());
    cfg.replay.start_date = d(2, 1);
    cfg.replay.end_date = d(2, 28);
    let result = run_single_replay(&cfg).unwrap();

    assert_eq!(result.warmup_bars, 13);
    assert_eq!(result.decisions.len(), 20);
    let first = &result.decisions[0];
    assert_eq!(first.date, d(2, 1));
    assert_eq!(first.allocation.weight("SPY"), Some(0.5));
    assert_eq!(first.allocation.weight("QQQ"), Some(0.5));
    // Only the spike cooldown (02-15 .. 02-28) is cash
    assert_eq!(result.summary.cash_days, 10);
}

#[test]
fn short_window_size_limits_history() {
    let mut cfg = config(StrategyConfig::volatility_gate());
    cfg.replay.window_size = 10;
    let result = run_single_replay(&cfg).unwrap();
    // ATR(14) never has enough bars in a 10-record window
    assert!(result
        .decisions
        .iter()
        .all(|dec| dec.allocation.weight("SPY") == Some(0.0)));
}

#[test]
fn config_file_round_trip_through_runner() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("replay.toml");
    std::fs::write(
        &path,
        format!(
            r#"
[replay]
start_date = "2023-02-01"
end_date = "2023-02-28"
data_dir = "{}"
on_error = "skip"

[strategy]
type = "momentum_rotation"
"#,
            fixture_dir().display()
        ),
    )
    .unwrap();

    let cfg = ReplayConfig::from_file(&path).unwrap();
    assert_eq!(cfg.replay.on_error, ErrorPolicy::Skip);
    let result = run_single_replay(&cfg).unwrap();
    assert_eq!(result.decisions.len(), 20);
    assert_eq!(
        result.decisions.last().unwrap().allocation,
        TargetAllocation::all_in("TSLA")
    );

    let back = import_json(&export_json(&result).unwrap()).unwrap();
    assert_eq!(back.run_id, result.run_id);

    let csv = export_decisions_csv(&result.decisions).unwrap();
    assert_eq!(csv.lines().count(), 21);
}

#[test]
fn saved_artifacts_load_back_from_the_crate_root() {
    let result = run_single_replay(&config(StrategyConfig::volatility_gate())).unwrap();
    let out = tempfile::tempdir().unwrap();
    let run_dir = alloclab_runner::save_artifacts(&result, out.path()).unwrap();

    let loaded = alloclab_runner::load_artifacts(&run_dir).unwrap();
    assert_eq!(loaded.run_id, result.run_id);
    assert_eq!(loaded.decisions, result.decisions);
    assert_eq!(
        alloclab_runner::generate_report(&loaded),
        alloclab_runner::generate_report(&result)
    );
}

#[test]
fn missing_ticker_file_fails_the_run() {
    let cfg = config(StrategyConfig::MomentumRotation {
        benchmark: "SPY".into(),
        rotation: "ARKK".into(),
    });
    let err = run_single_replay(&cfg).unwrap_err();
    assert!(err.to_string().contains("ARKK"));
}

#[test]
fn run_id_is_stable_across_runs() {
    let cfg = config(StrategyConfig::volatility_gate());
    let a = run_single_replay(&cfg).unwrap();
    let b = run_single_replay(&cfg).unwrap();
    assert_eq!(a.run_id, b.run_id);
    assert_eq!(a.dataset_hash, b.dataset_hash);
}
