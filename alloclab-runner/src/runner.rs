//! Single-replay runner: config → load → timeline → replay → result.

use alloclab_core::domain::Interval;
use alloclab_core::strategy::{build_strategy, Strategy};
use alloclab_core::StrategyConfig;
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, ReplayConfig, RunId};
use crate::data_loader::{load_bars, LoadError, LoadOptions, LoadedData};
use crate::replay::{run_replay, Decision, ReplayError, ReplaySummary, SkippedDecision};
use crate::timeline::build_timeline;

/// Current result schema version. Bump on breaking changes to `ReplayResult`.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Strategy(#[from] alloclab_core::ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Replay(#[from] ReplayError),
}

/// Everything a replay produced, ready for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayResult {
    pub schema_version: u32,
    pub run_id: RunId,
    pub strategy: String,
    pub strategy_config: StrategyConfig,
    pub interval: Interval,
    pub assets: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// History bars loaded before `start_date`; no decisions on them.
    #[serde(default)]
    pub warmup_bars: usize,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub decisions: Vec<Decision>,
    pub skipped: Vec<SkippedDecision>,
    pub summary: ReplaySummary,
}

/// Tickers the driver must load for `strategy`.
///
/// Declared data descriptors win; otherwise the traded assets.
pub fn required_tickers(strategy: &dyn Strategy) -> Vec<String> {
    let data = strategy.data();
    if data.is_empty() {
        strategy.assets().to_vec()
    } else {
        data.into_iter().map(|a| a.ticker).collect()
    }
}

/// Load data per `config` and replay its strategy over it.
pub fn run_single_replay(config: &ReplayConfig) -> Result<ReplayResult, RunError> {
    config.validate()?;
    let strategy = build_strategy(&config.strategy)?;
    let opts = LoadOptions {
        start: config.replay.start_date,
        end: config.replay.end_date,
        data_dir: config.replay.data_dir.clone(),
        synthetic: config.replay.synthetic,
        warmup_bars: config.warmup_bars(),
    };
    let loaded = load_bars(&required_tickers(strategy.as_ref()), &opts)?;
    run_replay_from_data(config, strategy, &loaded)
}

/// Replay an already-built strategy over already-loaded bars.
pub fn run_replay_from_data(
    config: &ReplayConfig,
    mut strategy: Box<dyn Strategy>,
    loaded: &LoadedData,
) -> Result<ReplayResult, RunError> {
    let timeline = build_timeline(&loaded.bars);
    info!(
        "replaying {} over {} dates ({} tickers, {} warm-up bars)",
        strategy.name(),
        timeline.len(),
        loaded.bars.len(),
        config.warmup_bars()
    );

    let outcome = run_replay(strategy.as_mut(), &timeline, &config.replay_options())?;

    info!(
        "{}: {} decisions, {} cash days, {} changes, {} skipped",
        strategy.name(),
        outcome.summary.decisions,
        outcome.summary.cash_days,
        outcome.summary.changes,
        outcome.skipped.len()
    );

    Ok(ReplayResult {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(&loaded.dataset_hash),
        strategy: strategy.name().to_string(),
        strategy_config: config.strategy.clone(),
        interval: strategy.interval(),
        assets: strategy.assets().to_vec(),
        start_date: config.replay.start_date,
        end_date: config.replay.end_date,
        warmup_bars: config.warmup_bars(),
        dataset_hash: loaded.dataset_hash.clone(),
        has_synthetic: loaded.has_synthetic,
        decisions: outcome.decisions,
        skipped: outcome.skipped,
        summary: outcome.summary,
    })
}
