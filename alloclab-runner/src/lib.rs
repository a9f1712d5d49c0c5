//! AllocLab Runner: the driver that feeds price windows to a strategy.
//!
//! This crate builds on `alloclab-core` to provide:
//! - Bar loading from per-ticker CSV files, with a synthetic fallback
//! - Multi-ticker timeline assembly
//! - The replay loop with halt/skip error policy
//! - Replay config files and deterministic run IDs
//! - JSON/CSV export of decisions

pub mod config;
pub mod data_loader;
pub mod export;
pub mod replay;
pub mod runner;
pub mod timeline;

pub use config::{ConfigError, ReplayConfig, ReplaySettings, RunId};
pub use data_loader::{load_bars, DataSource, LoadError, LoadOptions, LoadedData};
pub use export::{
    export_decisions_csv, export_json, generate_report, import_json, load_artifacts, save_artifacts,
};
pub use replay::{
    run_replay, Decision, ErrorPolicy, ReplayError, ReplayOptions, ReplayOutcome, ReplaySummary,
};
pub use runner::{run_replay_from_data, run_single_replay, ReplayResult, RunError};
pub use timeline::{build_timeline, Timeline};
