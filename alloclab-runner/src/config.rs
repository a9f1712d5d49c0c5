//! Replay configuration: date range, data source, driver policy, strategy.

use alloclab_core::StrategyConfig;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::replay::{ErrorPolicy, ReplayOptions};

/// Unique identifier for a replay run (content hash of config + dataset).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid strategy section: {0}")]
    Strategy(#[from] alloclab_core::ConfigError),

    #[error("start_date {start} is after end_date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

/// Top-level replay config file.
///
/// ```toml
/// [replay]
/// start_date = "2023-01-01"
/// end_date = "2023-12-31"
///
/// [strategy]
/// type = "volatility_gate"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplayConfig {
    pub replay: ReplaySettings,
    pub strategy: StrategyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplaySettings {
    /// First date handed to the strategy (inclusive).
    pub start_date: NaiveDate,
    /// Last date handed to the strategy (inclusive).
    pub end_date: NaiveDate,
    /// Directory holding `<TICKER>.csv` files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Generate deterministic random-walk bars instead of reading CSV.
    #[serde(default)]
    pub synthetic: bool,
    /// Trailing records per call; 0 passes the full history so far.
    #[serde(default)]
    pub window_size: usize,
    #[serde(default)]
    pub on_error: ErrorPolicy,
    /// Bars loaded before `start_date` as history only. Unset means the
    /// strategy's own requirement (`StrategyConfig::warmup_bars`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup_bars: Option<usize>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl ReplayConfig {
    /// Config for a stock strategy over a date range, reading from `./data`.
    pub fn new(strategy: StrategyConfig, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            replay: ReplaySettings {
                start_date,
                end_date,
                data_dir: default_data_dir(),
                synthetic: false,
                window_size: 0,
                on_error: ErrorPolicy::default(),
                warmup_bars: None,
            },
            strategy,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.replay.start_date > self.replay.end_date {
            return Err(ConfigError::InvalidDateRange {
                start: self.replay.start_date,
                end: self.replay.end_date,
            });
        }
        self.strategy.validate()?;
        Ok(())
    }

    /// Effective warm-up length: the explicit setting, else what the
    /// strategy asks for.
    pub fn warmup_bars(&self) -> usize {
        self.replay
            .warmup_bars
            .unwrap_or_else(|| self.strategy.warmup_bars())
    }

    pub fn replay_options(&self) -> ReplayOptions {
        ReplayOptions {
            window_size: self.replay.window_size,
            on_error: self.replay.on_error,
            first_decision: Some(self.replay.start_date),
        }
    }

    /// Deterministic run ID over this config and the dataset it ran on.
    ///
    /// Two runs with identical configs on identical data share an ID.
    pub fn run_id(&self, dataset_hash: &str) -> RunId {
        let mut hasher = blake3::Hasher::new();
        // serde_json keeps struct field order, so the encoding is stable
        if let Ok(json) = serde_json::to_string(self) {
            hasher.update(json.as_bytes());
        }
        hasher.update(dataset_hash.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[replay]
start_date = "2023-01-01"
end_date = "2023-12-31"
synthetic = true
on_error = "skip"

[strategy]
type = "volatility_gate"
tickers = ["SPY", "QQQ"]
"#;

    #[test]
    fn parses_sample() {
        let cfg = ReplayConfig::from_toml(SAMPLE).unwrap();
        assert!(cfg.replay.synthetic);
        assert_eq!(cfg.replay.data_dir, PathBuf::from("data"));
        assert_eq!(cfg.replay.window_size, 0);
        assert_eq!(cfg.replay.on_error, ErrorPolicy::Skip);
        assert_eq!(cfg.strategy.type_name(), "volatility_gate");
    }

    #[test]
    fn rejects_inverted_range() {
        let text = SAMPLE.replace("2023-01-01", "2024-06-01");
        assert!(matches!(
            ReplayConfig::from_toml(&text),
            Err(ConfigError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn rejects_bad_strategy_section() {
        let text = SAMPLE.replace(r#"["SPY", "QQQ"]"#, r#"["SPY", "SPY"]"#);
        assert!(matches!(
            ReplayConfig::from_toml(&text),
            Err(ConfigError::Strategy(_))
        ));
    }

    #[test]
    fn warmup_defaults_to_strategy_and_can_be_overridden() {
        let cfg = ReplayConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(cfg.replay.warmup_bars, None);
        assert_eq!(cfg.warmup_bars(), 13);

        let text = SAMPLE.replace("on_error = \"skip\"", "on_error = \"skip\"\nwarmup_bars = 40");
        assert_eq!(ReplayConfig::from_toml(&text).unwrap().warmup_bars(), 40);
    }

    #[test]
    fn run_id_depends_on_config_and_data() {
        let cfg = ReplayConfig::from_toml(SAMPLE).unwrap();
        let a = cfg.run_id("dataset-a");
        assert_eq!(a, cfg.run_id("dataset-a"));
        assert_ne!(a, cfg.run_id("dataset-b"));

        let mut other = cfg.clone();
        other.replay.window_size = 30;
        assert_ne!(a, other.run_id("dataset-a"));
    }
}
