//! Serializable strategy configuration.
//!
//! Loaded from TOML; every field has a default reproducing the stock
//! strategy, so `type = "volatility_gate"` alone is a complete config.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::strategy::momentum_rotation::{DEFAULT_BENCHMARK, DEFAULT_ROTATION};
use crate::strategy::volatility_gate::{
    DEFAULT_ATR_PERIOD, DEFAULT_CASH_HOLD_DAYS, DEFAULT_MAX_VOLATILITY_PCT, DEFAULT_TICKERS,
};

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

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("strategy needs at least one ticker")]
    NoTickers,

    #[error("ticker '{0}' listed more than once")]
    DuplicateTicker(String),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParam { name: &'static str, reason: String },

    #[error("unknown preset '{0}' (expected momentum_rotation or volatility_gate)")]
    UnknownPreset(String),
}

/// Strategy selection plus parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    MomentumRotation {
        #[serde(default = "default_benchmark")]
        benchmark: String,
        #[serde(default = "default_rotation")]
        rotation: String,
    },
    VolatilityGate {
        #[serde(default = "default_gate_tickers")]
        tickers: Vec<String>,
        #[serde(default = "default_cash_hold_days")]
        cash_hold_days: i64,
        #[serde(default = "default_atr_period")]
        atr_period: usize,
        #[serde(default = "default_max_volatility_pct")]
        max_volatility_pct: f64,
    },
}

fn default_benchmark() -> String {
    DEFAULT_BENCHMARK.to_string()
}

fn default_rotation() -> String {
    DEFAULT_ROTATION.to_string()
}

fn default_gate_tickers() -> Vec<String> {
    DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect()
}

fn default_cash_hold_days() -> i64 {
    DEFAULT_CASH_HOLD_DAYS
}

fn default_atr_period() -> usize {
    DEFAULT_ATR_PERIOD
}

fn default_max_volatility_pct() -> f64 {
    DEFAULT_MAX_VOLATILITY_PCT
}

impl StrategyConfig {
    pub fn momentum_rotation() -> Self {
        Self::MomentumRotation {
            benchmark: default_benchmark(),
            rotation: default_rotation(),
        }
    }

    pub fn volatility_gate() -> Self {
        Self::VolatilityGate {
            tickers: default_gate_tickers(),
            cash_hold_days: default_cash_hold_days(),
            atr_period: default_atr_period(),
            max_volatility_pct: default_max_volatility_pct(),
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

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Strategy type name as used in the `type` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::MomentumRotation { .. } => "momentum_rotation",
            Self::VolatilityGate { .. } => "volatility_gate",
        }
    }

    /// Tickers the configured strategy trades, in evaluation order.
    pub fn tickers(&self) -> Vec<String> {
        match self {
            Self::MomentumRotation {
                benchmark,
                rotation,
            } => vec![benchmark.clone(), rotation.clone()],
            Self::VolatilityGate { tickers, .. } => tickers.clone(),
        }
    }

    /// Bars of history a strategy wants before its first decision.
    ///
    /// The volatility gate needs `atr_period - 1` earlier bars so the ATR is
    /// available on day one. Momentum rotation reads only the latest bar.
    pub fn warmup_bars(&self) -> usize {
        match self {
            Self::MomentumRotation { .. } => 0,
            Self::VolatilityGate { atr_period, .. } => atr_period.saturating_sub(1),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let tickers = self.tickers();
        if tickers.is_empty() {
            return Err(ConfigError::NoTickers);
        }
        let mut seen = HashSet::new();
        for t in &tickers {
            if t.trim().is_empty() {
                return Err(ConfigError::InvalidParam {
                    name: "tickers",
                    reason: "ticker must not be blank".into(),
                });
            }
            if !seen.insert(t.as_str()) {
                return Err(ConfigError::DuplicateTicker(t.clone()));
            }
        }

        if let Self::VolatilityGate {
            cash_hold_days,
            atr_period,
            max_volatility_pct,
            ..
        } = self
        {
            if *cash_hold_days < 0 {
                return Err(ConfigError::InvalidParam {
                    name: "cash_hold_days",
                    reason: format!("must be >= 0, got {cash_hold_days}"),
                });
            }
            if *atr_period == 0 {
                return Err(ConfigError::InvalidParam {
                    name: "atr_period",
                    reason: "must be >= 1".into(),
                });
            }
            if *max_volatility_pct <= 0.0 || !max_volatility_pct.is_finite() {
                return Err(ConfigError::InvalidParam {
                    name: "max_volatility_pct",
                    reason: format!("must be a positive number, got {max_volatility_pct}"),
                });
            }
        }

        Ok(())
    }
}
