//! Factory: `StrategyConfig` → runtime strategy, plus named presets.

use std::fmt;
use std::str::FromStr;

use super::{MomentumRotation, Strategy, VolatilityGate};
use crate::config::{ConfigError, StrategyConfig};

/// Validate `config` and build the strategy it describes.
pub fn build_strategy(config: &StrategyConfig) -> Result<Box<dyn Strategy>, ConfigError> {
    config.validate()?;
    let strategy: Box<dyn Strategy> = match config {
        StrategyConfig::MomentumRotation {
            benchmark,
            rotation,
        } => Box::new(MomentumRotation::with_tickers(benchmark, rotation)),
        StrategyConfig::VolatilityGate {
            tickers,
            cash_hold_days,
            atr_period,
            max_volatility_pct,
        } => Box::new(
            VolatilityGate::new()
                .with_tickers(tickers.iter().cloned())
                .with_cash_hold_days(*cash_hold_days)
                .with_atr_period(*atr_period)
                .with_max_volatility_pct(*max_volatility_pct),
        ),
    };
    Ok(strategy)
}

/// Named presets: the stock strategies with default parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyPreset {
    /// SPY benchmark, TSLA rotation at month end.
    MomentumRotation,
    /// SPY/QQQ equal weight with a 10% ATR cash gate.
    VolatilityGate,
}

impl StrategyPreset {
    pub fn to_config(self) -> StrategyConfig {
        match self {
            Self::MomentumRotation => StrategyConfig::momentum_rotation(),
            Self::VolatilityGate => StrategyConfig::volatility_gate(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::MomentumRotation => "momentum_rotation",
            Self::VolatilityGate => "volatility_gate",
        }
    }

    pub fn all() -> &'static [StrategyPreset] {
        &[Self::MomentumRotation, Self::VolatilityGate]
    }
}

impl fmt::Display for StrategyPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}
