//! AllocLab Core: domain types, indicators, and allocation strategies.
//!
//! This crate contains everything a driver needs to ask a strategy for a
//! target allocation:
//! - Domain types (bars, price windows, target allocations, asset descriptors)
//! - Calendar helpers (ISO date parsing, month-end detection)
//! - Average True Range indicator
//! - The `Strategy` trait plus two concrete strategies:
//!   momentum rotation and volatility-gated equal weight
//! - Serializable strategy configuration and a factory

pub mod calendar;
pub mod config;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod strategy;

pub use config::{ConfigError, StrategyConfig};
pub use domain::{Asset, Bar, BarRecord, Interval, PriceWindow, TargetAllocation};
pub use error::StrategyError;
pub use strategy::{
    build_strategy, MomentumRotation, Strategy, StrategyPreset, VolatilityGate,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: strategies and their inputs/outputs can cross threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Bar>();
        require_sync::<Bar>();
        require_send::<BarRecord>();
        require_sync::<BarRecord>();
        require_send::<PriceWindow>();
        require_sync::<PriceWindow>();
        require_send::<TargetAllocation>();
        require_sync::<TargetAllocation>();
        require_send::<StrategyConfig>();
        require_sync::<StrategyConfig>();

        require_send::<MomentumRotation>();
        require_send::<VolatilityGate>();
        require_send::<Box<dyn Strategy>>();
    }

    /// Architecture contract: strategies see only the price window.
    ///
    /// `run()` takes `&PriceWindow` and nothing else. There is no portfolio,
    /// broker, or clock parameter, so a decision depends only on the bars it
    /// is handed plus the strategy's own fields.
    #[test]
    fn strategy_run_takes_only_the_window() {
        fn _check_trait_object_builds(
            strategy: &mut dyn Strategy,
            window: &PriceWindow,
        ) -> Result<TargetAllocation, StrategyError> {
            strategy.run(window)
        }
    }
}
