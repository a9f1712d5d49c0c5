//! Strategy trait and the concrete allocation strategies.
//!
//! A strategy is constructed once and then asked for a target allocation on
//! every trading interval. It sees only the price window it is handed plus
//! its own fields.

pub mod factory;
pub mod momentum_rotation;
pub mod volatility_gate;

pub use factory::{build_strategy, StrategyPreset};
pub use momentum_rotation::MomentumRotation;
pub use volatility_gate::VolatilityGate;

use crate::domain::{Asset, Interval, PriceWindow, TargetAllocation};
use crate::error::StrategyError;

/// Decision component driven by an external scheduler.
///
/// Calls are sequential: `run()` takes `&mut self` and strategies keep plain
/// fields, no interior mutability.
pub trait Strategy: Send {
    /// Stable identifier (e.g., "momentum_rotation").
    fn name(&self) -> &str;

    /// Bar interval the strategy expects.
    fn interval(&self) -> Interval {
        Interval::OneDay
    }

    /// Tickers the strategy trades, in evaluation order.
    fn assets(&self) -> &[String];

    /// Data descriptors the driver should supply. Empty means "just OHLCV for
    /// `assets()`".
    fn data(&self) -> Vec<Asset> {
        Vec::new()
    }

    /// Produce the target allocation for the latest bar in `window`.
    fn run(&mut self, window: &PriceWindow) -> Result<TargetAllocation, StrategyError>;
}
