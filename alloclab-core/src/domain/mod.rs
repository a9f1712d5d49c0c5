//! Domain types for AllocLab

pub mod allocation;
pub mod asset;
pub mod bar;
pub mod window;

pub use allocation::TargetAllocation;
pub use asset::{Asset, Interval};
pub use bar::{Bar, BarRecord};
pub use window::PriceWindow;
