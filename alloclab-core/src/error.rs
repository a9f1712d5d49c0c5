//! Errors surfaced by a single decision call.

use thiserror::Error;

/// Errors a strategy can return from `run()`.
///
/// None of these are retried; the driver decides whether to skip the
/// interval or halt.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("invalid date '{value}': expected YYYY-MM-DD ({source})")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}
