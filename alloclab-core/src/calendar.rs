//! Calendar helpers: ISO date parsing and month-end detection.

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::StrategyError;

/// Date format used on the wire.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO `YYYY-MM-DD` date string.
pub fn parse_date(value: &str) -> Result<NaiveDate, StrategyError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|source| StrategyError::InvalidDate {
        value: value.to_string(),
        source,
    })
}

/// True if `date` is the last calendar day of its month.
///
/// A day is month-end when the following day falls in a different month.
pub fn is_end_of_month(date: NaiveDate) -> bool {
    match date.checked_add_signed(Duration::days(1)) {
        Some(next) => next.month() != date.month(),
        // NaiveDate::MAX is Dec 31
        None => true,
    }
}

/// String form of [`is_end_of_month`]. Malformed input is an error.
pub fn is_end_of_month_str(value: &str) -> Result<bool, StrategyError> {
    parse_date(value).map(is_end_of_month)
}

/// Whole days from `earlier` to `later` (negative if `later` precedes `earlier`).
pub fn days_between(earlier: NaiveDate, later: NaiveDate) -> i64 {
    later.signed_duration_since(earlier).num_days()
}
