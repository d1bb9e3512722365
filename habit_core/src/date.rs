//! Calendar-day helpers shared by the evaluator, the engine and the stores.
//!
//! Days are `NaiveDate`s: no time of day and no timezone. On disk and on the
//! command line they are always canonical `YYYY-MM-DD` strings.

use crate::{Error, Result};
use chrono::{Datelike, Days, NaiveDate};

/// Canonical on-disk day format
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Parse a canonical `YYYY-MM-DD` day string
pub fn parse_day(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    // chrono accepts unpadded fields; the canonical form is fixed width
    if trimmed.len() != 10 {
        return Err(Error::validation(
            "day",
            format!("'{}' is not in YYYY-MM-DD form", s),
        ));
    }
    NaiveDate::parse_from_str(trimmed, DAY_FORMAT)
        .map_err(|e| Error::validation("day", format!("'{}': {}", s, e)))
}

/// Format a day in canonical `YYYY-MM-DD` form
pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// Weekday index with 0 = Sunday .. 6 = Saturday
pub fn weekday_index(day: NaiveDate) -> u8 {
    day.weekday().num_days_from_sunday() as u8
}

/// First day of a trailing window of `days` days ending at `today` (inclusive)
///
/// Clamped to the earliest representable date.
pub fn window_start(today: NaiveDate, days: u32) -> NaiveDate {
    let span = u64::from(days.max(1)) - 1;
    today.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN)
}

/// Signed number of days from `from` to `to`
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}
