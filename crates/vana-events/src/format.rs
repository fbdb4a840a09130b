//! Display formatting for event dates and times.
//!
//! All helpers are fail-soft: a missing or unparsable timestamp renders as an
//! empty string rather than an error.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Parse an upstream timestamp.
///
/// Accepts RFC 3339 (`2024-05-01T17:00:00.000Z`) and bare dates (`2024-05-01`,
/// taken as midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// `Wed, Jan 3, 2024`
pub fn format_date(dt: DateTime<Utc>, tz: Tz) -> String {
    dt.with_timezone(&tz).format("%a, %b %-d, %Y").to_string()
}

/// `3:05 PM`, or `""` when the source is missing or unparsable.
pub fn format_time(raw: Option<&str>, tz: Tz) -> String {
    match raw.and_then(parse_timestamp) {
        Some(dt) => dt.with_timezone(&tz).format("%-I:%M %p").to_string(),
        None => String::new(),
    }
}
