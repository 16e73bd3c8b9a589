use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

const UTC_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// Whole-second part, then an optional fraction and zone marker that are dropped
static UTC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})(?:\.\d+)?Z?$")
        .expect("timestamp pattern is a valid regex")
});

/// Parse `YYYY-MM-DDTHH:MM:SS[.fff][Z]` as UTC calendar time.
///
/// Fractional seconds are discarded. Returns `None` for anything else, including
/// surrounding whitespace and well-shaped text with out-of-range fields such as month 13.
pub fn parse_utc(text: &str) -> Option<DateTime<Utc>> {
    let caps = UTC_PATTERN.captures(text)?;
    let naive = NaiveDateTime::parse_from_str(&caps[1], UTC_FORMAT).ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Format as `YYYY-MM-DDTHH:MM:SSZ`, truncating sub-second precision.
pub fn format_utc(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
