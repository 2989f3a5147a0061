//! Small helpers shared across pipeline stages.
//!
//! - Run timestamp generation (one value stamped onto every record of a run)
//! - String truncation for log previews

use chrono::{Local, NaiveDateTime};

/// Timestamp format used for records: ISO 8601, second precision, no offset.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The current local time formatted for record stamping.
///
/// # Examples
///
/// ```ignore
/// let ts = run_timestamp(); // "2026-02-22T10:00:00"
/// ```
pub fn run_timestamp() -> String {
    format_timestamp(Local::now().naive_local())
}

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` bytes (backing off to the nearest char
/// boundary) with an ellipsis and a byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}
