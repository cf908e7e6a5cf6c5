//! Timestamp helpers shared by the event views and the timeline.
//!
//! Wire timestamps stay as strings on the models; they are parsed on demand
//! and an unparseable value simply yields `None`.

use chrono::{DateTime, Local, NaiveDateTime};

/// Parse an ISO-8601 timestamp into Unix milliseconds.
///
/// Offsets are honored. Timestamps without an offset are read as UTC.
pub fn parse_millis(ts: &str) -> Option<i64> {
    let ts = ts.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Local wall-clock `HH:MM:SS` for a Unix millisecond instant.
pub fn clock_label(millis: i64) -> String {
    match DateTime::from_timestamp_millis(millis) {
        Some(dt) => dt.with_timezone(&Local).format("%H:%M:%S").to_string(),
        None => String::new(),
    }
}

/// Local date and time for display, or the raw string when it does not parse.
pub fn local_datetime_label(ts: &str) -> String {
    parse_millis(ts)
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}
