// src/dates.rs
//! Timestamp parsing and day-normalization for heterogeneous provider formats.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// The exact format NewsAPI uses for `publishedAt`.
pub const NEWS_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Naive formats accepted after RFC 3339 fails (local ISO strings, space separators).
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parse a provider timestamp into UTC wall time.
///
/// Offsets are converted to UTC; strings without an offset are taken as-is.
/// A bare `YYYY-MM-DD` maps to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Day-normalize a raw timestamp string.
pub fn day_of(raw: &str) -> Option<NaiveDate> {
    parse_timestamp(raw).map(|dt| dt.date())
}

/// Display format for the dashboard ("DD/MM/YYYY HH:MM"); falls back to the raw string.
pub fn display_date(raw: &str) -> String {
    match NaiveDateTime::parse_from_str(raw, NEWS_TIMESTAMP_FORMAT) {
        Ok(dt) => dt.format("%d/%m/%Y %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Unix seconds → UTC wall time.
pub fn from_unix(secs: i64) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
}
