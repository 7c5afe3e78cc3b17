//! Date/time utilities for Cloudstore.
//!
//! Timestamps are stored as fixed-width UTC text so that lexical order in the
//! database equals chronological order.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Storage format for timestamps (`YYYY-MM-DD HH:MM:SS.ffffff`).
pub const DB_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Format a UTC datetime for storage.
pub fn to_db_string(dt: &DateTime<Utc>) -> String {
    dt.format(DB_FORMAT).to_string()
}

/// Current time formatted for storage.
pub fn now_db_string() -> String {
    to_db_string(&Utc::now())
}

/// Parse a stored timestamp.
///
/// Accepts the storage format and the plain SQLite `datetime()` format
/// without fractional seconds. Returns `None` if neither matches.
pub fn parse_db_string(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}
