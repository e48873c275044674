//! Publication-date parsers for the formats the sources publish.
//!
//! Every parser returns `None` for input it cannot read; callers treat that as
//! a missing date rather than an error.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Offset-bearing layouts tried after RFC 3339.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Naive layouts, interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO-8601 timestamp such as a `<time datetime="...">` value.
///
/// Accepts a `Z` suffix, numeric offsets with or without a colon, timestamps
/// without seconds, naive timestamps (taken as UTC) and bare dates (midnight UTC).
pub(crate) fn parse_iso_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parses a string of ASCII digits as milliseconds since the Unix epoch.
pub(crate) fn parse_epoch_millis(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let millis = raw.parse::<i64>().ok()?;
    DateTime::from_timestamp_millis(millis)
}

/// Parses a dateline like `Sat 1 Jun 2024 14.30 BST`.
///
/// The first five tokens carry the local time; a sixth `BST` token shifts it
/// by one hour. `GMT`, `UTC`, a missing zone or an unknown zone read as UTC.
pub(crate) fn parse_dateline(raw: &str) -> Option<DateTime<Utc>> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens.len() < 5 {
        return None;
    }

    let local = NaiveDateTime::parse_from_str(&tokens[..5].join(" "), "%a %d %b %Y %H.%M").ok()?;

    let offset_secs = match tokens.get(5).copied() {
        Some("BST") => 3600,
        _ => 0,
    };
    let offset = FixedOffset::east_opt(offset_secs)?;

    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parses a US-style date like `Jun 3, 2024` as midnight UTC.
pub(crate) fn parse_month_day_year(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(raw.trim(), "%b %d, %Y")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
