//! Parsing of the display-time strings stored on appointments and follow-ups.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Accepted clock formats, tried in order.
const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"];

/// Parse "14:30", "14:30:00", "2:30 PM" or "2:30pm".
pub fn parse_clock_time(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = trimmed.to_ascii_uppercase();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&normalized, fmt).ok())
}

/// Stored calendar date: `2024-05-14`, or an ISO datetime such as
/// `2024-05-14T10:00:00.000Z` whose date part is kept.
pub fn parse_stored_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Date plus display time. An unparseable time counts as start of day.
pub fn slot_datetime(date: NaiveDate, time: &str) -> NaiveDateTime {
    date.and_time(parse_clock_time(time).unwrap_or(NaiveTime::MIN))
}
