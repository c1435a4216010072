use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

/// Parse the date strings that arrive from clients and from persisted
/// documents: full RFC 3339 timestamps, `YYYY-MM-DDTHH:MM:SS` without an
/// offset, or a bare `YYYY-MM-DD`. Bare dates are taken as midnight UTC.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// ISO-8601 week number (1-53, week 1 contains the year's first Thursday).
/// Unparseable input falls back to the current week so a record never ends
/// up without one.
pub fn week_number(date: &str) -> u32 {
    parse_date(date)
        .unwrap_or_else(Utc::now)
        .iso_week()
        .week()
}

/// Epoch milliseconds for recency sorting. None when the date cannot be read.
pub fn sort_key(date: &str) -> Option<i64> {
    parse_date(date).map(|dt| dt.timestamp_millis())
}

/// Upper-case three-letter English month abbreviation (JAN..DEC).
pub fn month_abbrev(date: &str) -> Option<String> {
    parse_date(date).map(|dt| dt.format("%b").to_string().to_uppercase())
}

/// Month number 1-12.
pub fn month_of(date: &str) -> Option<u32> {
    parse_date(date).map(|dt| dt.month())
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}
