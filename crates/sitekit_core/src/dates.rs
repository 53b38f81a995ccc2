//! Lenient date handling for content metadata

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_yaml::Value;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
const READABLE_FORMAT: &str = "%d %b %Y";

/// Parse a metadata value as a UTC timestamp (seconds).
///
/// Accepts RFC 3339, `YYYY-MM-DD`, and `YYYY-MM-DD[ T]HH:MM[:SS]` strings.
/// Anything else is `None`.
pub fn parse_date_value(value: &Value) -> Option<i64> {
    match value {
        Value::String(text) => parse_date_str(text),
        Value::Tagged(tagged) => parse_date_value(&tagged.value),
        _ => None,
    }
}

pub fn parse_date_str(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.timestamp());
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(Utc.from_utc_datetime(&parsed).timestamp());
        }
    }
    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?).timestamp())
}

/// Sort key with the epoch standing in for a missing date.
pub fn sort_key(date: Option<i64>) -> i64 {
    date.unwrap_or(0)
}

/// Stable newest-first sort; undated items land after every dated item
/// from 1970 onwards.
pub fn sort_newest_first<T, F>(items: &mut [T], date_of: F)
where
    F: Fn(&T) -> Option<i64>,
{
    items.sort_by(|a, b| sort_key(date_of(b)).cmp(&sort_key(date_of(a))));
}

pub fn format_readable(timestamp: i64) -> Option<String> {
    let dt = DateTime::<Utc>::from_timestamp(timestamp, 0)?;
    Some(dt.format(READABLE_FORMAT).to_string())
}

pub fn format_rfc3339(timestamp: i64) -> Option<String> {
    let dt = DateTime::<Utc>::from_timestamp(timestamp, 0)?;
    Some(dt.to_rfc3339())
}

pub fn current_year() -> i32 {
    use chrono::Datelike;
    Utc::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_formats() {
        assert_eq!(parse_date_str("2024-01-02"), Some(1_704_153_600));
        assert_eq!(parse_date_str("2024-01-02 00:00"), Some(1_704_153_600));
        assert_eq!(parse_date_str("2024-01-02T00:00:00"), Some(1_704_153_600));
        assert_eq!(parse_date_str("2024-01-02T01:00:00+01:00"), Some(1_704_153_600));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_date_str(""), None);
        assert_eq!(parse_date_str("last tuesday"), None);
        assert_eq!(parse_date_value(&Value::Bool(true)), None);
        assert_eq!(parse_date_value(&Value::Null), None);
    }

    #[test]
    fn undated_items_sort_last() {
        let mut items = vec![
            ("undated", None),
            ("old", Some(100)),
            ("new", Some(200)),
            ("also-undated", None),
        ];
        sort_newest_first(&mut items, |item| item.1);
        let order: Vec<_> = items.iter().map(|item| item.0).collect();
        assert_eq!(order, vec!["new", "old", "undated", "also-undated"]);
    }

    #[test]
    fn readable_date_uses_day_month_year() {
        assert_eq!(format_readable(1_704_153_600).as_deref(), Some("02 Jan 2024"));
    }
}
