//! Timestamp parsing for date-like columns

use crate::table::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound};

const DATETIME_FORMATS: [&str; 9] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y%m%dT%H%M%S",
    // Day first, as written by Spanish-locale terminals
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S%.f",
];

const DATE_FORMATS: [&str; 5] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
];

/// Parse a cell as a timestamp truncated to whole seconds
///
/// Returns `None` for nulls, non-text values and text that matches none of
/// the accepted layouts.
pub fn parse_timestamp(value: &Value) -> Option<NaiveDateTime> {
    let parsed = match value {
        Value::Timestamp(ts) => Some(*ts),
        Value::Text(text) => parse_text(text.trim()),
        _ => None,
    };
    parsed.map(|ts| ts.trunc_subsecs(0))
}

fn parse_text(text: &str) -> Option<NaiveDateTime> {
    if let Ok(zoned) = DateTime::parse_from_rfc3339(text) {
        return Some(zoned.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
