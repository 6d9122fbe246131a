//! Lenient parsing helpers shared by the extractors
//!
//! Upstream payloads are not under our control. Anything that should be a
//! number but is not becomes zero.

use regex::Regex;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Deserializer};
use std::sync::LazyLock;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

static FIRST_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid integer pattern"));

/// First run of digits in `text`
pub(crate) fn first_int(text: &str) -> Option<u64> {
    FIRST_INT
        .find(text)
        .and_then(|m| m.as_str().parse::<u64>().ok())
}

/// Number from a JSON value that may be a number or a numeric string
pub(crate) fn value_u64(value: &serde_json::Value) -> u64 {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

pub(crate) fn value_i64(value: &serde_json::Value) -> i64 {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Serde adapter: lenient u64 (numbers, numeric strings, null → 0)
pub(crate) fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_u64(&value))
}

/// Serde adapter: lenient i64
pub(crate) fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_i64(&value))
}

/// Move a field out of a JSON object, `Null` when absent
pub(crate) fn take_field(value: &mut serde_json::Value, key: &str) -> serde_json::Value {
    value
        .get_mut(key)
        .map(serde_json::Value::take)
        .unwrap_or_default()
}

/// Deserialize a JSON value into `T`, falling back to `T::default()`
pub(crate) fn from_value_or_default<T>(value: serde_json::Value, what: &str) -> T
where
    T: for<'de> Deserialize<'de> + Default,
{
    serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::debug!(what = %what, error = %e, "Unexpected upstream shape, using defaults");
        T::default()
    })
}

/// Parse an epoch-seconds value into a timestamp
pub(crate) fn from_epoch(secs: i64, offset: UtcOffset) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(secs)
        .ok()
        .map(|t| t.to_offset(offset))
}

/// Parse an RFC 3339 timestamp such as `2024-01-15T12:00:00Z`
pub(crate) fn parse_rfc3339(text: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(text.trim(), &time::format_description::well_known::Rfc3339).ok()
}

static DAY_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2}),\s*(\d{1,2}):(\d{2}):(\d{2})$")
        .expect("valid date pattern")
});
static YEAR_MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})[ T](\d{2}):(\d{2}):(\d{2})$").expect("valid date pattern")
});

/// Parse `dd/mm/yy, HH:MM:SS` or `YYYY-MM-DD HH:MM:SS` as local time at `offset`
pub(crate) fn parse_local_datetime(text: &str, offset: UtcOffset) -> Option<OffsetDateTime> {
    let text = text.trim();
    let (year, month, day, caps) = if let Some(caps) = DAY_MONTH_YEAR.captures(text) {
        let year = 2000 + caps[3].parse::<i32>().ok()?;
        let month = caps[2].parse::<u8>().ok()?;
        let day = caps[1].parse::<u8>().ok()?;
        (year, month, day, caps)
    } else if let Some(caps) = YEAR_MONTH_DAY.captures(text) {
        let year = caps[1].parse::<i32>().ok()?;
        let month = caps[2].parse::<u8>().ok()?;
        let day = caps[3].parse::<u8>().ok()?;
        (year, month, day, caps)
    } else {
        return None;
    };

    let date = Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()?;
    let time = Time::from_hms(
        caps[4].parse().ok()?,
        caps[5].parse().ok()?,
        caps[6].parse().ok()?,
    )
    .ok()?;
    Some(PrimitiveDateTime::new(date, time).assume_offset(offset))
}

/// Parse a plain `YYYY-MM-DD` date
pub(crate) fn parse_date(text: &str) -> Option<Date> {
    let format = time::macros::format_description!("[year]-[month]-[day]");
    Date::parse(text.trim(), &format).ok()
}

/// Whitespace-collapsed text content of an element
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// All elements under `scope` matching `css`, in document order
pub(crate) fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    let Ok(selector) = Selector::parse(css) else {
        tracing::warn!(selector = %css, "Invalid CSS selector");
        return vec![];
    };
    scope.select(&selector).collect()
}

/// First element matching any of `candidates`, tried in order
pub(crate) fn select_first<'a>(scope: ElementRef<'a>, candidates: &[&str]) -> Option<ElementRef<'a>> {
    candidates
        .iter()
        .find_map(|css| select_all(scope, css).into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_first_int() {
        assert_eq!(first_int("Fully Solved (123)"), Some(123));
        assert_eq!(first_int("no digits"), None);
    }

    #[test]
    fn test_value_u64_is_lenient() {
        assert_eq!(value_u64(&serde_json::json!(12)), 12);
        assert_eq!(value_u64(&serde_json::json!("34")), 34);
        assert_eq!(value_u64(&serde_json::json!("n/a")), 0);
        assert_eq!(value_u64(&serde_json::json!(null)), 0);
        assert_eq!(value_u64(&serde_json::json!(-5)), 0);
    }

    #[test]
    fn test_parse_local_datetime_formats() {
        assert_eq!(
            parse_local_datetime("05/03/24, 14:30:00", UtcOffset::UTC),
            Some(datetime!(2024-03-05 14:30:00 UTC))
        );
        assert_eq!(
            parse_local_datetime("2024-03-05 14:30:00", UtcOffset::UTC),
            Some(datetime!(2024-03-05 14:30:00 UTC))
        );
        assert_eq!(parse_local_datetime("yesterday", UtcOffset::UTC), None);
        assert_eq!(parse_local_datetime("31/02/24, 10:00:00", UtcOffset::UTC), None);
    }

    #[test]
    fn test_from_epoch_applies_offset() {
        let offset = UtcOffset::from_hms(5, 30, 0).unwrap();
        // 2023-12-31T20:00:00Z is already January in IST
        let at = from_epoch(1_704_052_800, offset).unwrap();
        assert_eq!(at.month(), Month::January);
    }
}
