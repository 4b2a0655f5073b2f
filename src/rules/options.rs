//! Option coercion
//!
//! Rule options arrive as decoded tree values. Each rule coerces its option
//! with one of the helpers below. The semantics are fixed:
//!
//! - as-bool: empty string, `"0"`, `0`, null, empty list/map are false;
//!   everything else is true
//! - as-string: scalars stringify, lists/maps become compact JSON
//! - as-int / as-float: numeric parse, non-numeric input yields 0
//! - as-array: non-list values are wrapped as a single-element list
//! - as-date: UTC instant from an absolute or relative expression; failure
//!   is a fatal [`SchemaError::InvalidDate`]

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::schema::{SchemaError, SchemaResult};

pub fn as_bool(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

pub fn as_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

pub fn as_float(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_number(s).unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    }
}

pub fn as_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .unwrap_or_else(|| n.as_f64().map_or(0, |f| f.trunc() as i64)),
        Value::String(s) => parse_number(s).map_or(0, |f| f.trunc() as i64),
        Value::Bool(true) => 1,
        _ => 0,
    }
}

pub fn as_array(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

/// as-array followed by as-string on every element.
pub fn as_string_list(value: &Value) -> Vec<String> {
    as_array(value).iter().map(as_string).collect()
}

pub fn as_date(value: &Value) -> SchemaResult<DateTime<Utc>> {
    let text = as_string(value);
    parse_date(&text).ok_or(SchemaError::InvalidDate(text))
}

/// Parses a finite decimal number. Surrounding whitespace is not accepted.
pub fn parse_number(text: &str) -> Option<f64> {
    if text.is_empty() || text != text.trim() {
        return None;
    }
    let is_numeric = text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if !is_numeric {
        return None;
    }
    text.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Formats a number the way schema authors usually write it:
/// integral values without a fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

/// Parses an absolute or relative date expression relative to the current time.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    parse_date_at(text, Utc::now())
}

/// Parses a date expression, resolving relative forms against `now`.
///
/// Absolute forms: RFC 3339, `@<unix seconds>`, and the fixed formats above.
/// Relative forms: an optional anchor (`now`, `today`, `midnight`,
/// `tomorrow`, `yesterday`) followed by zero or more offsets such as
/// `+1 day`, `-2 weeks`, `3 months ago`, `next year`, `last hour`.
/// Anything else is rejected.
pub fn parse_date_at(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    parse_absolute(text).or_else(|| parse_relative(text, now))
}

fn parse_absolute(text: &str) -> Option<DateTime<Utc>> {
    if let Some(ts) = text.strip_prefix('@') {
        return ts.parse::<i64>().ok().and_then(|s| Utc.timestamp_opt(s, 0).single());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

fn parse_relative(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let lower = text.to_ascii_lowercase();
    let mut tokens = lower.split_whitespace().peekable();

    let midnight = now.date_naive().and_hms_opt(0, 0, 0)?.and_utc();
    let anchor = tokens.peek().copied();
    let current = match anchor {
        Some("now") => now,
        Some("today") | Some("midnight") => midnight,
        Some("tomorrow") => midnight + Duration::days(1),
        Some("yesterday") => midnight - Duration::days(1),
        _ => {
            // Without an anchor at least one offset is required.
            return apply_offsets(now, tokens.collect(), true);
        }
    };
    tokens.next();

    apply_offsets(current, tokens.collect(), false)
}

fn apply_offsets(
    mut current: DateTime<Utc>,
    tokens: Vec<&str>,
    require_one: bool,
) -> Option<DateTime<Utc>> {
    if require_one && tokens.is_empty() {
        return None;
    }

    let mut i = 0;
    while i < tokens.len() {
        let amount: i64 = match tokens[i] {
            "next" => 1,
            "last" => -1,
            token => token.strip_prefix('+').unwrap_or(token).parse().ok()?,
        };
        let unit = tokens.get(i + 1)?;
        i += 2;

        let amount = if tokens.get(i) == Some(&"ago") {
            i += 1;
            -amount
        } else {
            amount
        };

        current = shift(current, amount, unit)?;
    }

    Some(current)
}

fn shift(current: DateTime<Utc>, amount: i64, unit: &str) -> Option<DateTime<Utc>> {
    let unit = unit.strip_suffix('s').filter(|u| !u.is_empty()).unwrap_or(unit);
    let duration = match unit {
        "sec" | "second" => Duration::seconds(amount),
        "min" | "minute" => Duration::minutes(amount),
        "hour" => Duration::hours(amount),
        "day" => Duration::days(amount),
        "week" => Duration::weeks(amount),
        "fortnight" => Duration::weeks(amount * 2),
        "month" | "year" => {
            let months = if unit == "year" { amount * 12 } else { amount };
            let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
            return if months >= 0 {
                current.checked_add_months(magnitude)
            } else {
                current.checked_sub_months(magnitude)
            };
        }
        _ => return None,
    };
    current.checked_add_signed(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_as_bool() {
        assert!(!as_bool(&json!("")));
        assert!(!as_bool(&json!("0")));
        assert!(!as_bool(&json!(0)));
        assert!(!as_bool(&json!(null)));
        assert!(!as_bool(&json!([])));
        assert!(!as_bool(&json!(false)));

        assert!(as_bool(&json!("false")));
        assert!(as_bool(&json!("yes")));
        assert!(as_bool(&json!(2)));
        assert!(as_bool(&json!([0])));
        assert!(as_bool(&json!(true)));
    }

    #[test]
    fn test_as_string() {
        assert_eq!(as_string(&json!("abc")), "abc");
        assert_eq!(as_string(&json!(42)), "42");
        assert_eq!(as_string(&json!(4.5)), "4.5");
        assert_eq!(as_string(&json!(true)), "true");
        assert_eq!(as_string(&json!(null)), "");
        assert_eq!(as_string(&json!(["a", 1])), "[\"a\",1]");
        assert_eq!(as_string(&json!({"k": "v"})), "{\"k\":\"v\"}");
    }

    #[test]
    fn test_as_numbers() {
        assert_eq!(as_int(&json!("17")), 17);
        assert_eq!(as_int(&json!("4.9")), 4);
        assert_eq!(as_int(&json!("abc")), 0);
        assert_eq!(as_int(&json!(3.7)), 3);
        assert_eq!(as_float(&json!("2.5")), 2.5);
        assert_eq!(as_float(&json!("two")), 0.0);
        assert_eq!(as_float(&json!(null)), 0.0);
    }

    #[test]
    fn test_as_array_wraps_scalars() {
        assert_eq!(as_array(&json!("a")), vec![json!("a")]);
        assert_eq!(as_array(&json!(["a", "b"])).len(), 2);
        assert_eq!(as_string_list(&json!([1, "x"])), vec!["1", "x"]);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1"), Some(1.0));
        assert_eq!(parse_number("-1.25"), Some(-1.25));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number(" 1"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("1,5"), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn test_absolute_dates() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2024-03-01"), Some(expected));
        assert_eq!(parse_date("01.03.2024"), Some(expected));
        assert_eq!(parse_date("2024/03/01"), Some(expected));

        let with_time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        assert_eq!(parse_date("2024-03-01 12:30:05"), Some(with_time));
        assert_eq!(parse_date("2024-03-01T14:30:05+02:00"), Some(with_time));
        assert_eq!(parse_date("@0"), Utc.timestamp_opt(0, 0).single());
    }

    #[test]
    fn test_relative_dates() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 15, 0, 0).unwrap();

        assert_eq!(parse_date_at("now", now), Some(now));
        assert_eq!(
            parse_date_at("+1 day", now),
            Some(Utc.with_ymd_and_hms(2024, 2, 1, 15, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date_at("2 hours ago", now),
            Some(Utc.with_ymd_and_hms(2024, 1, 31, 13, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date_at("today", now),
            Some(Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date_at("yesterday -1 week", now),
            Some(Utc.with_ymd_and_hms(2024, 1, 23, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date_at("+1 month", now),
            Some(Utc.with_ymd_and_hms(2024, 2, 29, 15, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date_at("last year", now),
            Some(Utc.with_ymd_and_hms(2023, 1, 31, 15, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_unparsable_dates() {
        let now = Utc::now();
        for text in ["", "soon", "+1", "+1 eon", "2024-13-45", "day", "next"] {
            assert!(parse_date_at(text, now).is_none(), "{} should not parse", text);
        }
        assert!(matches!(as_date(&json!("whenever")), Err(SchemaError::InvalidDate(_))));
    }
}
