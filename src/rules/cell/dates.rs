//! Date comparison and format rules

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;

use crate::rules::options::{as_date, as_string, parse_date};
use crate::rules::{CellRule, Comparison};
use crate::schema::{SchemaError, SchemaResult};

const DISPLAY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

struct DateCompare {
    comparison: Comparison,
    expected: DateTime<Utc>,
    expected_label: String,
}

impl CellRule for DateCompare {
    fn check(&self, value: &str) -> Option<String> {
        let actual = match parse_date(value) {
            Some(actual) => actual,
            None => return Some(format!("Value \"<c>{}</c>\" is not a valid date", value)),
        };
        if self.comparison.holds(actual, self.expected) {
            return None;
        }
        Some(self.comparison.describe(
            &format!("The date of the value \"<c>{}</c>\"", value),
            &actual.format(DISPLAY_FORMAT).to_string(),
            &format!(
                "{} ({})",
                self.expected.format(DISPLAY_FORMAT),
                self.expected_label
            ),
        ))
    }
}

/// `date`, `date_not`, `date_min`, `date_max`
///
/// The option is parsed once at construction; relative forms such as `now`
/// are therefore fixed for the lifetime of the rule.
pub fn date(code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    Ok(Box::new(DateCompare {
        comparison: Comparison::from_code(code),
        expected: as_date(option)?,
        expected_label: as_string(option),
    }))
}

struct DateFormat {
    format: String,
}

impl DateFormat {
    /// Parses `value` with the format and re-renders it; the value only
    /// matches if both texts are identical.
    fn matches(&self, value: &str) -> bool {
        let format = self.format.as_str();
        let mut rendered = String::new();
        let ok = if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            write!(rendered, "{}", dt.format(format)).is_ok()
        } else if let Ok(d) = NaiveDate::parse_from_str(value, format) {
            write!(rendered, "{}", d.format(format)).is_ok()
        } else if let Ok(t) = NaiveTime::parse_from_str(value, format) {
            write!(rendered, "{}", t.format(format)).is_ok()
        } else {
            false
        };
        ok && rendered == value
    }
}

impl CellRule for DateFormat {
    fn check(&self, value: &str) -> Option<String> {
        if self.matches(value) {
            return None;
        }
        Some(format!(
            "Date format of value \"<c>{}</c>\" is not valid. Expected format: \"<green>{}</green>\"",
            value, self.format
        ))
    }
}

pub fn date_format(code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    let format = as_string(option);
    if format.is_empty() {
        return Err(SchemaError::invalid_option(code, "expected a date format"));
    }
    if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
        return Err(SchemaError::invalid_option(
            code,
            format!("invalid date format \"{}\"", format),
        ));
    }
    Ok(Box::new(DateFormat { format }))
}

struct IsDate;

impl CellRule for IsDate {
    fn check(&self, value: &str) -> Option<String> {
        if parse_date(value).is_some() {
            return None;
        }
        Some(format!("Value \"<c>{}</c>\" is not a valid date", value))
    }
}

pub fn is_date(_code: &'static str, _option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    Ok(Box::new(IsDate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_date_min_max() {
        let min = date("date_min", &json!("2000-01-01")).unwrap();
        assert!(min.check("2000-01-01").is_none());
        assert!(min.check("2024-05-05 10:00:00").is_none());
        let message = min.check("1999-12-31").unwrap();
        assert!(message.contains("less than"));
        assert!(message.contains("2000-01-01"));

        let max = date("date_max", &json!("+1 day")).unwrap();
        assert!(max.check("2000-01-01").is_none());
        assert!(max.check("2999-01-01").is_some());
    }

    #[test]
    fn test_date_exact_and_not() {
        let exact = date("date", &json!("2020-02-02")).unwrap();
        assert!(exact.check("2020-02-02 00:00:00").is_none());
        assert!(exact.check("2020-02-03").is_some());

        let not = date("date_not", &json!("2020-02-02")).unwrap();
        assert!(not.check("2020-02-02").is_some());
    }

    #[test]
    fn test_unparsable_cell_is_rule_error() {
        let rule = date("date_min", &json!("2000-01-01")).unwrap();
        assert!(rule.check("").unwrap().contains("not a valid date"));
    }

    #[test]
    fn test_unparsable_option_is_fatal() {
        let err = date("date_max", &json!("someday")).err().unwrap();
        assert_eq!(err.code(), "CSV_SCHEMA_INVALID_DATE");
    }

    #[test]
    fn test_date_format_is_strict() {
        let rule = date_format("date_format", &json!("%Y-%m-%d")).unwrap();
        assert!(rule.check("2024-01-05").is_none());
        assert!(rule.check("2024-1-5").is_some());
        assert!(rule.check("2024-01-05 10:00").is_some());

        let with_time = date_format("date_format", &json!("%Y-%m-%d %H:%M")).unwrap();
        assert!(with_time.check("2024-01-05 10:00").is_none());

        let time_only = date_format("date_format", &json!("%H:%M")).unwrap();
        assert!(time_only.check("23:59").is_none());
        assert!(time_only.check("24:00").is_some());

        assert!(date_format("date_format", &json!("%Q")).is_err());
    }

    #[test]
    fn test_is_date() {
        let rule = is_date("is_date", &json!(true)).unwrap();
        assert!(rule.check("2024-02-29").is_none());
        assert!(rule.check("tomorrow").is_none());
        assert!(rule.check("2023-02-29").is_some());
    }
}
