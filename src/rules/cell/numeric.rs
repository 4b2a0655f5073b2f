//! Numeric value, integer/float shape and decimal precision rules

use serde_json::Value;

use crate::rules::options::{as_float, as_int, as_string, parse_number};
use crate::rules::{non_negative, CellRule, Comparison, Measured};
use crate::schema::SchemaResult;

fn numeric_value(value: &str) -> Result<f64, String> {
    parse_number(value).ok_or_else(|| format!("Value \"<c>{}</c>\" is not a valid number", value))
}

/// Digits after the decimal point, taken from the raw text so trailing zeros
/// count. No decimal point means precision 0.
pub(crate) fn precision_of(value: &str) -> Result<f64, String> {
    numeric_value(value)?;
    let mantissa = value.split(['e', 'E']).next().unwrap_or(value);
    Ok(mantissa
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.chars().count()) as f64)
}

/// `num`, `num_not`, `num_min`, `num_max`
pub fn num(code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    Ok(Box::new(Measured {
        comparison: Comparison::from_code(code),
        expected: as_float(option),
        expected_label: as_string(option),
        noun: None,
        measure: numeric_value,
    }))
}

/// `precision`, `precision_not`, `precision_min`, `precision_max`
pub fn precision(code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    let expected = non_negative(code, as_int(option) as f64)?;
    Ok(Box::new(Measured {
        comparison: Comparison::from_code(code),
        expected,
        expected_label: as_string(option),
        noun: Some("precision"),
        measure: precision_of,
    }))
}

struct IsInteger;

impl CellRule for IsInteger {
    fn check(&self, value: &str) -> Option<String> {
        let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(format!("Value \"<c>{}</c>\" is not an integer", value))
    }
}

pub fn is_int(_code: &'static str, _option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    Ok(Box::new(IsInteger))
}

struct IsFloat;

impl CellRule for IsFloat {
    fn check(&self, value: &str) -> Option<String> {
        if parse_number(value).is_some() {
            return None;
        }
        Some(format!("Value \"<c>{}</c>\" is not a float number", value))
    }
}

pub fn is_float(_code: &'static str, _option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    Ok(Box::new(IsFloat))
}
