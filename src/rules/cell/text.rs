//! Length, shape, word count and substring rules

use serde_json::Value;

use crate::rules::options::{as_bool, as_int, as_string, as_string_list};
use crate::rules::{non_negative, CellRule, Comparison, Measured};
use crate::schema::{SchemaError, SchemaResult};

fn measured(
    code: &'static str,
    option: &Value,
    noun: &'static str,
    measure: fn(&str) -> Result<f64, String>,
) -> SchemaResult<Box<dyn CellRule>> {
    let expected = non_negative(code, as_int(option) as f64)?;
    Ok(Box::new(Measured {
        comparison: Comparison::from_code(code),
        expected,
        expected_label: as_string(option),
        noun: Some(noun),
        measure,
    }))
}

fn char_count(value: &str) -> Result<f64, String> {
    Ok(value.chars().count() as f64)
}

/// Words are whitespace-separated tokens holding at least one letter or digit.
fn word_count(value: &str) -> Result<f64, String> {
    Ok(value
        .split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count() as f64)
}

/// `length`, `length_not`, `length_min`, `length_max`
pub fn length(code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    measured(code, option, "length", char_count)
}

/// `word_count`, `word_count_not`, `word_count_min`, `word_count_max`
pub fn words(code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    measured(code, option, "word count", word_count)
}

#[derive(Clone, Copy)]
enum Shape {
    Trimmed,
    Lowercase,
    Uppercase,
    Capitalized,
}

struct ShapeRule {
    shape: Shape,
    enabled: bool,
}

impl CellRule for ShapeRule {
    fn check(&self, value: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let (ok, what) = match self.shape {
            Shape::Trimmed => (value == value.trim(), "trimmed"),
            Shape::Lowercase => (value == value.to_lowercase(), "lowercase"),
            Shape::Uppercase => (value == value.to_uppercase(), "uppercase"),
            Shape::Capitalized => (
                value.chars().next().map_or(true, |c| !c.is_lowercase()),
                "capitalized",
            ),
        };
        if ok {
            return None;
        }
        Some(format!("Value \"<c>{}</c>\" is not {}", value, what))
    }
}

fn shape(option: &Value, shape: Shape) -> SchemaResult<Box<dyn CellRule>> {
    Ok(Box::new(ShapeRule {
        shape,
        enabled: as_bool(option),
    }))
}

pub fn is_trimmed(_code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    shape(option, Shape::Trimmed)
}

pub fn is_lowercase(_code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    shape(option, Shape::Lowercase)
}

pub fn is_uppercase(_code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    shape(option, Shape::Uppercase)
}

pub fn is_capitalize(_code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    shape(option, Shape::Capitalized)
}

#[derive(Clone, Copy)]
enum Containment {
    Contains,
    Any,
    All,
    Prefix,
    Suffix,
}

struct Substring {
    mode: Containment,
    needles: Vec<String>,
}

impl CellRule for Substring {
    fn check(&self, value: &str) -> Option<String> {
        let ok = match self.mode {
            Containment::Contains | Containment::All => {
                self.needles.iter().all(|n| value.contains(n.as_str()))
            }
            Containment::Any => self.needles.iter().any(|n| value.contains(n.as_str())),
            Containment::Prefix => value.starts_with(self.needles[0].as_str()),
            Containment::Suffix => value.ends_with(self.needles[0].as_str()),
        };
        if ok {
            return None;
        }
        let expectation = match self.mode {
            Containment::Contains => "contain",
            Containment::Any => "contain any of",
            Containment::All => "contain all of",
            Containment::Prefix => "start with",
            Containment::Suffix => "end with",
        };
        let listed = matches!(self.mode, Containment::Any | Containment::All);
        let needles = if self.needles.len() == 1 && !listed {
            self.needles[0].clone()
        } else {
            format!("[\"{}\"]", self.needles.join("\", \""))
        };
        Some(format!(
            "Value \"<c>{}</c>\" must {} \"<green>{}</green>\"",
            value, expectation, needles
        ))
    }
}

fn substring(
    code: &'static str,
    option: &Value,
    mode: Containment,
) -> SchemaResult<Box<dyn CellRule>> {
    let needles = match mode {
        Containment::Any | Containment::All => as_string_list(option),
        _ => vec![as_string(option)],
    };
    if needles.is_empty() || needles.iter().any(String::is_empty) {
        return Err(SchemaError::invalid_option(code, "expected non-empty text"));
    }
    Ok(Box::new(Substring { mode, needles }))
}

pub fn contains(code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    substring(code, option, Containment::Contains)
}

pub fn contains_one(code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    substring(code, option, Containment::Any)
}

pub fn contains_all(code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    substring(code, option, Containment::All)
}

pub fn starts_with(code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    substring(code, option, Containment::Prefix)
}

pub fn ends_with(code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    substring(code, option, Containment::Suffix)
}
