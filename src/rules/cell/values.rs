//! Existence and value-set rules

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::rules::options::{as_bool, as_string, as_string_list};
use crate::rules::CellRule;
use crate::schema::{SchemaError, SchemaResult};

struct NotEmpty {
    enabled: bool,
}

impl CellRule for NotEmpty {
    fn check(&self, value: &str) -> Option<String> {
        if self.enabled && value.is_empty() {
            return Some("Value is empty".to_string());
        }
        None
    }
}

pub fn not_empty(_code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    Ok(Box::new(NotEmpty {
        enabled: as_bool(option),
    }))
}

struct ExactValue {
    expected: String,
}

impl CellRule for ExactValue {
    fn check(&self, value: &str) -> Option<String> {
        if value == self.expected {
            return None;
        }
        Some(format!(
            "Value \"<c>{}</c>\" is not strict equal to \"<green>{}</green>\"",
            value, self.expected
        ))
    }
}

pub fn exact_value(_code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    Ok(Box::new(ExactValue {
        expected: as_string(option),
    }))
}

struct ValueSet {
    values: Vec<String>,
    allow: bool,
}

impl CellRule for ValueSet {
    fn check(&self, value: &str) -> Option<String> {
        let listed = self.values.iter().any(|v| v == value);
        if listed == self.allow {
            return None;
        }
        let verb = if self.allow { "Allowed" } else { "Not allowed" };
        Some(format!(
            "Value \"<c>{}</c>\" is not allowed. {}: {}",
            value,
            verb,
            render_list(&self.values)
        ))
    }
}

fn value_set(code: &'static str, option: &Value, allow: bool) -> SchemaResult<Box<dyn CellRule>> {
    let values = as_string_list(option);
    if option.is_null() || values.is_empty() {
        return Err(SchemaError::invalid_option(code, "expected a non-empty list of values"));
    }
    Ok(Box::new(ValueSet { values, allow }))
}

pub fn allow_values(code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    value_set(code, option, true)
}

pub fn not_allow_values(code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    value_set(code, option, false)
}

struct Pattern {
    source: String,
    regex: Regex,
}

impl CellRule for Pattern {
    fn check(&self, value: &str) -> Option<String> {
        if self.regex.is_match(value) {
            return None;
        }
        Some(format!(
            "Value \"<c>{}</c>\" does not match the pattern \"<green>{}</green>\"",
            value, self.source
        ))
    }
}

/// Accepts a bare pattern or the delimited `/pattern/flags` form.
pub fn regex(code: &'static str, option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    let source = as_string(option);
    if source.is_empty() {
        return Err(SchemaError::invalid_option(code, "expected a non-empty pattern"));
    }
    let regex = compile_pattern(&source)
        .map_err(|e| SchemaError::invalid_option(code, format!("invalid pattern: {}", e)))?;
    Ok(Box::new(Pattern { source, regex }))
}

/// Compiles a bare pattern or the delimited `/pattern/flags` form.
pub fn compile_pattern(source: &str) -> Result<Regex, regex::Error> {
    let delimited = source
        .strip_prefix('/')
        .and_then(|rest| rest.rfind('/').map(|end| (&rest[..end], &rest[end + 1..])))
        .filter(|(_, flags)| flags.chars().all(|c| "imsxu".contains(c)));

    match delimited {
        Some((pattern, flags)) => RegexBuilder::new(pattern)
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .ignore_whitespace(flags.contains('x'))
            .build(),
        None => Regex::new(source),
    }
}

fn render_list(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| format!("\"{}\"", v)).collect();
    format!("[{}]", quoted.join(", "))
}
