//! Rule bindings
//!
//! A binding ties one constructed rule to its code and the column it belongs
//! to, and applies the enablement policy before the rule runs:
//!
//! - `is_*` cell rules are skipped when their option is false or the cell
//!   is empty
//! - `is_*` aggregate rules are skipped when their option is false or the
//!   column has no values
//! - every other rule always runs, empty values included

use serde_json::Value;

use super::options::as_bool;
use super::{AggregateRule, CellRule};
use crate::report::ValidationError;

fn is_predicate(code: &str) -> bool {
    code.strip_prefix(super::AGGREGATE_PREFIX)
        .unwrap_or(code)
        .starts_with("is_")
}

/// A cell rule bound to a column.
pub struct CellBinding {
    code: String,
    column: String,
    predicate: bool,
    enabled: bool,
    rule: Box<dyn CellRule>,
}

impl CellBinding {
    pub(super) fn new(code: &str, column: String, option: &Value, rule: Box<dyn CellRule>) -> Self {
        Self {
            code: code.to_string(),
            column,
            predicate: is_predicate(code),
            enabled: as_bool(option),
            rule,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Validates one cell. `line` is the 1-based CSV line, or
    /// [`ValidationError::UNDEFINED_LINE`] for values not read from a file.
    pub fn validate(&self, value: &str, line: u64) -> Option<ValidationError> {
        if self.predicate && (!self.enabled || value.is_empty()) {
            return None;
        }
        self.rule
            .check(value)
            .map(|message| ValidationError::new(&self.code, message, &self.column, line))
    }
}

/// An aggregate rule bound to a column.
pub struct AggregateBinding {
    code: String,
    column: String,
    predicate: bool,
    enabled: bool,
    rule: Box<dyn AggregateRule>,
}

impl AggregateBinding {
    pub(super) fn new(
        code: &str,
        column: String,
        option: &Value,
        rule: Box<dyn AggregateRule>,
    ) -> Self {
        Self {
            code: code.to_string(),
            column,
            predicate: is_predicate(code),
            enabled: as_bool(option),
            rule,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Validates every value of the column. Aggregate errors carry no line.
    pub fn validate(&self, values: &[String]) -> Option<ValidationError> {
        if self.predicate && (!self.enabled || values.is_empty()) {
            return None;
        }
        self.rule.check(values).map(|message| {
            ValidationError::new(
                &self.code,
                message,
                &self.column,
                ValidationError::UNDEFINED_LINE,
            )
        })
    }
}


impl std::fmt::Debug for CellBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellBinding")
            .field("code", &self.code)
            .field("column", &self.column)
            .field("predicate", &self.predicate)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for AggregateBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregateBinding")
            .field("code", &self.code)
            .field("column", &self.column)
            .field("predicate", &self.predicate)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
