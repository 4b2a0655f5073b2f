//! Rule catalog and dispatch
//!
//! Two kinds of rules exist:
//!
//! - **Cell rules** judge one cell value of one row.
//! - **Aggregate rules** judge the ordered list of every value of a column.
//!
//! Rule implementations are stateless once constructed. Options are coerced
//! at construction time, so configuration problems (bad regex, unparsable
//! date) surface as fatal [`SchemaError`]s before any row is read.
//!
//! Rules are looked up through an explicit static table in [`RuleCatalog`];
//! there is no discovery and no global cache.

mod aggregate;
mod binding;
mod catalog;
mod cell;
pub mod options;

pub use binding::{AggregateBinding, CellBinding};
pub use catalog::{AggregateCtor, CellCtor, RuleCatalog, AGGREGATE_PREFIX};
pub use cell::values::compile_pattern;

use crate::schema::SchemaError;

use self::options::format_number;

/// A rule judging one cell value.
pub trait CellRule: Send + Sync {
    /// Returns a failure message, or `None` when the value passes.
    fn check(&self, value: &str) -> Option<String>;
}

/// A rule judging every value of one column at once.
pub trait AggregateRule: Send + Sync {
    /// Returns a failure message, or `None` when the column passes.
    fn check(&self, values: &[String]) -> Option<String>;
}

/// Comparison variant of a rule family, derived from the rule code suffix:
/// `<base>` is exact, `<base>_not`, `<base>_min`, `<base>_max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Exact,
    Not,
    Min,
    Max,
}

impl Comparison {
    pub fn from_code(code: &str) -> Self {
        if code.ends_with("_not") {
            Comparison::Not
        } else if code.ends_with("_min") {
            Comparison::Min
        } else if code.ends_with("_max") {
            Comparison::Max
        } else {
            Comparison::Exact
        }
    }

    /// Strict comparison, no epsilon.
    pub fn holds<T: PartialOrd>(self, actual: T, expected: T) -> bool {
        match self {
            Comparison::Exact => actual == expected,
            Comparison::Not => actual != expected,
            Comparison::Min => actual >= expected,
            Comparison::Max => actual <= expected,
        }
    }

    fn relation(self) -> &'static str {
        match self {
            Comparison::Exact => "not equal to the expected",
            Comparison::Not => "equal to the not expected",
            Comparison::Min => "less than the expected",
            Comparison::Max => "greater than the expected",
        }
    }

    /// Builds the failure message for a comparison that did not hold.
    pub fn describe(self, subject: &str, actual: &str, expected: &str) -> String {
        format!(
            "{} is \"<c>{}</c>\", which is {} \"<green>{}</green>\"",
            subject,
            actual,
            self.relation(),
            expected
        )
    }
}

/// Measures a cell and compares the measure against an expected number.
///
/// Shared by every numeric cell family (length, word count, value, precision).
struct Measured {
    comparison: Comparison,
    expected: f64,
    expected_label: String,
    /// `None` compares the value itself, `Some("length")` reads
    /// "The length of the value ...".
    noun: Option<&'static str>,
    measure: fn(&str) -> Result<f64, String>,
}

impl CellRule for Measured {
    fn check(&self, value: &str) -> Option<String> {
        let actual = match (self.measure)(value) {
            Ok(actual) => actual,
            Err(message) => return Some(message),
        };
        if self.comparison.holds(actual, self.expected) {
            return None;
        }
        let subject = match self.noun {
            Some(noun) => format!("The {} of the value \"<c>{}</c>\"", noun, value),
            None => "The value".to_string(),
        };
        Some(
            self.comparison
                .describe(&subject, &format_number(actual), &self.expected_label),
        )
    }
}

/// Rejects negative expectations for counting families.
fn non_negative(code: &str, expected: f64) -> Result<f64, SchemaError> {
    if expected < 0.0 {
        return Err(SchemaError::invalid_option(code, "expected a non-negative number"));
    }
    Ok(expected)
}
