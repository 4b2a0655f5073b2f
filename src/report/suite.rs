//! ValidationError and ErrorSuite

use std::fmt;
use std::ops::Index;

use serde::Serialize;

/// A single collected validation failure.
///
/// The message may embed inline emphasis markers such as `<c>..</c>` or
/// `<green>..</green>`. They are opaque here and interpreted by renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    rule: String,
    message: String,
    column: String,
    line: u64,
}

impl ValidationError {
    /// Line value for errors that are not tied to a CSV row
    /// (schema-level and aggregate errors).
    pub const UNDEFINED_LINE: u64 = 0;

    pub fn new(
        rule: impl Into<String>,
        message: impl Into<String>,
        column: impl Into<String>,
        line: u64,
    ) -> Self {
        Self {
            rule: rule.into(),
            message: message.into(),
            column: column.into(),
            line,
        }
    }

    /// Builds the human column label `"<offset>:<name>"`.
    pub fn column_label(offset: usize, name: &str) -> String {
        format!("{}:{}", offset, name)
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn line(&self) -> u64 {
        self.line
    }

    /// Returns true if the error is attached to a concrete CSV line.
    pub fn has_line(&self) -> bool {
        self.line != Self::UNDEFINED_LINE
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_line() {
            write!(f, "\"{}\" at line {}", self.rule, self.line)?;
        } else {
            write!(f, "\"{}\"", self.rule)?;
        }
        if !self.column.is_empty() {
            write!(f, ", column \"{}\"", self.column)?;
        }
        write!(f, ". {}.", self.message)
    }
}

/// Ordered list of errors for one subject.
///
/// Order is append order. Entries are never reordered or deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorSuite {
    subject: String,
    errors: Vec<ValidationError>,
}

impl ErrorSuite {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            errors: Vec::new(),
        }
    }

    /// Creates a suite holding one synthetic error describing a failure
    /// that prevented the subject from being validated at all.
    pub fn failure(subject: impl Into<String>, rule: &str, message: impl Into<String>) -> Self {
        let mut suite = Self::new(subject);
        suite.push(ValidationError::new(
            rule,
            message,
            "",
            ValidationError::UNDEFINED_LINE,
        ));
        suite
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Appends every error of `other`, keeping both orders.
    pub fn concat(&mut self, other: ErrorSuite) {
        self.errors.extend(other.errors);
    }

    pub fn count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ValidationError> {
        self.errors.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }
}

impl Index<usize> for ErrorSuite {
    type Output = ValidationError;

    fn index(&self, index: usize) -> &Self::Output {
        &self.errors[index]
    }
}

impl<'a> IntoIterator for &'a ErrorSuite {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
