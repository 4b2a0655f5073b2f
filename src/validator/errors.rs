//! # Validator Errors
//!
//! Per-file fatal errors. Rule failures are never errors here; they are
//! collected into an [`ErrorSuite`](crate::report::ErrorSuite).

use std::io;

use thiserror::Error;

use crate::schema::SchemaError;

/// Result type for validation runs
pub type ValidateResult<T> = Result<T, ValidateError>;

/// Errors that stop one file from being validated at all
#[derive(Debug, Error)]
pub enum ValidateError {
    /// Schema could not be resolved, built or compiled
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// CSV file could not be read
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// CSV syntax could not be parsed
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// Bytes are not valid in the declared encoding
    #[error("File '{path}' is not valid {encoding}")]
    Encoding { path: String, encoding: String },
}

impl ValidateError {
    /// Returns the string code of this error
    pub fn code(&self) -> &'static str {
        match self {
            ValidateError::Schema(e) => e.code(),
            ValidateError::Io { .. } => "CSV_VALIDATE_IO",
            ValidateError::Csv(_) => "CSV_VALIDATE_PARSE",
            ValidateError::Encoding { .. } => "CSV_VALIDATE_ENCODING",
        }
    }
}
