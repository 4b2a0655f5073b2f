//! CLI-specific error types
//!
//! A CLI error ends the process with a non-zero exit code. Rule and
//! structural failures are not CLI errors: they are reported and turn
//! the exit code to 1 through [`super::Outcome`].

use std::fmt;
use std::io;

use crate::pool::PoolError;
use crate::schema::SchemaError;
use crate::validator::ValidateError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdout, input files)
    IoError,
    /// Schema could not be loaded or resolved
    SchemaError,
    /// Fatal validation problem outside the worker pool
    ValidationFailed,
    /// Worker pool misuse
    PoolError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "CSV_CLI_CONFIG_ERROR",
            Self::IoError => "CSV_CLI_IO_ERROR",
            Self::SchemaError => "CSV_CLI_SCHEMA_ERROR",
            Self::ValidationFailed => "CSV_CLI_VALIDATION_FAILED",
            Self::PoolError => "CSV_CLI_POOL_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        Self::new(CliErrorCode::SchemaError, format!("{}: {}", e.code(), e))
    }
}

impl From<ValidateError> for CliError {
    fn from(e: ValidateError) -> Self {
        Self::new(CliErrorCode::ValidationFailed, format!("{}: {}", e.code(), e))
    }
}

impl From<PoolError> for CliError {
    fn from(e: PoolError) -> Self {
        Self::new(CliErrorCode::PoolError, format!("{}: {}", e.code(), e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
