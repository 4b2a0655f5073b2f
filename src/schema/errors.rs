//! Schema error types
//!
//! Every variant here is fatal: the schema cannot be used and no partial
//! result is produced.
//!
//! Error codes:
//! - CSV_SCHEMA_INVALID_ALIAS
//! - CSV_SCHEMA_UNKNOWN_PRESET
//! - CSV_SCHEMA_UNKNOWN_PRESET_COLUMN
//! - CSV_SCHEMA_MALFORMED_REFERENCE
//! - CSV_SCHEMA_PRESET_CYCLE
//! - CSV_SCHEMA_INVALID_DIALECT
//! - CSV_SCHEMA_UNKNOWN_RULE
//! - CSV_SCHEMA_INVALID_OPTION
//! - CSV_SCHEMA_INVALID_DATE
//! - CSV_SCHEMA_MALFORMED
//! - CSV_SCHEMA_IO

use std::io;

use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Fatal schema errors
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Preset alias \"{0}\" is invalid, it must match ^[a-z0-9_-]+$")]
    InvalidAlias(String),

    #[error("Preset \"{0}\" is not defined")]
    UnknownPreset(String),

    #[error("Column \"{column}\" not found in preset \"{alias}\"")]
    UnknownPresetColumn { alias: String, column: String },

    #[error("Preset reference \"{0}\" must look like \"<alias>/<column>\"")]
    MalformedReference(String),

    #[error("Preset cycle detected: {0}")]
    PresetCycle(String),

    #[error("Invalid CSV dialect: {0}")]
    InvalidDialect(String),

    #[error("Unknown rule \"{rule}\" in column \"{column}\"")]
    UnknownRule { rule: String, column: String },

    #[error("Invalid option for rule \"{rule}\": {reason}")]
    InvalidOption { rule: String, reason: String },

    #[error("Cannot parse date \"{0}\"")]
    InvalidDate(String),

    #[error("Malformed schema '{path}': {reason}")]
    Malformed { path: String, reason: String },

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl SchemaError {
    /// Create an invalid option error
    pub fn invalid_option(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::InvalidOption {
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    /// Create an error for a malformed schema tree
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns the string code of this error
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::InvalidAlias(_) => "CSV_SCHEMA_INVALID_ALIAS",
            SchemaError::UnknownPreset(_) => "CSV_SCHEMA_UNKNOWN_PRESET",
            SchemaError::UnknownPresetColumn { .. } => "CSV_SCHEMA_UNKNOWN_PRESET_COLUMN",
            SchemaError::MalformedReference(_) => "CSV_SCHEMA_MALFORMED_REFERENCE",
            SchemaError::PresetCycle(_) => "CSV_SCHEMA_PRESET_CYCLE",
            SchemaError::InvalidDialect(_) => "CSV_SCHEMA_INVALID_DIALECT",
            SchemaError::UnknownRule { .. } => "CSV_SCHEMA_UNKNOWN_RULE",
            SchemaError::InvalidOption { .. } => "CSV_SCHEMA_INVALID_OPTION",
            SchemaError::InvalidDate(_) => "CSV_SCHEMA_INVALID_DATE",
            SchemaError::Malformed { .. } => "CSV_SCHEMA_MALFORMED",
            SchemaError::Io { .. } => "CSV_SCHEMA_IO",
        }
    }

    /// Returns true for errors raised while resolving presets
    pub fn is_preset_error(&self) -> bool {
        matches!(
            self,
            SchemaError::InvalidAlias(_)
                | SchemaError::UnknownPreset(_)
                | SchemaError::UnknownPresetColumn { .. }
                | SchemaError::MalformedReference(_)
                | SchemaError::PresetCycle(_)
        )
    }
}
