//! Run configuration
//!
//! Optional JSON file. Every field has a default, so `{}` is a valid
//! configuration. Command line flags override file values.

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::observability::{log_event_with_fields, Event, Severity};

use super::errors::{CliError, CliResult};

/// Report rendering on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Maximum number of files validated at once (default 1, sequential)
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Stop each file at its first error (default false)
    #[serde(default)]
    pub quick_stop: bool,

    /// Report format (default text)
    #[serde(default)]
    pub report: ReportFormat,

    /// Minimum log severity written to stderr (default warn)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_threads() -> usize {
    1
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            quick_stop: false,
            report: ReportFormat::default(),
            log_level: default_log_level(),
        }
    }
}

impl RunConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: RunConfig = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        let threads = config.threads.to_string();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("path", path.display().to_string().as_str()),
                ("threads", threads.as_str()),
            ],
        );

        Ok(config)
    }

    /// Loads the file if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> CliResult<()> {
        if self.threads == 0 {
            return Err(CliError::config_error("threads must be >= 1"));
        }

        self.severity()?;

        Ok(())
    }

    /// Parsed `log_level`.
    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level.parse().map_err(|_| {
            CliError::config_error(format!(
                "Invalid log_level: '{}'. Expected trace, info, warn, error or fatal.",
                self.log_level
            ))
        })
    }
}
