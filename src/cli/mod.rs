//! CLI module for csvaudit
//!
//! Provides command-line interface for:
//! - validate-csv: Validate CSV files against schemas
//! - validate-schema: Check schema files and their examples
//! - debug-schema: Print a schema with presets resolved

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{debug_schema, run, run_command, validate_csv, validate_schema, Outcome};
pub use config::{ReportFormat, RunConfig};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{render_json, render_text, strip_markers, write_json, write_report};
