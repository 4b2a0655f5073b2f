//! CLI argument definitions using clap
//!
//! Commands:
//! - csvaudit validate-csv --csv <path>... --schema <path>...
//! - csvaudit validate-schema --schema <path>...
//! - csvaudit debug-schema --schema <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::config::ReportFormat;

/// csvaudit - validate CSV files against declarative schemas
#[derive(Parser, Debug)]
#[command(name = "csvaudit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate CSV files, each against every given schema
    ValidateCsv {
        /// CSV file to validate (repeatable)
        #[arg(short, long, required = true, num_args = 1..)]
        csv: Vec<PathBuf>,

        /// Schema file, JSON or YAML (repeatable)
        #[arg(short, long, required = true, num_args = 1..)]
        schema: Vec<PathBuf>,

        /// Stop each file at its first error
        #[arg(short = 'Q', long)]
        quick_stop: bool,

        /// Number of files validated at once
        #[arg(short = 'T', long)]
        threads: Option<usize>,

        /// Report format
        #[arg(short, long, value_enum)]
        report: Option<ReportFormat>,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Log informational events to stderr
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate schema files and the examples they declare
    ValidateSchema {
        /// Schema file, JSON or YAML (repeatable)
        #[arg(short, long, required = true, num_args = 1..)]
        schema: Vec<PathBuf>,

        /// Report format
        #[arg(short, long, value_enum)]
        report: Option<ReportFormat>,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Log informational events to stderr
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print a schema with every preset resolved
    DebugSchema {
        /// Schema file, JSON or YAML
        #[arg(short, long)]
        schema: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_csv_repeatable_paths() {
        let cli = Cli::try_parse_from([
            "csvaudit",
            "validate-csv",
            "--csv",
            "a.csv",
            "--csv",
            "b.csv",
            "--schema",
            "s.yml",
            "-T",
            "2",
            "--report",
            "json",
        ])
        .unwrap();
        match cli.command {
            Command::ValidateCsv {
                csv,
                schema,
                threads,
                report,
                quick_stop,
                ..
            } => {
                assert_eq!(csv.len(), 2);
                assert_eq!(schema, [PathBuf::from("s.yml")]);
                assert_eq!(threads, Some(2));
                assert_eq!(report, Some(ReportFormat::Json));
                assert!(!quick_stop);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_schema_required() {
        assert!(Cli::try_parse_from(["csvaudit", "validate-csv", "--csv", "a.csv"]).is_err());
        assert!(Cli::try_parse_from(["csvaudit", "debug-schema"]).is_err());
    }
}
