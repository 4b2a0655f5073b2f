//! CLI command implementations
//!
//! Every command follows the same sequence:
//!
//! 1. Load the run configuration, flags override file values
//! 2. Set the logger threshold
//! 3. Register one pool task per unit of work
//! 4. Run the pool and write the report
//!
//! Fatal problems inside a task become that task's failure suite, so one
//! bad file never hides the results of the others.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::args::{Cli, Command};
use super::config::RunConfig;
use super::errors::CliResult;
use super::io::{write_json, write_report};
use crate::observability::{Logger, Severity};
use crate::pool::WorkerPool;
use crate::report::ErrorSuite;
use crate::rules::RuleCatalog;
use crate::schema::{PresetResolver, Schema};
use crate::validator::{CsvValidator, SchemaValidator};

/// Result of a command that completed without a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to report
    Valid,
    /// At least one validation error was reported
    Invalid,
}

impl Outcome {
    fn from_results(results: &BTreeMap<String, ErrorSuite>) -> Self {
        if results.values().all(ErrorSuite::is_empty) {
            Outcome::Valid
        } else {
            Outcome::Invalid
        }
    }

    /// Process exit code
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Valid => 0,
            Outcome::Invalid => 1,
        }
    }
}

/// Run the CLI with parsed arguments
pub fn run() -> CliResult<Outcome> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run a specific command
pub fn run_command(command: Command) -> CliResult<Outcome> {
    match command {
        Command::ValidateCsv {
            csv,
            schema,
            quick_stop,
            threads,
            report,
            config,
            verbose,
        } => {
            let mut config = RunConfig::load_or_default(config.as_deref())?;
            if let Some(threads) = threads {
                config.threads = threads;
            }
            config.quick_stop |= quick_stop;
            if let Some(report) = report {
                config.report = report;
            }
            apply_log_level(&config, verbose)?;

            let results = validate_csv(&csv, &schema, &config)?;
            write_report(&results, config.report)?;
            Ok(Outcome::from_results(&results))
        }
        Command::ValidateSchema {
            schema,
            report,
            config,
            verbose,
        } => {
            let mut config = RunConfig::load_or_default(config.as_deref())?;
            if let Some(report) = report {
                config.report = report;
            }
            apply_log_level(&config, verbose)?;

            let results = validate_schema(&schema, &config)?;
            write_report(&results, config.report)?;
            Ok(Outcome::from_results(&results))
        }
        Command::DebugSchema { schema } => debug_schema(&schema),
    }
}

fn apply_log_level(config: &RunConfig, verbose: bool) -> CliResult<()> {
    config.validate()?;
    let severity = if verbose {
        Severity::Info
    } else {
        config.severity()?
    };
    Logger::set_min_severity(severity);
    Ok(())
}

/// Task id of one (csv, schema) pair. The schema is only named when
/// several schemas are in play.
fn task_id(csv: &Path, schema: &Path, schemas: usize) -> String {
    if schemas == 1 {
        csv.display().to_string()
    } else {
        format!("{} ({})", csv.display(), schema.display())
    }
}

/// Validates every CSV file against every schema.
///
/// Each task loads its own schema; only the rule catalog is shared.
pub fn validate_csv(
    csvs: &[PathBuf],
    schemas: &[PathBuf],
    config: &RunConfig,
) -> CliResult<BTreeMap<String, ErrorSuite>> {
    let catalog = Arc::new(RuleCatalog::new());
    let mut pool = WorkerPool::new(config.threads)?;

    for schema_path in schemas {
        for csv_path in csvs {
            let id = task_id(csv_path, schema_path, schemas.len());
            let catalog = Arc::clone(&catalog);
            let schema_path = schema_path.clone();
            let csv_path = csv_path.clone();
            let quick_stop = config.quick_stop;

            pool.add_task(id, move || {
                let schema = Schema::load(&schema_path)?;
                CsvValidator::new(&catalog, &schema)
                    .quick_stop(quick_stop)
                    .validate(&csv_path)
            })?;
        }
    }

    Ok(pool.run())
}

/// Validates schema files on their own.
pub fn validate_schema(
    schemas: &[PathBuf],
    config: &RunConfig,
) -> CliResult<BTreeMap<String, ErrorSuite>> {
    let catalog = Arc::new(RuleCatalog::new());
    let mut pool = WorkerPool::new(config.threads)?;

    for schema_path in schemas {
        let catalog = Arc::clone(&catalog);
        let path = schema_path.clone();
        pool.add_task(schema_path.display().to_string(), move || {
            Ok(SchemaValidator::new(&catalog).validate_file(&path))
        })?;
    }

    Ok(pool.run())
}

/// Prints the fully resolved schema tree.
pub fn debug_schema(schema: &Path) -> CliResult<Outcome> {
    let tree = PresetResolver::new().resolve_file(schema)?;
    write_json(&tree)?;
    Ok(Outcome::Valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_validate_csv_pairs() {
        let dir = TempDir::new().unwrap();
        let schema = write(
            &dir,
            "seq.yml",
            "columns:\n  - name: seq\n    rules:\n      num_min: 2\n",
        );
        let good = write(&dir, "good.csv", "seq\n2\n3\n");
        let bad = write(&dir, "bad.csv", "seq\n1\n2\n");

        let config = RunConfig {
            threads: 2,
            ..RunConfig::default()
        };
        let results = validate_csv(&[good.clone(), bad.clone()], &[schema], &config).unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[&good.display().to_string()].is_empty());
        let suite = &results[&bad.display().to_string()];
        assert_eq!(suite.count(), 1);
        assert_eq!(suite[0].line(), 2);
        assert_eq!(Outcome::from_results(&results), Outcome::Invalid);
    }

    #[test]
    fn test_broken_schema_isolated_to_its_tasks() {
        let dir = TempDir::new().unwrap();
        let good = write(&dir, "good.yml", "columns:\n  - name: a\n");
        let broken = write(
            &dir,
            "broken.yml",
            "columns:\n  - name: a\n    rules:\n      nope: 1\n",
        );
        let csv = write(&dir, "a.csv", "a\n1\n");

        let results =
            validate_csv(&[csv.clone()], &[good.clone(), broken.clone()], &RunConfig::default())
                .unwrap();

        assert!(results[&task_id(&csv, &good, 2)].is_empty());
        let failed = &results[&task_id(&csv, &broken, 2)];
        assert_eq!(failed.count(), 1);
        assert!(failed[0].message().contains("CSV_SCHEMA_UNKNOWN_RULE"));
    }

    #[test]
    fn test_duplicate_csv_is_fatal() {
        let dir = TempDir::new().unwrap();
        let schema = write(&dir, "s.yml", "columns:\n  - name: a\n");
        let csv = write(&dir, "a.csv", "a\n1\n");
        let err = validate_csv(&[csv.clone(), csv], &[schema], &RunConfig::default()).unwrap_err();
        assert_eq!(err.code_str(), "CSV_CLI_POOL_ERROR");
    }

    #[test]
    fn test_validate_schema_reports_examples() {
        let dir = TempDir::new().unwrap();
        let schema = write(
            &dir,
            "s.json",
            r#"{"columns": [{"name": "id", "example": "x", "rules": {"is_int": true}}]}"#,
        );
        let results = validate_schema(&[schema.clone()], &RunConfig::default()).unwrap();
        let suite = &results[&schema.display().to_string()];
        assert_eq!(suite.count(), 1);
        assert_eq!(suite[0].rule(), "is_int");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::Valid.exit_code(), 0);
        assert_eq!(Outcome::Invalid.exit_code(), 1);
    }
}
