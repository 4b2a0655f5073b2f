//! Report output
//!
//! - Reports go to stdout, logs go to stderr
//! - Text: one block per task, emphasis markers stripped
//! - JSON: one object keyed by task id, markers kept
//! - UTF-8 only

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::{self, Write};

use serde_json::{json, Value};

use super::config::ReportFormat;
use super::errors::CliResult;
use crate::report::{ErrorSuite, ValidationError};

const MARKERS: [&str; 4] = ["<c>", "</c>", "<green>", "</green>"];

/// Removes the inline emphasis markers from a message.
pub fn strip_markers(message: &str) -> String {
    MARKERS
        .iter()
        .fold(message.to_string(), |acc, marker| acc.replace(marker, ""))
}

fn render_error(out: &mut String, error: &ValidationError) {
    let line = if error.has_line() {
        error.line().to_string()
    } else {
        "-".to_string()
    };
    let column = if error.column().is_empty() {
        "-"
    } else {
        error.column()
    };
    let _ = writeln!(
        out,
        "  line {}, column {}, rule {}: {}",
        line,
        column,
        error.rule(),
        strip_markers(error.message())
    );
}

/// Renders the text report.
pub fn render_text(results: &BTreeMap<String, ErrorSuite>) -> String {
    let mut out = String::new();
    let mut failed = 0;
    let mut total_errors = 0;

    for (id, suite) in results {
        if suite.is_empty() {
            let _ = writeln!(out, "{}: OK", id);
            continue;
        }
        failed += 1;
        total_errors += suite.count();
        let noun = if suite.count() == 1 { "error" } else { "errors" };
        let _ = writeln!(out, "{}: {} {}", id, suite.count(), noun);
        for error in suite {
            render_error(&mut out, error);
        }
    }

    let _ = writeln!(
        out,
        "Found {} error(s) in {} of {} task(s)",
        total_errors,
        failed,
        results.len()
    );
    out
}

/// Renders the JSON report.
pub fn render_json(results: &BTreeMap<String, ErrorSuite>) -> Value {
    let valid = results.values().all(ErrorSuite::is_empty);
    let tasks: serde_json::Map<String, Value> = results
        .iter()
        .map(|(id, suite)| {
            (
                id.clone(),
                json!({
                    "subject": suite.subject(),
                    "valid": suite.is_empty(),
                    "errors": suite.errors(),
                }),
            )
        })
        .collect();

    json!({
        "valid": valid,
        "results": tasks,
    })
}

/// Write a report to stdout
pub fn write_report(results: &BTreeMap<String, ErrorSuite>, format: ReportFormat) -> CliResult<()> {
    let mut stdout = io::stdout();
    match format {
        ReportFormat::Text => write!(stdout, "{}", render_text(results))?,
        ReportFormat::Json => {
            serde_json::to_writer(&mut stdout, &render_json(results))?;
            writeln!(stdout)?;
        }
    }
    stdout.flush()?;

    Ok(())
}

/// Write an indented JSON value to stdout
pub fn write_json(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
