//! csvaudit CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`. Exit codes:
//! 0 when everything validated, 1 when errors were reported or a fatal
//! problem stopped the run.

use csvaudit::cli;

fn main() {
    match cli::run() {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
