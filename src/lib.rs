//! csvaudit - validate CSV files against declarative schemas
//!
//! A schema (JSON or YAML) declares the CSV dialect, structural rules and
//! one entry per column with cell rules and aggregate rules. Presets let
//! schemas inherit settings and columns from other schemas.
//!
//! - [`schema`]: loading, preset resolution, typed schema
//! - [`rules`]: the rule catalog
//! - [`validator`]: per-file validation
//! - [`pool`]: parallel execution across files
//! - [`report`]: collected errors

pub mod cli;
pub mod observability;
pub mod pool;
pub mod report;
pub mod rules;
pub mod schema;
pub mod validator;
