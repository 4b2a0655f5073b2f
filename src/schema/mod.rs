//! Schema subsystem for csvaudit
//!
//! A schema is decoded from JSON or YAML, resolved into a preset-free tree,
//! and built into an immutable [`Schema`].
//!
//! # Design Principles
//!
//! - Presets resolve once per resolver and are memoized
//! - Cycles between presets are rejected, never followed
//! - Every problem found here is fatal; no partial schema is produced

mod errors;
mod loader;
mod resolver;
mod types;

pub use errors::{SchemaError, SchemaResult};
pub use loader::{SchemaFormat, SchemaLoader};
pub use resolver::{deep_merge, is_valid_alias, PresetResolver};
pub use types::{Column, CsvDialect, Encoding, Schema, StructuralRules};
