//! Validation orchestration
//!
//! - [`CsvValidator`] streams one CSV file through the header, cell and
//!   aggregate phases of one schema
//! - [`SchemaValidator`] checks a schema file on its own
//!
//! Each file is validated strictly sequentially. Parallelism across files
//! belongs to the worker pool.

mod csv_validator;
mod errors;
mod reader;
mod schema_validator;
mod structural;

pub use csv_validator::CsvValidator;
pub use errors::{ValidateError, ValidateResult};
pub use reader::{Row, RowReader, Transcoder};
pub use schema_validator::SchemaValidator;
pub use structural::{codes, ColumnMapping, HeaderCheck, StructuralValidator};
