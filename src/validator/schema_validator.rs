//! Validation of a schema file on its own
//!
//! Resolves presets, builds the schema, constructs every bound rule and
//! checks each column's `example` against its cell rules. A fatal problem
//! becomes the single error of the file's suite.

use std::path::Path;

use serde_json::Value;

use crate::observability::{log_event_with_fields, Event};
use crate::report::{ErrorSuite, ValidationError};
use crate::rules::options::as_string;
use crate::rules::RuleCatalog;
use crate::schema::{PresetResolver, Schema, SchemaResult};

pub struct SchemaValidator<'a> {
    catalog: &'a RuleCatalog,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(catalog: &'a RuleCatalog) -> Self {
        Self { catalog }
    }

    /// Validates a schema file. Never fails: fatal problems are reported
    /// inside the returned suite.
    pub fn validate_file(&self, path: &Path) -> ErrorSuite {
        let subject = path.display().to_string();
        match PresetResolver::new().resolve_file(path) {
            Ok(tree) => self.validate_tree(&subject, &tree),
            Err(e) => {
                log_event_with_fields(
                    Event::SchemaRejected,
                    &[("schema", subject.as_str()), ("code", e.code())],
                );
                ErrorSuite::failure(subject, e.code(), e.to_string())
            }
        }
    }

    /// Validates an already resolved tree.
    pub fn validate_tree(&self, subject: &str, tree: &Value) -> ErrorSuite {
        match self.check(subject, tree) {
            Ok(suite) => suite,
            Err(e) => {
                log_event_with_fields(
                    Event::SchemaRejected,
                    &[("schema", subject), ("code", e.code())],
                );
                ErrorSuite::failure(subject, e.code(), e.to_string())
            }
        }
    }

    fn check(&self, subject: &str, tree: &Value) -> SchemaResult<ErrorSuite> {
        let schema = Schema::from_tree(tree)?;
        let mut suite = ErrorSuite::new(subject);

        for column in &schema.columns {
            let label = column.label();
            let cell = column
                .rules
                .iter()
                .map(|(code, option)| self.catalog.cell_binding(code, option, &label))
                .collect::<SchemaResult<Vec<_>>>()?;
            for (code, option) in &column.aggregate_rules {
                self.catalog.aggregate_binding(code, option, &label)?;
            }

            let Some(example) = &column.example else {
                continue;
            };
            let example = as_string(example);
            for binding in &cell {
                if let Some(error) = binding.validate(&example, ValidationError::UNDEFINED_LINE) {
                    suite.push(error);
                }
            }
        }

        Ok(suite)
    }
}
