//! Validation of one CSV file against one schema
//!
//! Three phases, in order, feeding one [`ErrorSuite`]:
//!
//! 1. header: filename pattern, header names, order and extras
//! 2. cells: rows in file order, then schema columns, then declared rules
//! 3. aggregates: schema columns, then declared rules, over buffered values
//!
//! Errors are appended in that order and never reordered. With quick-stop
//! the run ends at the first error produced anywhere.

use std::path::Path;

use crate::observability::ObservationScope;
use crate::report::{ErrorSuite, ValidationError};
use crate::rules::{AggregateBinding, CellBinding, RuleCatalog};
use crate::schema::Schema;

use super::errors::ValidateResult;
use super::reader::{Row, RowReader};
use super::structural::{ColumnMapping, StructuralValidator};

/// Rule bindings of one schema column.
struct BoundColumn {
    offset: Option<usize>,
    cell: Vec<CellBinding>,
    aggregate: Vec<AggregateBinding>,
    values: Vec<String>,
}

/// Signals that quick-stop ended the run.
struct Stopped;

/// Validates CSV files against one schema.
pub struct CsvValidator<'a> {
    catalog: &'a RuleCatalog,
    schema: &'a Schema,
    quick_stop: bool,
}

impl<'a> CsvValidator<'a> {
    pub fn new(catalog: &'a RuleCatalog, schema: &'a Schema) -> Self {
        Self {
            catalog,
            schema,
            quick_stop: false,
        }
    }

    /// Stop at the first error.
    pub fn quick_stop(mut self, enabled: bool) -> Self {
        self.quick_stop = enabled;
        self
    }

    /// Validates one CSV file.
    ///
    /// # Errors
    ///
    /// Only fatal problems are returned as errors: unreadable file, bad
    /// encoding, broken CSV syntax, unknown rule or invalid rule option.
    /// Every rule or structural failure is collected in the suite.
    pub fn validate(&self, csv_path: &Path) -> ValidateResult<ErrorSuite> {
        let csv = csv_path.display().to_string();
        let scope = ObservationScope::with_fields(
            "CSV_VALIDATION",
            &[("csv", csv.as_str()), ("schema", self.schema.name.as_str())],
        );

        match self.run(csv_path) {
            Ok(suite) => {
                let errors = suite.count().to_string();
                scope.complete_with_fields(&[("errors", errors.as_str())]);
                Ok(suite)
            }
            Err(e) => {
                scope.fail(&e.to_string());
                Err(e)
            }
        }
    }

    fn run(&self, csv_path: &Path) -> ValidateResult<ErrorSuite> {
        let mut suite = ErrorSuite::new(csv_path.display().to_string());
        let mut reader = RowReader::open(csv_path, &self.schema.csv)?;
        let structural = StructuralValidator::new(self.schema);

        // Header phase
        if let Some(error) = structural.check_filename(csv_path) {
            if self.push(&mut suite, error).is_err() {
                return Ok(suite);
            }
        }

        let first_row = reader.next_row()?;
        let check = structural.check_header(first_row.as_ref());
        for error in check.errors {
            if self.push(&mut suite, error).is_err() {
                return Ok(suite);
            }
        }
        if check.fatal {
            return Ok(suite);
        }

        let mut columns = self.bind(&check.mapping)?;

        // Cell phase. An unheadered file's first row is data.
        let pending = if self.schema.csv.header { None } else { first_row };
        if let Some(row) = pending {
            if self.check_row(&mut suite, &mut columns, &row).is_err() {
                return Ok(suite);
            }
        }
        while let Some(row) = reader.next_row()? {
            if self.check_row(&mut suite, &mut columns, &row).is_err() {
                return Ok(suite);
            }
        }

        // Aggregate phase
        for column in columns.iter().filter(|c| c.offset.is_some()) {
            for binding in &column.aggregate {
                if let Some(error) = binding.validate(&column.values) {
                    if self.push(&mut suite, error).is_err() {
                        return Ok(suite);
                    }
                }
            }
        }

        Ok(suite)
    }

    /// Constructs the rule bindings of every schema column, in order.
    fn bind(&self, mapping: &ColumnMapping) -> ValidateResult<Vec<BoundColumn>> {
        let mut columns = Vec::with_capacity(self.schema.columns.len());
        for column in &self.schema.columns {
            let mapped = mapping.get(column.index);
            let label = mapped.map_or_else(|| column.label(), |(_, label)| label.to_string());

            let cell = column
                .rules
                .iter()
                .map(|(code, option)| self.catalog.cell_binding(code, option, &label))
                .collect::<Result<Vec<_>, _>>()?;
            let aggregate = column
                .aggregate_rules
                .iter()
                .map(|(code, option)| self.catalog.aggregate_binding(code, option, &label))
                .collect::<Result<Vec<_>, _>>()?;

            columns.push(BoundColumn {
                offset: mapped.map(|(offset, _)| offset),
                cell,
                aggregate,
                values: Vec::new(),
            });
        }
        Ok(columns)
    }

    fn check_row(
        &self,
        suite: &mut ErrorSuite,
        columns: &mut [BoundColumn],
        row: &Row,
    ) -> Result<(), Stopped> {
        for column in columns.iter_mut() {
            let Some(offset) = column.offset else {
                continue;
            };
            let value = row.field(offset);
            for binding in &column.cell {
                if let Some(error) = binding.validate(value, row.line) {
                    self.push(suite, error)?;
                }
            }
            if !column.aggregate.is_empty() {
                column.values.push(value.to_string());
            }
        }
        Ok(())
    }

    fn push(&self, suite: &mut ErrorSuite, error: ValidationError) -> Result<(), Stopped> {
        suite.push(error);
        if self.quick_stop {
            return Err(Stopped);
        }
        Ok(())
    }
}
