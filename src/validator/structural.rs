//! Structural checks
//!
//! Runs before any data row is read. Besides collecting errors, the header
//! check decides which CSV offset feeds each schema column.

use std::path::Path;

use crate::report::ValidationError;
use crate::schema::Schema;

use super::reader::Row;

/// Rule codes of structural errors.
pub mod codes {
    pub const HEADER: &str = "csv.header";
    pub const COLUMN: &str = "csv.column";
    pub const FILENAME_PATTERN: &str = "filename_pattern";
    pub const STRICT_COLUMN_ORDER: &str = "strict_column_order";
    pub const ALLOW_EXTRA_COLUMNS: &str = "allow_extra_columns";
}

/// CSV offset and error label for every schema column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    slots: Vec<Option<(usize, String)>>,
}

impl ColumnMapping {
    /// Offset and label of a schema column, `None` if the CSV lacks it.
    pub fn get(&self, column_index: usize) -> Option<(usize, &str)> {
        self.slots
            .get(column_index)
            .and_then(|slot| slot.as_ref())
            .map(|(offset, label)| (*offset, label.as_str()))
    }
}

/// Outcome of the header phase.
#[derive(Debug)]
pub struct HeaderCheck {
    pub errors: Vec<ValidationError>,
    pub mapping: ColumnMapping,
    /// The file cannot be validated further.
    pub fatal: bool,
}

pub struct StructuralValidator<'a> {
    schema: &'a Schema,
}

impl<'a> StructuralValidator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Checks the CSV path against `filename_pattern`, if declared.
    pub fn check_filename(&self, path: &Path) -> Option<ValidationError> {
        let regex = self.schema.filename_regex()?;
        let name = path.display().to_string();
        if regex.is_match(&name) {
            return None;
        }
        Some(ValidationError::new(
            codes::FILENAME_PATTERN,
            format!(
                "Filename \"<c>{}</c>\" does not match pattern: \"<green>{}</green>\"",
                name,
                self.schema.filename_pattern.as_deref().unwrap_or_default()
            ),
            "",
            ValidationError::UNDEFINED_LINE,
        ))
    }

    /// Checks the header row, or the first row of an unheadered file.
    pub fn check_header(&self, first_row: Option<&Row>) -> HeaderCheck {
        if self.schema.csv.header {
            self.check_named_header(first_row)
        } else {
            self.check_unheadered(first_row)
        }
    }

    fn check_named_header(&self, header: Option<&Row>) -> HeaderCheck {
        let line = header.map_or(1, |row| row.line);
        let names: Vec<&str> = header.map_or_else(Vec::new, |row| {
            row.fields.iter().map(String::as_str).collect()
        });
        let rules = &self.schema.structural_rules;
        let mut errors = Vec::new();

        let unnamed: Vec<_> = self.schema.columns.iter().filter(|c| c.name.is_empty()).collect();
        if !unnamed.is_empty() {
            for column in unnamed {
                errors.push(ValidationError::new(
                    codes::HEADER,
                    format!(
                        "Property \"<c>name</c>\" is not defined in schema column <c>{}</c>, \
                         but the CSV file has a header row",
                        column.index
                    ),
                    column.label(),
                    line,
                ));
            }
            return HeaderCheck {
                errors,
                mapping: ColumnMapping { slots: Vec::new() },
                fatal: true,
            };
        }

        let expected = self.schema.column_names();

        if rules.strict_column_order {
            let actual: Vec<&str> = names
                .iter()
                .copied()
                .filter(|name| expected.contains(name))
                .collect();
            if actual != expected {
                errors.push(ValidationError::new(
                    codes::STRICT_COLUMN_ORDER,
                    format!(
                        "Real columns order is \"<c>{}</c>\", which is not equal to the expected \"<green>{}</green>\"",
                        actual.join(", "),
                        expected.join(", ")
                    ),
                    "",
                    line,
                ));
            }
        } else {
            for column in self.schema.columns.iter().filter(|c| c.required) {
                if !names.contains(&column.name.as_str()) {
                    errors.push(ValidationError::new(
                        codes::COLUMN,
                        format!("Required column \"<c>{}</c>\" not found in the CSV", column.name),
                        column.label(),
                        line,
                    ));
                }
            }
        }

        if !rules.allow_extra_columns {
            for (offset, name) in names.iter().enumerate() {
                if !expected.contains(name) {
                    errors.push(ValidationError::new(
                        codes::ALLOW_EXTRA_COLUMNS,
                        format!("Column \"<c>{}</c>\" is not defined in the schema", name),
                        ValidationError::column_label(offset, name),
                        line,
                    ));
                }
            }
        }

        let slots = self
            .schema
            .columns
            .iter()
            .map(|column| {
                names
                    .iter()
                    .position(|name| *name == column.name)
                    .map(|offset| (offset, ValidationError::column_label(offset, &column.name)))
            })
            .collect();

        HeaderCheck {
            errors,
            mapping: ColumnMapping { slots },
            fatal: false,
        }
    }

    fn check_unheadered(&self, first_row: Option<&Row>) -> HeaderCheck {
        let mut errors = Vec::new();
        let declared = self.schema.columns.len();

        if let Some(row) = first_row {
            if !self.schema.structural_rules.allow_extra_columns && row.fields.len() > declared {
                errors.push(ValidationError::new(
                    codes::ALLOW_EXTRA_COLUMNS,
                    format!(
                        "Row has <c>{}</c> columns, which is more than the <green>{}</green> declared in the schema",
                        row.fields.len(),
                        declared
                    ),
                    "",
                    ValidationError::UNDEFINED_LINE,
                ));
            }
        }

        let slots = self
            .schema
            .columns
            .iter()
            .map(|column| Some((column.index, column.label())))
            .collect();

        HeaderCheck {
            errors,
            mapping: ColumnMapping { slots },
            fatal: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn header(names: &[&str]) -> Row {
        Row {
            line: 1,
            fields: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    fn schema(tree: serde_json::Value) -> Schema {
        Schema::from_tree(&tree).unwrap()
    }

    #[test]
    fn test_non_strict_order_matches_by_name() {
        let schema = schema(json!({
            "structural_rules": {"strict_column_order": false},
            "columns": [{"name": "a"}, {"name": "b"}]
        }));
        let check = StructuralValidator::new(&schema).check_header(Some(&header(&["b", "a"])));
        assert!(check.errors.is_empty());
        assert_eq!(check.mapping.get(0), Some((1, "1:a")));
        assert_eq!(check.mapping.get(1), Some((0, "0:b")));
    }

    #[test]
    fn test_strict_order_reports_once() {
        let schema = schema(json!({"columns": [{"name": "a"}, {"name": "b"}]}));
        let check = StructuralValidator::new(&schema).check_header(Some(&header(&["b", "a"])));
        assert_eq!(check.errors.len(), 1);
        assert_eq!(check.errors[0].rule(), codes::STRICT_COLUMN_ORDER);
        assert_eq!(check.errors[0].line(), 1);
        assert!(!check.fatal);
    }

    #[test]
    fn test_extra_columns() {
        let tree = json!({
            "structural_rules": {"strict_column_order": false},
            "columns": [{"name": "a"}]
        });
        let strict = schema(tree.clone());
        let check = StructuralValidator::new(&strict).check_header(Some(&header(&["a", "x"])));
        assert_eq!(check.errors.len(), 1);
        assert_eq!(check.errors[0].rule(), codes::ALLOW_EXTRA_COLUMNS);
        assert_eq!(check.errors[0].column(), "1:x");

        let mut relaxed = tree;
        relaxed["structural_rules"]["allow_extra_columns"] = json!(true);
        let relaxed = schema(relaxed);
        let check = StructuralValidator::new(&relaxed).check_header(Some(&header(&["a", "x"])));
        assert!(check.errors.is_empty());
    }

    #[test]
    fn test_missing_required_column() {
        let schema = schema(json!({
            "structural_rules": {"strict_column_order": false},
            "columns": [{"name": "a"}, {"name": "b", "required": false}, {"name": "c"}]
        }));
        let check = StructuralValidator::new(&schema).check_header(Some(&header(&["a"])));
        assert_eq!(check.errors.len(), 1);
        assert_eq!(check.errors[0].rule(), codes::COLUMN);
        assert_eq!(check.errors[0].column(), "2:c");
        assert_eq!(check.mapping.get(1), None);
    }

    #[test]
    fn test_unnamed_column_with_header_is_fatal() {
        let schema = schema(json!({"columns": [{"name": "a"}, {"description": "no name"}]}));
        let check = StructuralValidator::new(&schema).check_header(Some(&header(&["a", "b"])));
        assert!(check.fatal);
        assert_eq!(check.errors.len(), 1);
        assert_eq!(check.errors[0].rule(), codes::HEADER);
    }

    #[test]
    fn test_unheadered_width() {
        let schema = schema(json!({"csv": {"header": false}, "columns": [{}]}));
        let check = StructuralValidator::new(&schema).check_header(Some(&header(&["1", "2"])));
        assert_eq!(check.errors.len(), 1);
        assert_eq!(check.errors[0].line(), ValidationError::UNDEFINED_LINE);
        assert_eq!(check.mapping.get(0), Some((0, "0:")));
    }

    #[test]
    fn test_filename_pattern() {
        let schema = schema(json!({"filename_pattern": "/users-\\d+\\.csv$/"}));
        let validator = StructuralValidator::new(&schema);
        assert!(validator.check_filename(Path::new("data/users-01.csv")).is_none());
        let error = validator.check_filename(Path::new("data/orders.csv")).unwrap();
        assert_eq!(error.rule(), codes::FILENAME_PATTERN);
        assert!(!error.has_line());
    }
}
