//! Typed schema model
//!
//! Built once from a resolved, preset-free tree and immutable afterwards.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::{SchemaError, SchemaResult};
use super::resolver::PresetResolver;
use crate::rules::compile_pattern;
use crate::rules::options::{as_bool, as_string};

/// Supported CSV encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Encoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "utf-16")]
    Utf16,
    #[serde(rename = "utf-32")]
    Utf32,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16 => "utf-16",
            Encoding::Utf32 => "utf-32",
        }
    }
}

impl FromStr for Encoding {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "utf-16" | "utf16" => Ok(Encoding::Utf16),
            "utf-32" | "utf32" => Ok(Encoding::Utf32),
            other => Err(SchemaError::InvalidDialect(format!(
                "encoding \"{}\" is not supported, expected utf-8, utf-16 or utf-32",
                other
            ))),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CSV syntax parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvDialect {
    pub header: bool,
    pub delimiter: u8,
    /// Escape character inside enclosed fields.
    pub quote_char: u8,
    /// Field enclosure character.
    pub enclosure: u8,
    pub encoding: Encoding,
    pub bom: bool,
}

impl Default for CsvDialect {
    fn default() -> Self {
        Self {
            header: true,
            delimiter: b',',
            quote_char: b'\\',
            enclosure: b'"',
            encoding: Encoding::Utf8,
            bom: false,
        }
    }
}

impl CsvDialect {
    fn from_tree(tree: Option<&Value>) -> SchemaResult<Self> {
        let defaults = Self::default();
        let Some(tree) = tree else {
            return Ok(defaults);
        };
        Ok(Self {
            header: tree.get("header").map_or(defaults.header, as_bool),
            delimiter: dialect_char(tree, "delimiter", defaults.delimiter)?,
            quote_char: dialect_char(tree, "quote_char", defaults.quote_char)?,
            enclosure: dialect_char(tree, "enclosure", defaults.enclosure)?,
            encoding: match tree.get("encoding") {
                Some(value) => as_string(value).parse()?,
                None => defaults.encoding,
            },
            bom: tree.get("bom").map_or(defaults.bom, as_bool),
        })
    }
}

/// Each dialect character must be exactly one ASCII character.
fn dialect_char(tree: &Value, key: &str, default: u8) -> SchemaResult<u8> {
    let Some(value) = tree.get(key) else {
        return Ok(default);
    };
    let text = as_string(value);
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => Err(SchemaError::InvalidDialect(format!(
            "csv.{} must be exactly one ASCII character, got \"{}\"",
            key, text
        ))),
    }
}

/// Schema-wide constraints on column presence and order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StructuralRules {
    pub strict_column_order: bool,
    pub allow_extra_columns: bool,
}

impl Default for StructuralRules {
    fn default() -> Self {
        Self {
            strict_column_order: true,
            allow_extra_columns: false,
        }
    }
}

impl StructuralRules {
    fn from_tree(tree: Option<&Value>) -> Self {
        let defaults = Self::default();
        match tree {
            Some(tree) => Self {
                strict_column_order: tree
                    .get("strict_column_order")
                    .map_or(defaults.strict_column_order, as_bool),
                allow_extra_columns: tree
                    .get("allow_extra_columns")
                    .map_or(defaults.allow_extra_columns, as_bool),
            },
            None => defaults,
        }
    }
}

/// One declared column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// 0-based position in the schema.
    pub index: usize,
    pub name: String,
    pub description: String,
    pub example: Option<Value>,
    pub required: bool,
    /// Cell rules in declaration order.
    pub rules: Vec<(String, Value)>,
    /// Aggregate rules in declaration order.
    pub aggregate_rules: Vec<(String, Value)>,
}

impl Column {
    fn from_tree(index: usize, tree: &Value) -> SchemaResult<Self> {
        let path = format!("columns[{}]", index);
        if !tree.is_object() {
            return Err(SchemaError::malformed(path, "column must be a map"));
        }
        Ok(Self {
            index,
            name: tree.get("name").map(as_string).unwrap_or_default(),
            description: tree.get("description").map(as_string).unwrap_or_default(),
            example: tree.get("example").filter(|v| !v.is_null()).cloned(),
            required: tree.get("required").map_or(true, as_bool),
            rules: rule_list(tree.get("rules"), &format!("{}.rules", path))?,
            aggregate_rules: rule_list(
                tree.get("aggregate_rules"),
                &format!("{}.aggregate_rules", path),
            )?,
        })
    }

    /// Label used in errors when no CSV offset is known.
    pub fn label(&self) -> String {
        crate::report::ValidationError::column_label(self.index, &self.name)
    }
}

/// Option values are scalars, lists of scalars, or maps of scalars.
fn rule_list(tree: Option<&Value>, path: &str) -> SchemaResult<Vec<(String, Value)>> {
    let map: &Map<String, Value> = match tree {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(map)) => map,
        Some(_) => return Err(SchemaError::malformed(path, "rules must be a map")),
    };

    map.iter()
        .map(|(code, option)| {
            let nested = match option {
                Value::Array(items) => items.iter().any(is_container),
                Value::Object(entries) => entries.values().any(is_container),
                _ => false,
            };
            if nested {
                return Err(SchemaError::malformed(
                    format!("{}.{}", path, code),
                    "option values must not nest lists or maps",
                ));
            }
            Ok((code.clone(), option.clone()))
        })
        .collect()
}

fn is_container(value: &Value) -> bool {
    value.is_array() || value.is_object()
}

/// A resolved, immutable schema.
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    pub name: String,
    pub description: String,
    pub filename_pattern: Option<String>,
    #[serde(skip)]
    filename_regex: Option<Regex>,
    pub csv: CsvDialect,
    pub structural_rules: StructuralRules,
    pub columns: Vec<Column>,
}

impl Schema {
    /// Loads, resolves and builds a schema file.
    pub fn load(path: &Path) -> SchemaResult<Self> {
        let tree = PresetResolver::new().resolve_file(path)?;
        Self::from_tree(&tree)
    }

    /// Builds a schema from a resolved tree.
    pub fn from_tree(tree: &Value) -> SchemaResult<Self> {
        if !tree.is_object() {
            return Err(SchemaError::malformed("<root>", "schema root must be a map"));
        }

        let filename_pattern = tree
            .get("filename_pattern")
            .map(as_string)
            .filter(|p| !p.is_empty());
        let filename_regex = match &filename_pattern {
            Some(pattern) => Some(compile_pattern(pattern).map_err(|e| {
                SchemaError::malformed("filename_pattern", format!("invalid pattern: {}", e))
            })?),
            None => None,
        };

        let columns = match tree.get("columns") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, column)| Column::from_tree(index, column))
                .collect::<SchemaResult<Vec<_>>>()?,
            Some(_) => return Err(SchemaError::malformed("columns", "columns must be a list")),
        };

        Ok(Self {
            name: tree.get("name").map(as_string).unwrap_or_default(),
            description: tree.get("description").map(as_string).unwrap_or_default(),
            filename_pattern,
            filename_regex,
            csv: CsvDialect::from_tree(tree.get("csv"))?,
            structural_rules: StructuralRules::from_tree(tree.get("structural_rules")),
            columns,
        })
    }

    pub fn filename_regex(&self) -> Option<&Regex> {
        self.filename_regex.as_ref()
    }

    /// Finds a column by declared name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}
