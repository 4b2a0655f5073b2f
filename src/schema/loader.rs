//! Schema file decoding
//!
//! Reads `.json`, `.yml` and `.yaml` schema files into a generic tree. The
//! tree keeps key declaration order, which is the rule execution order.

use std::fs;
use std::path::Path;

use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};

/// Source format of a schema file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Json,
    Yaml,
}

impl SchemaFormat {
    pub fn from_path(path: &Path) -> SchemaResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(SchemaFormat::Json),
            Some("yml") | Some("yaml") => Ok(SchemaFormat::Yaml),
            _ => Err(SchemaError::malformed(
                path.display().to_string(),
                "unsupported schema extension, expected .json, .yml or .yaml",
            )),
        }
    }
}

/// Decodes schema files into trees.
pub struct SchemaLoader;

impl SchemaLoader {
    /// Reads and decodes a schema file.
    pub fn load(path: &Path) -> SchemaResult<Value> {
        let format = SchemaFormat::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|e| SchemaError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content, format, &path.display().to_string())
    }

    /// Decodes schema text. `origin` only names the source in errors.
    pub fn parse(content: &str, format: SchemaFormat, origin: &str) -> SchemaResult<Value> {
        let tree: Value = match format {
            SchemaFormat::Json => serde_json::from_str(content)
                .map_err(|e| SchemaError::malformed(origin, format!("Invalid JSON: {}", e)))?,
            SchemaFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| SchemaError::malformed(origin, format!("Invalid YAML: {}", e)))?,
        };

        match tree {
            Value::Object(_) => Ok(tree),
            // An empty YAML document decodes to null
            Value::Null => Ok(Value::Object(Default::default())),
            _ => Err(SchemaError::malformed(origin, "schema root must be a map")),
        }
    }
}
