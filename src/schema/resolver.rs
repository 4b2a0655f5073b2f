//! Preset resolution
//!
//! Turns a raw schema tree into an equivalent, preset-free tree.
//!
//! - `presets` maps an alias to an inline tree or a schema file path
//!   (relative paths are taken from the declaring file's directory)
//! - sections (`filename_pattern`, `csv`, `structural_rules`) inherit from
//!   `preset: <alias>` on the section or on the schema root
//! - columns inherit from `preset: <alias>/<column>`; `rules` and
//!   `aggregate_rules` may each name their own source the same way
//!
//! Merge order is defaults, then the inherited layer, then local values.
//! Maps merge key by key, everything else is replaced wholesale.
//!
//! Each alias is resolved on first use and memoized per resolver. The chain
//! of presets currently being resolved is tracked, and an alias that shows
//! up twice in it is rejected as a cycle.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};

use super::errors::{SchemaError, SchemaResult};
use super::loader::SchemaLoader;
use crate::observability::{log_event_with_fields, Event};

const SECTIONS: &[&str] = &["csv", "structural_rules"];
const RULE_SETS: &[&str] = &["rules", "aggregate_rules"];

fn csv_defaults() -> Value {
    json!({
        "header": true,
        "delimiter": ",",
        "quote_char": "\\",
        "enclosure": "\"",
        "encoding": "utf-8",
        "bom": false
    })
}

fn structural_defaults() -> Value {
    json!({
        "strict_column_order": true,
        "allow_extra_columns": false
    })
}

fn column_defaults() -> Value {
    json!({
        "name": "",
        "description": "",
        "example": null,
        "required": true,
        "rules": {},
        "aggregate_rules": {}
    })
}

fn section_defaults(section: &str) -> Value {
    match section {
        "csv" => csv_defaults(),
        _ => structural_defaults(),
    }
}

/// Aliases are `^[a-z0-9_-]+$`, case-insensitive.
pub fn is_valid_alias(alias: &str) -> bool {
    !alias.is_empty()
        && alias
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Deep merge: maps merge recursively, any other overlay replaces the base.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, overlay) => overlay,
    }
}

enum PresetSource {
    Inline(Value),
    File(PathBuf),
}

/// Presets visible while resolving one tree.
struct Scope {
    identity: String,
    base_dir: PathBuf,
    presets: HashMap<String, PresetSource>,
}

/// Resolves preset references. One resolver memoizes every alias it meets.
pub struct PresetResolver {
    resolved: HashMap<String, Value>,
    in_progress: Vec<String>,
    inline_trees: usize,
}

impl PresetResolver {
    pub fn new() -> Self {
        Self {
            resolved: HashMap::new(),
            in_progress: Vec::new(),
            inline_trees: 0,
        }
    }

    /// Loads and resolves a schema file.
    pub fn resolve_file(&mut self, path: &Path) -> SchemaResult<Value> {
        let identity = canonical(path)?;
        let tree = SchemaLoader::load(path)?;
        let base_dir = parent_dir(Path::new(&identity));

        self.in_progress.push(identity.clone());
        let result = self.resolve_tree(tree, &base_dir, &identity);
        self.in_progress.pop();
        result
    }

    /// Resolves an already decoded tree. Relative preset paths are taken
    /// from `base_dir`. Inline presets are memoized per call, so trees
    /// sharing an alias never see each other's presets.
    pub fn resolve(&mut self, tree: Value, base_dir: &Path) -> SchemaResult<Value> {
        self.inline_trees += 1;
        let identity = format!("<inline:{}>", self.inline_trees);
        self.resolve_tree(tree, base_dir, &identity)
    }

    /// Number of presets resolved so far.
    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    fn resolve_tree(
        &mut self,
        tree: Value,
        base_dir: &Path,
        identity: &str,
    ) -> SchemaResult<Value> {
        let mut root = match tree {
            Value::Object(map) => map,
            _ => return Err(SchemaError::malformed(identity, "schema root must be a map")),
        };

        let scope = Scope {
            identity: identity.to_string(),
            base_dir: base_dir.to_path_buf(),
            presets: collect_presets(root.remove("presets"), base_dir, identity)?,
        };
        let schema_preset = take_preset(&mut root)?;

        let mut out = Map::new();
        out.insert("name".into(), root.remove("name").unwrap_or_else(|| json!("")));
        out.insert(
            "description".into(),
            root.remove("description").unwrap_or_else(|| json!("")),
        );

        // filename_pattern is a leaf: local wins outright when present
        let (pattern_preset, local_pattern) = match root.remove("filename_pattern") {
            Some(Value::Object(mut map)) => (take_preset(&mut map)?, Value::Null),
            Some(other) => (None, other),
            None => (None, Value::Null),
        };
        let pattern = if !local_pattern.is_null() {
            local_pattern
        } else {
            match pattern_preset.or_else(|| schema_preset.clone()) {
                Some(alias) => self
                    .preset(&scope, &alias)?
                    .get("filename_pattern")
                    .cloned()
                    .unwrap_or(Value::Null),
                None => Value::Null,
            }
        };
        out.insert("filename_pattern".into(), pattern);

        for section in SECTIONS {
            let mut local = match root.remove(*section) {
                Some(Value::Object(map)) => map,
                Some(Value::Null) | None => Map::new(),
                Some(_) => {
                    return Err(SchemaError::malformed(
                        format!("{}: {}", identity, section),
                        "section must be a map",
                    ))
                }
            };
            let mut merged = section_defaults(section);
            if let Some(alias) = take_preset(&mut local)?.or_else(|| schema_preset.clone()) {
                if let Some(parent) = self.preset(&scope, &alias)?.get(*section) {
                    merged = deep_merge(merged, parent.clone());
                }
            }
            out.insert(section.to_string(), deep_merge(merged, Value::Object(local)));
        }

        let columns = match root.remove("columns") {
            Some(Value::Array(columns)) => columns
                .into_iter()
                .enumerate()
                .map(|(index, column)| self.resolve_column(&scope, index, column))
                .collect::<SchemaResult<Vec<Value>>>()?,
            Some(Value::Null) | None => match &schema_preset {
                Some(alias) => self
                    .preset(&scope, alias)?
                    .get("columns")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default(),
                None => Vec::new(),
            },
            Some(_) => {
                return Err(SchemaError::malformed(
                    format!("{}: columns", identity),
                    "columns must be a list",
                ))
            }
        };
        out.insert("columns".into(), Value::Array(columns));

        Ok(Value::Object(out))
    }

    fn resolve_column(
        &mut self,
        scope: &Scope,
        index: usize,
        column: Value,
    ) -> SchemaResult<Value> {
        let mut local = match column {
            Value::Object(map) => map,
            _ => {
                return Err(SchemaError::malformed(
                    format!("{}: columns[{}]", scope.identity, index),
                    "column must be a map",
                ))
            }
        };

        let mut merged = column_defaults();
        if let Some(reference) = take_preset(&mut local)? {
            merged = deep_merge(merged, self.preset_column(scope, &reference)?);
        }

        for key in RULE_SETS {
            let mut rules = merged.get(*key).cloned().unwrap_or_else(|| json!({}));
            let mut local_rules = match local.remove(*key) {
                Some(Value::Object(map)) => map,
                Some(Value::Null) | None => Map::new(),
                Some(_) => {
                    return Err(SchemaError::malformed(
                        format!("{}: columns[{}].{}", scope.identity, index, key),
                        "rule set must be a map",
                    ))
                }
            };
            if let Some(reference) = take_preset(&mut local_rules)? {
                let source = self.preset_column(scope, &reference)?;
                if let Some(inherited) = source.get(*key) {
                    rules = deep_merge(rules, inherited.clone());
                }
            }
            rules = deep_merge(rules, Value::Object(local_rules));
            if let Value::Object(map) = &mut merged {
                map.insert(key.to_string(), rules);
            }
        }

        Ok(deep_merge(merged, Value::Object(local)))
    }

    /// Finds `<alias>/<column>` in a resolved preset.
    fn preset_column(&mut self, scope: &Scope, reference: &str) -> SchemaResult<Value> {
        let (alias, column) = reference
            .split_once('/')
            .filter(|(alias, column)| !alias.is_empty() && !column.is_empty())
            .ok_or_else(|| SchemaError::MalformedReference(reference.to_string()))?;

        let preset = self.preset(scope, alias)?;
        preset
            .get("columns")
            .and_then(Value::as_array)
            .and_then(|columns| {
                columns
                    .iter()
                    .find(|c| c.get("name").and_then(Value::as_str) == Some(column))
            })
            .cloned()
            .ok_or_else(|| SchemaError::UnknownPresetColumn {
                alias: alias.to_string(),
                column: column.to_string(),
            })
    }

    /// Returns the resolved tree of an alias, resolving it on first use.
    fn preset(&mut self, scope: &Scope, alias: &str) -> SchemaResult<Value> {
        let source = scope
            .presets
            .get(alias)
            .ok_or_else(|| SchemaError::UnknownPreset(alias.to_string()))?;

        let (key, base_dir) = match source {
            PresetSource::Inline(_) => (
                format!("{}#{}", scope.identity, alias),
                scope.base_dir.clone(),
            ),
            PresetSource::File(path) => {
                let key = canonical(path)?;
                let dir = parent_dir(Path::new(&key));
                (key, dir)
            }
        };

        if let Some(tree) = self.resolved.get(&key) {
            return Ok(tree.clone());
        }
        if self.in_progress.contains(&key) {
            let mut chain = self.in_progress.clone();
            chain.push(key);
            return Err(SchemaError::PresetCycle(chain.join(" -> ")));
        }

        let tree = match source {
            PresetSource::Inline(tree) => tree.clone(),
            PresetSource::File(path) => SchemaLoader::load(path)?,
        };

        self.in_progress.push(key.clone());
        let result = self.resolve_tree(tree, &base_dir, &key);
        self.in_progress.pop();
        let resolved = result?;

        log_event_with_fields(Event::PresetResolved, &[("alias", alias), ("source", key.as_str())]);
        self.resolved.insert(key, resolved.clone());
        Ok(resolved)
    }
}

impl Default for PresetResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_presets(
    presets: Option<Value>,
    base_dir: &Path,
    identity: &str,
) -> SchemaResult<HashMap<String, PresetSource>> {
    let map = match presets {
        Some(Value::Object(map)) => map,
        Some(Value::Null) | None => return Ok(HashMap::new()),
        Some(_) => {
            return Err(SchemaError::malformed(
                format!("{}: presets", identity),
                "presets must be a map",
            ))
        }
    };

    let mut out = HashMap::new();
    for (alias, value) in map {
        if !is_valid_alias(&alias) {
            return Err(SchemaError::InvalidAlias(alias));
        }
        let source = match value {
            Value::String(path) => PresetSource::File(base_dir.join(path)),
            tree @ Value::Object(_) => PresetSource::Inline(tree),
            _ => {
                return Err(SchemaError::malformed(
                    format!("{}: presets.{}", identity, alias),
                    "preset must be a path or a schema map",
                ))
            }
        };
        out.insert(alias, source);
    }
    Ok(out)
}

/// Removes and returns the `preset` key of a node.
fn take_preset(node: &mut Map<String, Value>) -> SchemaResult<Option<String>> {
    match node.remove("preset") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(SchemaError::MalformedReference(other.to_string())),
    }
}

fn canonical(path: &Path) -> SchemaResult<String> {
    fs::canonicalize(path)
        .map(|p| p.display().to_string())
        .map_err(|e| SchemaError::Io {
            path: path.display().to_string(),
            source: e,
        })
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
