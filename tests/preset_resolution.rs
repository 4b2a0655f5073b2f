//! Preset Resolution Tests
//!
//! - Local values win over inherited ones
//! - File presets resolve relative to the referencing schema
//! - Chains resolve transitively, cycles are rejected
//! - Resolved trees carry no `preset` keys

use std::fs;
use std::path::{Path, PathBuf};

use csvaudit::rules::RuleCatalog;
use csvaudit::schema::{PresetResolver, Schema};
use csvaudit::validator::CsvValidator;
use serde_json::Value;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn contains_preset_key(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.contains_key("preset") || map.values().any(contains_preset_key),
        Value::Array(items) => items.iter().any(contains_preset_key),
        _ => false,
    }
}

// =============================================================================
// Precedence Tests
// =============================================================================

/// A column inherited from a file preset keeps its rules unless overridden.
#[test]
fn test_local_rule_wins_over_file_preset() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "parent.yml",
        "columns:\n  - name: x\n    description: inherited\n    rules:\n      num_min: 2\n      is_int: true\n",
    );
    let child = write(
        tmp.path(),
        "child.yml",
        "presets:\n  p: parent.yml\ncolumns:\n  - preset: p/x\n    rules:\n      num_min: 5\n",
    );

    let tree = PresetResolver::new().resolve_file(&child).unwrap();
    let column = &tree["columns"][0];
    assert_eq!(column["name"], "x");
    assert_eq!(column["description"], "inherited");
    assert_eq!(column["rules"]["num_min"], 5);
    assert_eq!(column["rules"]["is_int"], true);
    assert!(!contains_preset_key(&tree));
}

/// Sections inherit from a preset and keep built-in defaults underneath.
#[test]
fn test_section_inheritance_from_json_preset() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "shared/base.json",
        r#"{"csv": {"delimiter": ";", "header": false}, "structural_rules": {"allow_extra_columns": true}}"#,
    );
    let schema = write(
        tmp.path(),
        "schema.yml",
        "presets:\n  base: shared/base.json\ncsv:\n  preset: base\n  header: true\nstructural_rules:\n  preset: base\ncolumns:\n  - name: a\n",
    );

    let schema = Schema::load(&schema).unwrap();
    assert_eq!(schema.csv.delimiter, b';');
    assert!(schema.csv.header);
    assert_eq!(schema.csv.enclosure, b'"');
    assert!(schema.structural_rules.allow_extra_columns);
    assert!(schema.structural_rules.strict_column_order);
}

/// A preset file's own presets resolve relative to that file.
#[test]
fn test_transitive_file_chain() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "lib/ids.yml",
        "columns:\n  - name: id\n    rules:\n      is_int: true\n    aggregate_rules:\n      is_unique: true\n",
    );
    write(
        tmp.path(),
        "lib/users.yml",
        "presets:\n  ids: ids.yml\ncolumns:\n  - preset: ids/id\n    name: user_id\n",
    );
    let schema = write(
        tmp.path(),
        "orders.yml",
        "presets:\n  users: lib/users.yml\ncolumns:\n  - preset: users/user_id\n  - name: total\n",
    );

    let schema = Schema::load(&schema).unwrap();
    assert_eq!(schema.column_names(), ["user_id", "total"]);
    let id = schema.column("user_id").unwrap();
    assert_eq!(id.rules, [("is_int".to_string(), Value::Bool(true))]);
    assert_eq!(
        id.aggregate_rules,
        [("is_unique".to_string(), Value::Bool(true))]
    );
}

/// Inherited rules are enforced against real data.
#[test]
fn test_inherited_rules_validate_csv() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "parent.yml",
        "columns:\n  - name: x\n    rules:\n      num_min: 2\n",
    );
    let child = write(
        tmp.path(),
        "child.yml",
        "presets:\n  p: parent.yml\ncolumns:\n  - preset: p/x\n    rules:\n      num_min: 5\n",
    );
    let csv = write(tmp.path(), "data.csv", "x\n3\n7\n");

    let schema = Schema::load(&child).unwrap();
    let catalog = RuleCatalog::new();
    let suite = CsvValidator::new(&catalog, &schema).validate(&csv).unwrap();
    assert_eq!(suite.count(), 1);
    assert_eq!(suite[0].rule(), "num_min");
    assert_eq!(suite[0].line(), 2);
}

// =============================================================================
// Failure Tests
// =============================================================================

/// Two files referencing each other are rejected, not looped on.
#[test]
fn test_file_cycle_detected() {
    let tmp = TempDir::new().unwrap();
    let a = write(
        tmp.path(),
        "a.yml",
        "presets:\n  b: b.yml\ncolumns:\n  - preset: b/x\n",
    );
    write(
        tmp.path(),
        "b.yml",
        "presets:\n  a: a.yml\ncolumns:\n  - preset: a/x\n",
    );

    let err = PresetResolver::new().resolve_file(&a).unwrap_err();
    assert_eq!(err.code(), "CSV_SCHEMA_PRESET_CYCLE");
    assert!(err.is_preset_error());
    assert!(err.to_string().contains("a.yml"));
}

/// A missing preset file is an I/O problem of the schema.
#[test]
fn test_missing_preset_file() {
    let tmp = TempDir::new().unwrap();
    let schema = write(
        tmp.path(),
        "schema.yml",
        "presets:\n  gone: nowhere.yml\ncolumns:\n  - preset: gone/x\n",
    );
    let err = PresetResolver::new().resolve_file(&schema).unwrap_err();
    assert_eq!(err.code(), "CSV_SCHEMA_IO");
}

/// Unused presets are never loaded.
#[test]
fn test_unused_preset_not_loaded() {
    let tmp = TempDir::new().unwrap();
    let schema = write(
        tmp.path(),
        "schema.yml",
        "presets:\n  gone: nowhere.yml\ncolumns:\n  - name: a\n",
    );
    let mut resolver = PresetResolver::new();
    resolver.resolve_file(&schema).unwrap();
    assert_eq!(resolver.resolved_count(), 0);
}
