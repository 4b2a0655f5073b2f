//! Static rule tables
//!
//! Each rule code maps to exactly one constructor. Base implementations that
//! only exist to be specialized (the bounded float behind latitude and
//! longitude) are never listed here.

use std::collections::HashMap;

use serde_json::Value;

use super::aggregate;
use super::binding::{AggregateBinding, CellBinding};
use super::cell::{dates, formats, numeric, text, values};
use super::{AggregateRule, CellRule};
use crate::schema::{SchemaError, SchemaResult};

/// Prefix distinguishing aggregate codes from cell codes of the same root.
pub const AGGREGATE_PREFIX: &str = "ag:";

pub type CellCtor = fn(&'static str, &Value) -> SchemaResult<Box<dyn CellRule>>;
pub type AggregateCtor = fn(&'static str, &Value) -> SchemaResult<Box<dyn AggregateRule>>;

const CELL_RULES: &[(&str, CellCtor)] = &[
    ("not_empty", values::not_empty),
    ("exact_value", values::exact_value),
    ("allow_values", values::allow_values),
    ("not_allow_values", values::not_allow_values),
    ("regex", values::regex),
    ("length", text::length),
    ("length_not", text::length),
    ("length_min", text::length),
    ("length_max", text::length),
    ("is_trimmed", text::is_trimmed),
    ("is_lowercase", text::is_lowercase),
    ("is_uppercase", text::is_uppercase),
    ("is_capitalize", text::is_capitalize),
    ("word_count", text::words),
    ("word_count_not", text::words),
    ("word_count_min", text::words),
    ("word_count_max", text::words),
    ("contains", text::contains),
    ("contains_one", text::contains_one),
    ("contains_all", text::contains_all),
    ("starts_with", text::starts_with),
    ("ends_with", text::ends_with),
    ("num", numeric::num),
    ("num_not", numeric::num),
    ("num_min", numeric::num),
    ("num_max", numeric::num),
    ("is_int", numeric::is_int),
    ("is_float", numeric::is_float),
    ("precision", numeric::precision),
    ("precision_not", numeric::precision),
    ("precision_min", numeric::precision),
    ("precision_max", numeric::precision),
    ("date", dates::date),
    ("date_not", dates::date),
    ("date_min", dates::date),
    ("date_max", dates::date),
    ("date_format", dates::date_format),
    ("is_date", dates::is_date),
    ("is_bool", formats::is_bool),
    ("is_ip4", formats::is_ip4),
    ("is_url", formats::is_url),
    ("is_email", formats::is_email),
    ("is_domain", formats::is_domain),
    ("is_uuid", formats::is_uuid),
    ("is_currency_code", formats::is_currency_code),
    ("is_base64", formats::is_base64),
    ("is_json", formats::is_json),
    ("is_latitude", formats::is_latitude),
    ("is_longitude", formats::is_longitude),
    ("is_geohash", formats::is_geohash),
    ("is_cardinal_direction", formats::is_cardinal_direction),
    ("is_usa_market_name", formats::is_usa_market_name),
    ("is_country_code", formats::is_country_code),
    ("is_language_code", formats::is_language_code),
];

const AGGREGATE_RULES: &[(&str, AggregateCtor)] = &[
    ("ag:is_unique", aggregate::is_unique),
    ("ag:sum", aggregate::sum),
    ("ag:sum_not", aggregate::sum),
    ("ag:sum_min", aggregate::sum),
    ("ag:sum_max", aggregate::sum),
    ("ag:average", aggregate::average),
    ("ag:average_not", aggregate::average),
    ("ag:average_min", aggregate::average),
    ("ag:average_max", aggregate::average),
    ("ag:median", aggregate::median_rule),
    ("ag:median_not", aggregate::median_rule),
    ("ag:median_min", aggregate::median_rule),
    ("ag:median_max", aggregate::median_rule),
    ("ag:count", aggregate::count),
    ("ag:count_not", aggregate::count),
    ("ag:count_min", aggregate::count),
    ("ag:count_max", aggregate::count),
    ("ag:count_empty", aggregate::count_empty),
    ("ag:count_empty_not", aggregate::count_empty),
    ("ag:count_empty_min", aggregate::count_empty),
    ("ag:count_empty_max", aggregate::count_empty),
    ("ag:count_not_empty", aggregate::count_not_empty),
    ("ag:count_not_empty_not", aggregate::count_not_empty),
    ("ag:count_not_empty_min", aggregate::count_not_empty),
    ("ag:count_not_empty_max", aggregate::count_not_empty),
    ("ag:population_variance", aggregate::population_variance),
    ("ag:population_variance_not", aggregate::population_variance),
    ("ag:population_variance_min", aggregate::population_variance),
    ("ag:population_variance_max", aggregate::population_variance),
    ("ag:sample_variance", aggregate::sample_variance),
    ("ag:sample_variance_not", aggregate::sample_variance),
    ("ag:sample_variance_min", aggregate::sample_variance),
    ("ag:sample_variance_max", aggregate::sample_variance),
    ("ag:population_stddev", aggregate::population_stddev),
    ("ag:population_stddev_not", aggregate::population_stddev),
    ("ag:population_stddev_min", aggregate::population_stddev),
    ("ag:population_stddev_max", aggregate::population_stddev),
    ("ag:sample_stddev", aggregate::sample_stddev),
    ("ag:sample_stddev_not", aggregate::sample_stddev),
    ("ag:sample_stddev_min", aggregate::sample_stddev),
    ("ag:sample_stddev_max", aggregate::sample_stddev),
    ("ag:coef_of_var", aggregate::coef_of_var),
    ("ag:coef_of_var_not", aggregate::coef_of_var),
    ("ag:coef_of_var_min", aggregate::coef_of_var),
    ("ag:coef_of_var_max", aggregate::coef_of_var),
];

/// Immutable registry of every known rule.
///
/// Built once and shared by reference with every validation call site.
pub struct RuleCatalog {
    cell: HashMap<&'static str, CellCtor>,
    aggregate: HashMap<&'static str, AggregateCtor>,
}

impl RuleCatalog {
    pub fn new() -> Self {
        Self {
            cell: CELL_RULES.iter().copied().collect(),
            aggregate: AGGREGATE_RULES.iter().copied().collect(),
        }
    }

    pub fn has_cell_rule(&self, code: &str) -> bool {
        self.cell.contains_key(code)
    }

    /// Accepts the code with or without the `ag:` prefix.
    pub fn has_aggregate_rule(&self, code: &str) -> bool {
        self.aggregate.contains_key(aggregate_code(code).as_str())
    }

    pub fn cell_codes(&self) -> impl Iterator<Item = &'static str> {
        CELL_RULES.iter().map(|(code, _)| *code)
    }

    pub fn aggregate_codes(&self) -> impl Iterator<Item = &'static str> {
        AGGREGATE_RULES.iter().map(|(code, _)| *code)
    }

    /// Constructs a cell rule and binds it to `column`.
    pub fn cell_binding(
        &self,
        code: &str,
        option: &Value,
        column: &str,
    ) -> SchemaResult<CellBinding> {
        let (key, ctor) = self
            .cell
            .get_key_value(code)
            .ok_or_else(|| SchemaError::UnknownRule {
                rule: code.to_string(),
                column: column.to_string(),
            })?;
        let rule = ctor(*key, option)?;
        Ok(CellBinding::new(key, column.to_string(), option, rule))
    }

    /// Constructs an aggregate rule and binds it to `column`.
    pub fn aggregate_binding(
        &self,
        code: &str,
        option: &Value,
        column: &str,
    ) -> SchemaResult<AggregateBinding> {
        let full = aggregate_code(code);
        let (key, ctor) = self
            .aggregate
            .get_key_value(full.as_str())
            .ok_or_else(|| SchemaError::UnknownRule {
                rule: full.clone(),
                column: column.to_string(),
            })?;
        let rule = ctor(*key, option)?;
        Ok(AggregateBinding::new(key, column.to_string(), option, rule))
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn aggregate_code(code: &str) -> String {
    if code.starts_with(AGGREGATE_PREFIX) {
        code.to_string()
    } else {
        format!("{}{}", AGGREGATE_PREFIX, code)
    }
}
