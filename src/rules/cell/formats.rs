//! Format predicates
//!
//! Every rule here is an `is_*` predicate: dispatch skips it when the option
//! is false or the cell is empty, so the checks below only see real values.

use std::net::Ipv4Addr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use serde_json::Value;
use url::Url;
use uuid::{Uuid, Variant};

use super::codes::{COUNTRY_CODES, CURRENCY_CODES, LANGUAGE_CODES};
use crate::rules::options::parse_number;
use crate::rules::CellRule;
use crate::schema::{SchemaError, SchemaResult};

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]{0,61}[A-Za-z0-9])?)+$";
const DOMAIN_PATTERN: &str = r"^(?:[A-Za-z0-9](?:[A-Za-z0-9\-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$";
const GEOHASH_PATTERN: &str = r"^[0-9b-hjkmnp-z]{1,12}$";
const MARKET_NAME_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9 .'\-]*, [A-Z]{2}$";

const CARDINAL_DIRECTIONS: &[&str] = &["N", "S", "E", "W", "NE", "SE", "NW", "SW"];

/// A predicate backed by a plain function.
struct Predicate {
    what: &'static str,
    test: fn(&str) -> bool,
}

impl CellRule for Predicate {
    fn check(&self, value: &str) -> Option<String> {
        if (self.test)(value) {
            return None;
        }
        Some(format!("Value \"<c>{}</c>\" is not a valid {}", value, self.what))
    }
}

fn predicate(what: &'static str, test: fn(&str) -> bool) -> SchemaResult<Box<dyn CellRule>> {
    Ok(Box::new(Predicate { what, test }))
}

/// A predicate backed by a regular expression.
struct PatternPredicate {
    what: &'static str,
    regex: Regex,
}

impl CellRule for PatternPredicate {
    fn check(&self, value: &str) -> Option<String> {
        if self.regex.is_match(value) {
            return None;
        }
        Some(format!("Value \"<c>{}</c>\" is not a valid {}", value, self.what))
    }
}

fn pattern(
    code: &'static str,
    what: &'static str,
    source: &str,
) -> SchemaResult<Box<dyn CellRule>> {
    let regex = Regex::new(source).map_err(|e| SchemaError::invalid_option(code, e.to_string()))?;
    Ok(Box::new(PatternPredicate { what, regex }))
}

/// A bounded float. Latitude and longitude are specializations of this;
/// only the specializations are registered as rules.
struct FloatRange {
    what: &'static str,
    min: f64,
    max: f64,
}

impl CellRule for FloatRange {
    fn check(&self, value: &str) -> Option<String> {
        match parse_number(value) {
            Some(number) if number >= self.min && number <= self.max => None,
            Some(_) => Some(format!(
                "Value \"<c>{}</c>\" is not a valid {} ({} -> {})",
                value, self.what, self.min, self.max
            )),
            None => Some(format!("Value \"<c>{}</c>\" is not a float number", value)),
        }
    }
}

pub fn is_bool(_code: &'static str, _option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    predicate("boolean", |v| {
        v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("false")
    })
}

pub fn is_ip4(_code: &'static str, _option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    predicate("IPv4", |v| v.parse::<Ipv4Addr>().is_ok())
}

pub fn is_url(_code: &'static str, _option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    predicate("URL", |v| {
        Url::parse(v).map_or(false, |url| url.has_host() && !url.cannot_be_a_base())
    })
}

pub fn is_email(code: &'static str, _option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    pattern(code, "email", EMAIL_PATTERN)
}

pub fn is_domain(code: &'static str, _option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    pattern(code, "domain", DOMAIN_PATTERN)
}

/// UUID v4 in the hyphenated form `xxxxxxxx-xxxx-4xxx-[89ab]xxx-xxxxxxxxxxxx`.
pub fn is_uuid(_code: &'static str, _option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    predicate("UUID v4", |v| {
        v.len() == 36
            && Uuid::try_parse(v).map_or(false, |uuid| {
                uuid.get_version_num() == 4 && uuid.get_variant() == Variant::RFC4122
            })
    })
}

pub fn is_currency_code(_code: &'static str, _option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    predicate("ISO 4217 currency code", |v| CURRENCY_CODES.contains(&v))
}

pub fn is_base64(_code: &'static str, _option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    predicate("base64 string", |v| STANDARD.decode(v).is_ok())
}

pub fn is_json(_code: &'static str, _option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    predicate("JSON", |v| serde_json::from_str::<Value>(v).is_ok())
}

pub fn is_latitude(_code: &'static str, _option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    Ok(Box::new(FloatRange {
        what: "latitude",
        min: -90.0,
        max: 90.0,
    }))
}

pub fn is_longitude(_code: &'static str, _option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    Ok(Box::new(FloatRange {
        what: "longitude",
        min: -180.0,
        max: 180.0,
    }))
}

pub fn is_geohash(code: &'static str, _option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    pattern(code, "geohash", GEOHASH_PATTERN)
}

pub fn is_cardinal_direction(
    _code: &'static str,
    _option: &Value,
) -> SchemaResult<Box<dyn CellRule>> {
    predicate("cardinal direction", |v| CARDINAL_DIRECTIONS.contains(&v))
}

/// `"<text>, <2-letter code>"`, e.g. `"Berlin, DE"`.
pub fn is_usa_market_name(code: &'static str, _option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    pattern(code, "market name", MARKET_NAME_PATTERN)
}

pub fn is_country_code(_code: &'static str, _option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    predicate("ISO 3166-1 alpha-2 country code", |v| COUNTRY_CODES.contains(&v))
}

pub fn is_language_code(_code: &'static str, _option: &Value) -> SchemaResult<Box<dyn CellRule>> {
    predicate("ISO 639-1 language code", |v| LANGUAGE_CODES.contains(&v))
}
