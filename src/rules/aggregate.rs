//! Aggregate (whole-column) rules
//!
//! Every numeric family computes one statistic over the column and compares
//! it with the expected number. Values coerce like as-float, so a
//! non-numeric cell counts as 0.
//!
//! A statistic that is undefined for the column (the mean of nothing, the
//! sample variance of one value) makes the rule a no-op. Counts are always
//! defined and are evaluated against empty columns too.

use std::collections::HashSet;

use serde_json::Value;

use crate::rules::options::{as_float, as_string, format_number, parse_number};
use crate::rules::{non_negative, AggregateRule, Comparison};
use crate::schema::SchemaResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Statistic {
    Sum,
    Average,
    Median,
    Count,
    CountEmpty,
    CountNotEmpty,
    PopulationVariance,
    SampleVariance,
    PopulationStddev,
    SampleStddev,
    CoefficientOfVariation,
}

impl Statistic {
    fn label(self) -> &'static str {
        match self {
            Statistic::Sum => "sum",
            Statistic::Average => "average",
            Statistic::Median => "median",
            Statistic::Count => "number of rows",
            Statistic::CountEmpty => "number of empty rows",
            Statistic::CountNotEmpty => "number of not empty rows",
            Statistic::PopulationVariance => "population variance",
            Statistic::SampleVariance => "sample variance",
            Statistic::PopulationStddev => "population standard deviation",
            Statistic::SampleStddev => "sample standard deviation",
            Statistic::CoefficientOfVariation => "coefficient of variation",
        }
    }

    fn is_count(self) -> bool {
        matches!(
            self,
            Statistic::Count | Statistic::CountEmpty | Statistic::CountNotEmpty
        )
    }

    /// `None` when the statistic is undefined for `values`.
    fn compute(self, values: &[String]) -> Option<f64> {
        match self {
            Statistic::Count => Some(values.len() as f64),
            Statistic::CountEmpty => Some(values.iter().filter(|v| v.is_empty()).count() as f64),
            Statistic::CountNotEmpty => {
                Some(values.iter().filter(|v| !v.is_empty()).count() as f64)
            }
            Statistic::Sum => Some(numbers(values).iter().sum()),
            Statistic::Average => mean(&numbers(values)),
            Statistic::Median => median(numbers(values)),
            Statistic::PopulationVariance => variance(&numbers(values), 0),
            Statistic::SampleVariance => variance(&numbers(values), 1),
            Statistic::PopulationStddev => variance(&numbers(values), 0).map(f64::sqrt),
            Statistic::SampleStddev => variance(&numbers(values), 1).map(f64::sqrt),
            Statistic::CoefficientOfVariation => {
                let numbers = numbers(values);
                let mean = mean(&numbers)?;
                if mean == 0.0 {
                    return None;
                }
                Some(variance(&numbers, 0)?.sqrt() / mean)
            }
        }
    }
}

fn numbers(values: &[String]) -> Vec<f64> {
    values
        .iter()
        .map(|v| parse_number(v).unwrap_or(0.0))
        .collect()
}

fn mean(numbers: &[f64]) -> Option<f64> {
    if numbers.is_empty() {
        return None;
    }
    Some(numbers.iter().sum::<f64>() / numbers.len() as f64)
}

fn median(mut numbers: Vec<f64>) -> Option<f64> {
    if numbers.is_empty() {
        return None;
    }
    numbers.sort_by(f64::total_cmp);
    let middle = numbers.len() / 2;
    if numbers.len() % 2 == 0 {
        Some((numbers[middle - 1] + numbers[middle]) / 2.0)
    } else {
        Some(numbers[middle])
    }
}

/// `ddof` 0 is the population variance, 1 the sample variance.
fn variance(numbers: &[f64], ddof: usize) -> Option<f64> {
    if numbers.len() <= ddof {
        return None;
    }
    let mean = mean(numbers)?;
    let squares: f64 = numbers.iter().map(|n| (n - mean).powi(2)).sum();
    Some(squares / (numbers.len() - ddof) as f64)
}

struct StatCombo {
    statistic: Statistic,
    comparison: Comparison,
    expected: f64,
    expected_label: String,
}

impl AggregateRule for StatCombo {
    fn check(&self, values: &[String]) -> Option<String> {
        let actual = self.statistic.compute(values)?;
        if self.comparison.holds(actual, self.expected) {
            return None;
        }
        let subject = format!("The {} in the column", self.statistic.label());
        Some(
            self.comparison
                .describe(&subject, &format_number(actual), &self.expected_label),
        )
    }
}

fn combo(
    code: &'static str,
    option: &Value,
    statistic: Statistic,
) -> SchemaResult<Box<dyn AggregateRule>> {
    let mut expected = as_float(option);
    if statistic.is_count() {
        expected = non_negative(code, expected)?;
    }
    Ok(Box::new(StatCombo {
        statistic,
        comparison: Comparison::from_code(code),
        expected,
        expected_label: as_string(option),
    }))
}

struct IsUnique;

impl AggregateRule for IsUnique {
    fn check(&self, values: &[String]) -> Option<String> {
        let unique = values.iter().collect::<HashSet<_>>().len();
        if unique == values.len() {
            return None;
        }
        Some(format!(
            "Column has non-unique values. Unique: <c>{}</c>, total: <green>{}</green>",
            unique,
            values.len()
        ))
    }
}

pub fn is_unique(_code: &'static str, _option: &Value) -> SchemaResult<Box<dyn AggregateRule>> {
    Ok(Box::new(IsUnique))
}

pub fn sum(code: &'static str, option: &Value) -> SchemaResult<Box<dyn AggregateRule>> {
    combo(code, option, Statistic::Sum)
}

pub fn average(code: &'static str, option: &Value) -> SchemaResult<Box<dyn AggregateRule>> {
    combo(code, option, Statistic::Average)
}

pub fn median_rule(code: &'static str, option: &Value) -> SchemaResult<Box<dyn AggregateRule>> {
    combo(code, option, Statistic::Median)
}

pub fn count(code: &'static str, option: &Value) -> SchemaResult<Box<dyn AggregateRule>> {
    combo(code, option, Statistic::Count)
}

pub fn count_empty(code: &'static str, option: &Value) -> SchemaResult<Box<dyn AggregateRule>> {
    combo(code, option, Statistic::CountEmpty)
}

pub fn count_not_empty(code: &'static str, option: &Value) -> SchemaResult<Box<dyn AggregateRule>> {
    combo(code, option, Statistic::CountNotEmpty)
}

pub fn population_variance(
    code: &'static str,
    option: &Value,
) -> SchemaResult<Box<dyn AggregateRule>> {
    combo(code, option, Statistic::PopulationVariance)
}

pub fn sample_variance(code: &'static str, option: &Value) -> SchemaResult<Box<dyn AggregateRule>> {
    combo(code, option, Statistic::SampleVariance)
}

pub fn population_stddev(
    code: &'static str,
    option: &Value,
) -> SchemaResult<Box<dyn AggregateRule>> {
    combo(code, option, Statistic::PopulationStddev)
}

pub fn sample_stddev(code: &'static str, option: &Value) -> SchemaResult<Box<dyn AggregateRule>> {
    combo(code, option, Statistic::SampleStddev)
}

pub fn coef_of_var(code: &'static str, option: &Value) -> SchemaResult<Box<dyn AggregateRule>> {
    combo(code, option, Statistic::CoefficientOfVariation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_mean_and_median_of_empty_column_are_noop() {
        let empty: Vec<String> = Vec::new();
        for expected in [json!(0), json!(5), json!(-1)] {
            assert!(average("ag:average", &expected).unwrap().check(&empty).is_none());
            assert!(median_rule("ag:median_min", &expected).unwrap().check(&empty).is_none());
        }
    }

    #[test]
    fn test_count_of_empty_column_still_evaluates() {
        let empty: Vec<String> = Vec::new();
        assert!(count("ag:count", &json!(0)).unwrap().check(&empty).is_none());
        let message = count("ag:count", &json!(3)).unwrap().check(&empty).unwrap();
        assert!(message.contains("<c>0</c>"));
        assert!(message.contains("<green>3</green>"));
    }

    #[test]
    fn test_sum_coerces_non_numeric_to_zero() {
        let values = column(&["1", "abc", "2.5"]);
        assert!(sum("ag:sum", &json!(3.5)).unwrap().check(&values).is_none());
        assert!(sum("ag:sum_max", &json!(3)).unwrap().check(&values).is_some());
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(Statistic::Median.compute(&column(&["3", "1", "2"])), Some(2.0));
        assert_eq!(
            Statistic::Median.compute(&column(&["4", "1", "2", "3"])),
            Some(2.5)
        );
    }

    #[test]
    fn test_variance_family() {
        let values = column(&["2", "4", "4", "4", "5", "5", "7", "9"]);
        assert_eq!(Statistic::PopulationVariance.compute(&values), Some(4.0));
        assert_eq!(Statistic::PopulationStddev.compute(&values), Some(2.0));
        assert_eq!(Statistic::SampleVariance.compute(&values), Some(32.0 / 7.0));
        assert_eq!(Statistic::CoefficientOfVariation.compute(&values), Some(0.4));
    }

    #[test]
    fn test_undefined_spread_is_noop() {
        let single = column(&["5"]);
        assert_eq!(Statistic::SampleVariance.compute(&single), None);
        assert_eq!(Statistic::PopulationVariance.compute(&single), Some(0.0));
        assert_eq!(Statistic::CoefficientOfVariation.compute(&column(&["0", "0"])), None);
        assert!(sample_stddev("ag:sample_stddev", &json!(1)).unwrap().check(&single).is_none());
    }

    #[test]
    fn test_count_variants() {
        let values = column(&["a", "", "b", ""]);
        assert!(count_empty("ag:count_empty", &json!(2)).unwrap().check(&values).is_none());
        assert!(count_not_empty("ag:count_not_empty_min", &json!(3))
            .unwrap()
            .check(&values)
            .is_some());
        assert!(count("ag:count_not", &json!(4)).unwrap().check(&values).is_some());
    }

    #[test]
    fn test_negative_count_rejected() {
        assert!(count("ag:count_min", &json!(-1)).is_err());
    }

    #[test]
    fn test_is_unique() {
        let rule = is_unique("ag:is_unique", &json!(true)).unwrap();
        assert!(rule.check(&column(&["a", "b", "c"])).is_none());
        let message = rule.check(&column(&["a", "b", "a"])).unwrap();
        assert!(message.contains("Unique: <c>2</c>"));
        assert!(message.contains("total: <green>3</green>"));
    }
}
