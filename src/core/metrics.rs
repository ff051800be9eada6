//! Comparative metrics: deltas, percentages, shares and unit costs
//!
//! Every ratio is `Option<f64>`: `None` means the denominator was not
//! positive and the value is undefined, which is different from zero.

use std::cmp::Ordering;

use crate::core::aggregator::AggregateRow;
use crate::core::period::Period;
use crate::core::types::Measure;

/// `num / den`, defined only when `den > 0`
pub(crate) fn ratio(num: f64, den: f64) -> Option<f64> {
    if den > 0.0 { Some(num / den) } else { None }
}

/// Percentage change from `base` to `comparison`, undefined when `base <= 0`
pub(crate) fn percent_change(base: f64, comparison: f64) -> Option<f64> {
    ratio(comparison - base, base).map(|r| r * 100.0)
}

/// Two-period comparison of one measure
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Delta {
    pub(crate) base: f64,
    pub(crate) comparison: f64,
    pub(crate) delta: f64,
    pub(crate) delta_pct: Option<f64>,
}

impl Delta {
    pub(crate) fn between(base: f64, comparison: f64) -> Self {
        Delta {
            base,
            comparison,
            delta: comparison - base,
            delta_pct: percent_change(base, comparison),
        }
    }
}

/// Aggregate row with its base/comparison delta attached
#[derive(Debug, Clone)]
pub(crate) struct ComparativeRow<'a> {
    pub(crate) row: &'a AggregateRow,
    pub(crate) delta: Delta,
}

/// Compare one measure of a year-split aggregate row across the period
///
/// Missing year buckets read as zero, so a group absent from the base year gets
/// an undefined `delta_pct` rather than an error.
pub(crate) fn compute_deltas(row: &AggregateRow, period: &Period, measure: Measure) -> Delta {
    Delta::between(
        row.year_value(period.base_year, measure),
        row.year_value(period.comparison_year, measure),
    )
}

pub(crate) fn compare_rows<'a>(
    rows: &'a [AggregateRow],
    period: &Period,
    measure: Measure,
) -> Vec<ComparativeRow<'a>> {
    rows.iter()
        .map(|row| ComparativeRow {
            row,
            delta: compute_deltas(row, period, measure),
        })
        .collect()
}

/// Share of `value` in `total`
pub(crate) fn share(value: f64, total: f64) -> Option<f64> {
    ratio(value, total)
}

/// Median of the finite values, `None` when empty
pub(crate) fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| compare_values(*a, *b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Total order over floats, NaN last
pub(crate) fn compare_values(a: f64, b: f64) -> Ordering {
    if a.is_nan() && b.is_nan() {
        Ordering::Equal
    } else if a.is_nan() {
        Ordering::Greater
    } else if b.is_nan() {
        Ordering::Less
    } else {
        a.partial_cmp(&b).unwrap_or(Ordering::Equal)
    }
}

/// Descending order over optional values with undefined values last
pub(crate) fn compare_optional_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => compare_values(y, x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::core::aggregator::Aggregation;
    use crate::core::period::MonthRange;
    use crate::core::types::{Dimension, Transaction};

    fn tx(client: &str, year: i32, revenue: f64) -> Transaction {
        Transaction {
            client: client.to_string(),
            broadcaster: "A".to_string(),
            executive: String::new(),
            year,
            month: 1,
            revenue,
            insertions: 1.0,
        }
    }

    #[test]
    fn ratio_undefined_on_zero_denominator() {
        assert_eq!(ratio(10.0, 0.0), None);
        assert_eq!(ratio(0.0, 0.0), None);
        assert_eq!(ratio(10.0, 4.0), Some(2.5));
    }

    #[test]
    fn delta_pct_defined_iff_base_positive() {
        assert_eq!(Delta::between(0.0, 100.0).delta_pct, None);
        assert_eq!(Delta::between(0.0, 0.0).delta_pct, None);
        assert_eq!(Delta::between(100.0, 0.0).delta_pct, Some(-100.0));
        assert_eq!(Delta::between(100.0, 150.0).delta_pct, Some(50.0));
    }

    #[test]
    fn lost_client_has_full_negative_change() {
        let rows = vec![tx("Y", 2024, 1000.0), tx("Z", 2025, 10.0)];
        let period = Period {
            base_year: 2024,
            comparison_year: 2025,
            months: MonthRange::ALL,
        };
        let agg = Aggregation::by(&[Dimension::Client])
            .split_by_years(&period.years())
            .listed()
            .run(&rows);
        let y = agg.iter().find(|r| r.key[0] == "Y").unwrap();
        let d = compute_deltas(y, &period, Measure::Revenue);
        assert_eq!(d.delta, -1000.0);
        assert_eq!(d.delta_pct, Some(-100.0));
    }

    #[test]
    fn same_year_period_yields_zero_delta() {
        let rows = vec![tx("Y", 2024, 300.0)];
        let period = Period {
            base_year: 2024,
            comparison_year: 2024,
            months: MonthRange::ALL,
        };
        let agg = Aggregation::by(&[Dimension::Client])
            .split_by_years(&period.years())
            .run(&rows);
        let d = compute_deltas(&agg[0], &period, Measure::Revenue);
        assert_eq!(d.delta, 0.0);
        assert_eq!(d.delta_pct, Some(0.0));
    }

    #[test]
    fn median_even_and_odd() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
    }

    #[test]
    fn compare_optional_desc_puts_undefined_last() {
        let mut values = vec![None, Some(1.0), Some(3.0), None, Some(2.0)];
        values.sort_by(|a, b| compare_optional_desc(*a, *b));
        assert_eq!(values, vec![Some(3.0), Some(2.0), Some(1.0), None, None]);
    }

    #[test]
    fn compare_values_nan_last() {
        assert_eq!(compare_values(f64::NAN, 1.0), Ordering::Greater);
        assert_eq!(compare_values(1.0, f64::NAN), Ordering::Less);
        assert_eq!(compare_values(1.0, 2.0), Ordering::Less);
    }
}
