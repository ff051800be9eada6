//! ABC (Pareto) classification of entities by cumulative share

use serde::Serialize;
use std::fmt;

use crate::consts::{CLASS_A_LIMIT, CLASS_B_LIMIT};
use crate::core::aggregator::AggregateRow;
use crate::core::metrics::{compare_values, ratio};
use crate::core::types::Metric;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub(crate) enum AbcClass {
    A,
    B,
    C,
}

impl AbcClass {
    pub(crate) const ALL: [AbcClass; 3] = [AbcClass::A, AbcClass::B, AbcClass::C];

    /// Thresholds are inclusive: exactly 0.80 is still A, exactly 0.95 still B
    pub(crate) fn from_cumulative(cumulative: f64) -> Self {
        if cumulative <= CLASS_A_LIMIT {
            AbcClass::A
        } else if cumulative <= CLASS_B_LIMIT {
            AbcClass::B
        } else {
            AbcClass::C
        }
    }

    pub(crate) fn description(self) -> &'static str {
        match self {
            AbcClass::A => "Vital",
            AbcClass::B => "Intermediate",
            AbcClass::C => "Long tail",
        }
    }
}

impl fmt::Display for AbcClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AbcClass::A => "A",
            AbcClass::B => "B",
            AbcClass::C => "C",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AbcRow {
    pub(crate) entity: String,
    pub(crate) revenue: f64,
    pub(crate) insertions: f64,
    /// Value of the classification metric
    pub(crate) value: f64,
    pub(crate) share: Option<f64>,
    pub(crate) cumulative_share: Option<f64>,
    pub(crate) class: AbcClass,
    pub(crate) unit_cost: Option<f64>,
}

/// Rank entities by `metric` and assign A/B/C classes
///
/// When the metric total is zero no share is defined; every entity then sits
/// at a cumulative share of zero and is class A.
pub(crate) fn classify(rows: &[AggregateRow], metric: Metric) -> Vec<AbcRow> {
    let mut ranked: Vec<&AggregateRow> = rows.iter().collect();
    ranked.sort_by(|a, b| compare_values(b.total.metric(metric), a.total.metric(metric)));

    let total: f64 = ranked.iter().map(|r| r.total.metric(metric)).sum();
    let mut running = 0.0;
    ranked
        .into_iter()
        .map(|row| {
            let value = row.total.metric(metric);
            running += value;
            let cumulative_share = ratio(running, total);
            AbcRow {
                entity: row.label(),
                revenue: row.total.revenue,
                insertions: row.total.insertions,
                value,
                share: ratio(value, total),
                cumulative_share,
                class: AbcClass::from_cumulative(cumulative_share.unwrap_or(0.0)),
                unit_cost: row.total.unit_cost(),
            }
        })
        .collect()
}

/// Aggregate of one class
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ClassSummary {
    pub(crate) class: AbcClass,
    pub(crate) entities: usize,
    pub(crate) revenue: f64,
    pub(crate) insertions: f64,
}

/// One summary per class, zero-filled for empty classes
pub(crate) fn summarize(rows: &[AbcRow]) -> Vec<ClassSummary> {
    AbcClass::ALL
        .iter()
        .map(|class| {
            let members = rows.iter().filter(|r| r.class == *class);
            let mut summary = ClassSummary {
                class: *class,
                entities: 0,
                revenue: 0.0,
                insertions: 0.0,
            };
            for r in members {
                summary.entities += 1;
                summary.revenue += r.revenue;
                summary.insertions += r.insertions;
            }
            summary
        })
        .collect()
}
