//! Lost and new clients between the base and comparison year

use std::collections::BTreeSet;

use crate::core::aggregator::{AggregateRow, Aggregation};
use crate::core::period::Period;
use crate::core::types::{Dimension, Measure, Totals, Transaction};

/// Partition of the clients of both years
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ClientSets {
    /// In the base year, absent from the comparison year
    pub(crate) lost: BTreeSet<String>,
    /// In the comparison year, absent from the base year
    pub(crate) new: BTreeSet<String>,
    /// Present in both years
    pub(crate) retained: BTreeSet<String>,
}

fn clients_in(rows: &[Transaction], year: i32) -> BTreeSet<String> {
    rows.iter()
        .filter(|t| t.year == year)
        .map(|t| t.client.clone())
        .collect()
}

pub(crate) fn client_sets(rows: &[Transaction], period: &Period) -> ClientSets {
    let base = clients_in(rows, period.base_year);
    let comparison = clients_in(rows, period.comparison_year);
    ClientSets {
        lost: base.difference(&comparison).cloned().collect(),
        new: comparison.difference(&base).cloned().collect(),
        retained: base.intersection(&comparison).cloned().collect(),
    }
}

/// One side of the churn balance
#[derive(Debug, Clone, Default)]
pub(crate) struct ChurnSide {
    /// Per-client sums in the originating year, ranked by revenue
    pub(crate) clients: Vec<AggregateRow>,
    pub(crate) totals: Totals,
}

impl ChurnSide {
    fn build(rows: &[Transaction], clients: &BTreeSet<String>, year: i32) -> Self {
        let selected: Vec<&Transaction> = rows
            .iter()
            .filter(|t| t.year == year && clients.contains(&t.client))
            .collect();
        ChurnSide {
            clients: Aggregation::by(&[Dimension::Client])
                .ranked_by(Measure::Revenue)
                .run(selected.iter().copied()),
            totals: Totals::from_rows(selected.iter().copied()),
        }
    }

    pub(crate) fn client_count(&self) -> usize {
        self.clients.len()
    }
}

/// Balance of new business against lost business
#[derive(Debug, Clone)]
pub(crate) struct ChurnSummary {
    pub(crate) sets: ClientSets,
    pub(crate) lost: ChurnSide,
    pub(crate) new: ChurnSide,
}

impl ChurnSummary {
    pub(crate) fn net_revenue(&self) -> f64 {
        self.new.totals.revenue - self.lost.totals.revenue
    }

    pub(crate) fn net_clients(&self) -> i64 {
        self.new.client_count() as i64 - self.lost.client_count() as i64
    }

    pub(crate) fn net_insertions(&self) -> f64 {
        self.new.totals.insertions - self.lost.totals.insertions
    }

    /// Defined only when both sides have a unit cost
    pub(crate) fn net_unit_cost(&self) -> Option<f64> {
        Some(self.new.totals.unit_cost()? - self.lost.totals.unit_cost()?)
    }
}

pub(crate) fn churn(rows: &[Transaction], period: &Period) -> ChurnSummary {
    let sets = client_sets(rows, period);
    let lost = ChurnSide::build(rows, &sets.lost, period.base_year);
    let new = ChurnSide::build(rows, &sets.new, period.comparison_year);
    tracing::debug!(
        lost = sets.lost.len(),
        new = sets.new.len(),
        retained = sets.retained.len(),
        "client churn"
    );
    ChurnSummary { sets, lost, new }
}
