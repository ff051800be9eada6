//! Shared aggregation engine
//!
//! Every report table is built from `Aggregation`: group transactions by one
//! or more dimensions, optionally split by year, and order the groups either
//! as a ranking or as a listing.

use std::collections::{BTreeMap, HashMap};

use crate::core::metrics::compare_values;
use crate::core::types::{Dimension, Measure, Totals, Transaction};

/// One output group
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AggregateRow {
    /// Values of the grouping dimensions, in the requested order
    pub(crate) key: Vec<String>,
    /// Sums over every transaction of the group
    pub(crate) total: Totals,
    /// Sums per requested year; every requested year is present
    pub(crate) years: BTreeMap<i32, Totals>,
}

impl AggregateRow {
    fn new(key: Vec<String>, years: &[i32]) -> Self {
        AggregateRow {
            key,
            total: Totals::default(),
            years: years.iter().map(|y| (*y, Totals::default())).collect(),
        }
    }

    fn add(&mut self, t: &Transaction) {
        self.total.add(t);
        if let Some(bucket) = self.years.get_mut(&t.year) {
            bucket.add(t);
        }
    }

    /// Display label of the group key
    pub(crate) fn label(&self) -> String {
        self.key.join(" / ")
    }

    /// First key component (the only one for single-dimension groupings)
    pub(crate) fn name(&self) -> &str {
        self.key.first().map(String::as_str).unwrap_or("")
    }

    pub(crate) fn value(&self, measure: Measure) -> f64 {
        self.total.measure(measure)
    }

    /// Measure in one year bucket; a year that was not requested reads as zero
    pub(crate) fn year_value(&self, year: i32, measure: Measure) -> f64 {
        self.years.get(&year).map_or(0.0, |t| t.measure(measure))
    }

    pub(crate) fn year_totals(&self, year: i32) -> Totals {
        self.years.get(&year).cloned().unwrap_or_default()
    }
}

/// Ordering of the aggregated groups
#[derive(Debug, Clone, Copy, PartialEq)]
enum Order {
    /// Alphabetical by group key
    Listed,
    /// Descending by a measure over the whole window
    Ranked(Measure),
    /// Descending by a measure within one year bucket
    RankedByYear(i32, Measure),
    /// First-appearance order of the groups in the input
    Input,
}

/// Builder for a group-by over transactions
#[derive(Debug, Clone)]
pub(crate) struct Aggregation {
    dimensions: Vec<Dimension>,
    years: Vec<i32>,
    order: Order,
}

impl Aggregation {
    pub(crate) fn by(dimensions: &[Dimension]) -> Self {
        Aggregation {
            dimensions: dimensions.to_vec(),
            years: Vec::new(),
            order: Order::Input,
        }
    }

    /// Materialize one bucket per year, zero-filled when the group has no rows in it
    pub(crate) fn split_by_years(mut self, years: &[i32]) -> Self {
        self.years = years.to_vec();
        self.years.dedup();
        self
    }

    pub(crate) fn ranked_by(mut self, measure: Measure) -> Self {
        self.order = Order::Ranked(measure);
        self
    }

    pub(crate) fn ranked_by_year(mut self, year: i32, measure: Measure) -> Self {
        self.order = Order::RankedByYear(year, measure);
        self
    }

    pub(crate) fn listed(mut self) -> Self {
        self.order = Order::Listed;
        self
    }

    /// Group the rows; groups without any transaction never appear
    pub(crate) fn run<'a, I>(&self, rows: I) -> Vec<AggregateRow>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut index: HashMap<Vec<String>, usize> = HashMap::new();
        let mut groups: Vec<AggregateRow> = Vec::new();

        for t in rows {
            let key: Vec<String> = self.dimensions.iter().map(|d| d.key(t)).collect();
            let slot = match index.get(&key) {
                Some(i) => *i,
                None => {
                    groups.push(AggregateRow::new(key.clone(), &self.years));
                    index.insert(key, groups.len() - 1);
                    groups.len() - 1
                }
            };
            groups[slot].add(t);
        }

        // sort_by is stable: ties keep first-appearance order
        match self.order {
            Order::Input => {}
            Order::Listed => groups.sort_by(|a, b| a.key.cmp(&b.key)),
            Order::Ranked(measure) => {
                groups.sort_by(|a, b| compare_values(b.value(measure), a.value(measure)));
            }
            Order::RankedByYear(year, measure) => groups.sort_by(|a, b| {
                compare_values(b.year_value(year, measure), a.year_value(year, measure))
            }),
        }

        tracing::debug!(
            dimensions = ?self.dimensions,
            groups = groups.len(),
            "aggregated"
        );
        groups
    }
}
