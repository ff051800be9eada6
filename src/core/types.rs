//! Core data types shared by the engine and every report
//!
//! All loaders normalize their input into `Transaction` rows; the engine only
//! ever sees these typed rows.

use clap::ValueEnum;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::core::metrics::ratio;
use crate::core::period::MonthRange;
use crate::error::AppError;

/// One advertising transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Transaction {
    pub(crate) client: String,
    pub(crate) broadcaster: String,
    pub(crate) executive: String,
    pub(crate) year: i32,
    /// 1-12
    pub(crate) month: u32,
    pub(crate) revenue: f64,
    /// Number of ad placements
    pub(crate) insertions: f64,
}

/// Canonical columns of a transaction table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Field {
    Client,
    Broadcaster,
    Executive,
    Year,
    Month,
    Revenue,
    Insertions,
}

impl Field {
    pub(crate) const ALL: [Field; 7] = [
        Field::Client,
        Field::Broadcaster,
        Field::Executive,
        Field::Year,
        Field::Month,
        Field::Revenue,
        Field::Insertions,
    ];

    pub(crate) fn name(self) -> &'static str {
        match self {
            Field::Client => "client",
            Field::Broadcaster => "broadcaster",
            Field::Executive => "executive",
            Field::Year => "year",
            Field::Month => "month",
            Field::Revenue => "revenue",
            Field::Insertions => "insertions",
        }
    }
}

/// Normalized transaction table
///
/// `present` records which canonical columns came from the source; the others
/// were filled with defaults by the normalizer.
#[derive(Debug, Clone, Default)]
pub(crate) struct Table {
    pub(crate) rows: Vec<Transaction>,
    pub(crate) present: BTreeSet<Field>,
}

impl Table {
    pub(crate) fn new(rows: Vec<Transaction>, present: BTreeSet<Field>) -> Self {
        Self { rows, present }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn has(&self, field: Field) -> bool {
        self.present.contains(&field)
    }

    /// Fail with a schema error naming every field the source lacked
    pub(crate) fn require(&self, fields: &[Field]) -> Result<(), AppError> {
        let missing: Vec<&str> = fields
            .iter()
            .filter(|f| !self.has(**f))
            .map(|f| f.name())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::missing_columns(missing))
        }
    }

    /// Same schema, different rows
    pub(crate) fn with_rows(&self, rows: Vec<Transaction>) -> Self {
        Self {
            rows,
            present: self.present.clone(),
        }
    }

    pub(crate) fn retain<F>(&self, keep: F) -> Self
    where
        F: Fn(&Transaction) -> bool,
    {
        self.with_rows(self.rows.iter().filter(|t| keep(t)).cloned().collect())
    }

    pub(crate) fn in_months(&self, months: MonthRange) -> Self {
        self.retain(|t| months.contains(t.month))
    }

    pub(crate) fn years(&self) -> BTreeSet<i32> {
        self.rows.iter().map(|t| t.year).collect()
    }
}

/// Categorical grouping dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Dimension {
    Client,
    Broadcaster,
    Executive,
    Month,
}

impl Dimension {
    pub(crate) fn column(self) -> &'static str {
        match self {
            Dimension::Client => "client",
            Dimension::Broadcaster => "broadcaster",
            Dimension::Executive => "executive",
            Dimension::Month => "month",
        }
    }

    /// Grouping key of a transaction; months are zero-padded so keys sort chronologically
    pub(crate) fn key(self, t: &Transaction) -> String {
        match self {
            Dimension::Client => t.client.clone(),
            Dimension::Broadcaster => t.broadcaster.clone(),
            Dimension::Executive => t.executive.clone(),
            Dimension::Month => format!("{:02}", t.month),
        }
    }
}

/// Summable metric used for ranking and classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Metric {
    /// Revenue (default)
    #[default]
    Revenue,
    /// Insertion count
    Insertions,
}

impl Metric {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Metric::Revenue => "revenue",
            Metric::Insertions => "insertions",
        }
    }
}

/// Any per-bucket quantity a comparative table can be built on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Measure {
    Revenue,
    Insertions,
    /// Distinct client count
    Clients,
}

impl From<Metric> for Measure {
    fn from(metric: Metric) -> Self {
        match metric {
            Metric::Revenue => Measure::Revenue,
            Metric::Insertions => Measure::Insertions,
        }
    }
}

/// Summed measures of a group of transactions
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Totals {
    pub(crate) revenue: f64,
    pub(crate) insertions: f64,
    pub(crate) transactions: i64,
    pub(crate) clients: BTreeSet<String>,
}

impl Totals {
    pub(crate) fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut totals = Totals::default();
        for t in rows {
            totals.add(t);
        }
        totals
    }

    pub(crate) fn add(&mut self, t: &Transaction) {
        self.revenue += t.revenue;
        self.insertions += t.insertions;
        self.transactions += 1;
        if !self.clients.contains(&t.client) {
            self.clients.insert(t.client.clone());
        }
    }

    pub(crate) fn merge(&mut self, other: &Totals) {
        self.revenue += other.revenue;
        self.insertions += other.insertions;
        self.transactions += other.transactions;
        self.clients.extend(other.clients.iter().cloned());
    }

    pub(crate) fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub(crate) fn metric(&self, metric: Metric) -> f64 {
        self.measure(metric.into())
    }

    pub(crate) fn measure(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Revenue => self.revenue,
            Measure::Insertions => self.insertions,
            Measure::Clients => self.clients.len() as f64,
        }
    }

    /// Revenue per insertion, computed on the sums
    pub(crate) fn unit_cost(&self) -> Option<f64> {
        ratio(self.revenue, self.insertions)
    }
}
