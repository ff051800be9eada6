//! Core engine - typed rows, aggregation and comparative analytics
//!
//! Everything in here is a pure function of the filtered transactions and
//! explicit parameters.

mod abc;
mod aggregator;
mod churn;
mod metrics;
mod overlap;
mod period;
mod table;
mod total;
mod types;

pub(crate) use abc::{AbcClass, AbcRow, ClassSummary, classify, summarize};
pub(crate) use aggregator::{AggregateRow, Aggregation};
pub(crate) use churn::{ChurnSide, churn};
pub(crate) use metrics::{
    Delta, compare_optional_desc, compare_rows, compare_values, compute_deltas, median, ratio, share,
};
pub(crate) use overlap::{Exclusivity, OverlapMatrix, OverlapMetric, PresenceMatrix, Share};
pub(crate) use period::{MonthRange, Period};
pub(crate) use table::{Column, ColumnKind, ResultTable, TotalRule, Value};
pub(crate) use total::append_total;
pub(crate) use types::{Dimension, Field, Measure, Metric, Table, Totals, Transaction};
