//! Active selection applied to the transaction table before any report runs

use std::collections::BTreeSet;

use serde::Serialize;

use crate::consts::MONTH_ABBREVIATIONS;
use crate::core::{MonthRange, Table, Transaction};
use crate::data::schema::{parse_month, parse_year};
use crate::error::AppError;

/// Year range, months and categorical selections; empty lists mean "all"
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Selection {
    pub(crate) from_year: Option<i32>,
    pub(crate) to_year: Option<i32>,
    pub(crate) months: BTreeSet<u32>,
    pub(crate) broadcasters: BTreeSet<String>,
    pub(crate) executives: BTreeSet<String>,
    pub(crate) clients: BTreeSet<String>,
}

impl Selection {
    /// Year bounds in ascending order regardless of how they were given
    fn year_bounds(&self) -> (Option<i32>, Option<i32>) {
        match (self.from_year, self.to_year) {
            (Some(a), Some(b)) => (Some(a.min(b)), Some(a.max(b))),
            other => other,
        }
    }

    pub(crate) fn apply(&self, table: &Table) -> Table {
        let (lo, hi) = self.year_bounds();
        let filtered = table.retain(|t| {
            lo.is_none_or(|y| t.year >= y)
                && hi.is_none_or(|y| t.year <= y)
                && (self.months.is_empty() || self.months.contains(&t.month))
                && (self.broadcasters.is_empty() || self.broadcasters.contains(&t.broadcaster))
                && (self.executives.is_empty() || self.executives.contains(&t.executive))
                && (self.clients.is_empty() || self.clients.contains(&t.client))
        });
        tracing::debug!(
            before = table.len(),
            after = filtered.len(),
            "selection applied"
        );
        filtered
    }

    /// Range reports re-slice with: min and max of the selected months
    pub(crate) fn month_range(&self) -> MonthRange {
        match (self.months.first(), self.months.last()) {
            (Some(lo), Some(hi)) => MonthRange::new(*lo, *hi),
            _ => MonthRange::ALL,
        }
    }

    /// Human readable summary of the active filters
    pub(crate) fn describe(&self) -> String {
        let period = match self.year_bounds() {
            (Some(a), Some(b)) => format!("{a} to {b}"),
            (Some(a), None) => format!("from {a}"),
            (None, Some(b)) => format!("until {b}"),
            (None, None) => "All".to_string(),
        };
        let months = if self.months.is_empty() {
            "All".to_string()
        } else {
            self.months
                .iter()
                .map(|m| month_abbreviation(*m))
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "Period (year): {period} | Months: {months} | Broadcasters: {} | Executives: {} | Clients: {}",
            describe_list(&self.broadcasters),
            describe_list(&self.executives),
            describe_list(&self.clients),
        )
    }
}

fn describe_list(values: &BTreeSet<String>) -> String {
    if values.is_empty() {
        "All".to_string()
    } else {
        values.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

pub(crate) fn month_abbreviation(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_ABBREVIATIONS.get(i as usize))
        .copied()
        .unwrap_or("?")
}

/// Parse a `--months` value: comma separated numbers, names, or `a-b` ranges
pub(crate) fn parse_months(input: &str) -> Result<BTreeSet<u32>, AppError> {
    let invalid = |part: &str| AppError::InvalidMonth {
        input: part.to_string(),
    };
    let mut months = BTreeSet::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some((a, b)) = part.split_once('-') {
            let start = parse_month(a).ok_or_else(|| invalid(part))?;
            let end = parse_month(b).ok_or_else(|| invalid(part))?;
            let range = MonthRange::new(start, end);
            months.extend(range.start..=range.end);
        } else {
            months.insert(parse_month(part).ok_or_else(|| invalid(part))?);
        }
    }
    Ok(months)
}

pub(crate) fn parse_year_arg(input: &str) -> Result<i32, AppError> {
    parse_year(input).ok_or_else(|| AppError::InvalidYear {
        input: input.to_string(),
    })
}

pub(crate) fn available_years(table: &Table) -> Vec<i32> {
    table.years().into_iter().collect()
}

pub(crate) fn available_months(table: &Table) -> Vec<u32> {
    let months: BTreeSet<u32> = table.rows.iter().map(|t| t.month).collect();
    months.into_iter().collect()
}

fn distinct<F>(table: &Table, key: F) -> Vec<String>
where
    F: Fn(&Transaction) -> &str,
{
    let values: BTreeSet<&str> = table.rows.iter().map(key).filter(|v| !v.is_empty()).collect();
    values.into_iter().map(str::to_string).collect()
}

pub(crate) fn available_broadcasters(table: &Table) -> Vec<String> {
    distinct(table, |t| t.broadcaster.as_str())
}

pub(crate) fn available_executives(table: &Table) -> Vec<String> {
    distinct(table, |t| t.executive.as_str())
}

pub(crate) fn available_clients(table: &Table) -> Vec<String> {
    distinct(table, |t| t.client.as_str())
}

/// Every value a selection can pick from
#[derive(Debug, Clone, Serialize)]
pub(crate) struct AvailableFilters {
    pub(crate) years: Vec<i32>,
    pub(crate) months: Vec<&'static str>,
    pub(crate) broadcasters: Vec<String>,
    pub(crate) executives: Vec<String>,
    pub(crate) clients: Vec<String>,
}

impl AvailableFilters {
    pub(crate) fn of(table: &Table) -> Self {
        AvailableFilters {
            years: available_years(table),
            months: available_months(table).into_iter().map(month_abbreviation).collect(),
            broadcasters: available_broadcasters(table),
            executives: available_executives(table),
            clients: available_clients(table),
        }
    }

    /// `(label, values)` pairs in display order
    pub(crate) fn entries(&self) -> Vec<(&'static str, String)> {
        let years: Vec<String> = self.years.iter().map(i32::to_string).collect();
        vec![
            ("Years", join_or_none(&years)),
            ("Months", join_or_none(&self.months)),
            ("Broadcasters", join_or_none(&self.broadcasters)),
            ("Executives", join_or_none(&self.executives)),
            ("Clients", join_or_none(&self.clients)),
        ]
    }
}

fn join_or_none<S: AsRef<str>>(values: &[S]) -> String {
    if values.is_empty() {
        return "-".to_string();
    }
    values.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", ")
}
