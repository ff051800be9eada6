//! Report builders
//!
//! Each report is a pure function of the filtered table and explicit
//! parameters, assembled from the core engine.

mod abc;
mod chart;
mod churn;
mod clients;
mod efficiency;
mod overlap;
mod overview;

use clap::ValueEnum;
use serde::Serialize;

use crate::consts::DEFAULT_TOP_SHARED;
use crate::core::{ColumnKind, Metric, MonthRange, OverlapMetric, Period, ResultTable, Table, Value};
use crate::error::AppError;

pub(crate) use chart::ChartSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ReportKind {
    /// Revenue KPIs, monthly evolution, broadcaster and executive breakdown
    Overview,
    /// Client counts, comparative revenue, averages and client relation
    Clients,
    /// Lost and new clients
    Churn,
    /// Exclusive vs shared clients and broadcaster intersections
    Overlap,
    /// ABC (Pareto) classification of clients
    Abc,
    /// Yield (revenue per insertion) analysis
    Efficiency,
}

impl ReportKind {
    pub(crate) const ALL: [ReportKind; 6] = [
        ReportKind::Overview,
        ReportKind::Clients,
        ReportKind::Churn,
        ReportKind::Overlap,
        ReportKind::Abc,
        ReportKind::Efficiency,
    ];

    pub(crate) fn name(self) -> &'static str {
        match self {
            ReportKind::Overview => "overview",
            ReportKind::Clients => "clients",
            ReportKind::Churn => "churn",
            ReportKind::Overlap => "overlap",
            ReportKind::Abc => "abc",
            ReportKind::Efficiency => "efficiency",
        }
    }

    pub(crate) fn title(self) -> &'static str {
        match self {
            ReportKind::Overview => "Overview",
            ReportKind::Clients => "Clients & Revenue",
            ReportKind::Churn => "Losses & Gains",
            ReportKind::Overlap => "Crossings & Intersections",
            ReportKind::Abc => "ABC Report",
            ReportKind::Efficiency => "Efficiency",
        }
    }
}

/// Which slice of the window the efficiency matrix covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum EfficiencyScope {
    /// Most recent year with revenue
    #[default]
    Latest,
    Year(i32),
    /// Whole selected window
    Consolidated,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReportParams {
    pub(crate) months: MonthRange,
    pub(crate) abc_metric: Metric,
    pub(crate) overlap_metric: OverlapMetric,
    pub(crate) efficiency: EfficiencyScope,
    pub(crate) top_shared: usize,
    /// Preferred ordering of broadcaster names in shared-client listings
    pub(crate) broadcaster_order: Vec<String>,
}

impl Default for ReportParams {
    fn default() -> Self {
        ReportParams {
            months: MonthRange::ALL,
            abc_metric: Metric::default(),
            overlap_metric: OverlapMetric::default(),
            efficiency: EfficiencyScope::default(),
            top_shared: DEFAULT_TOP_SHARED,
            broadcaster_order: Vec::new(),
        }
    }
}

/// Headline figure of a report
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Kpi {
    pub(crate) label: String,
    pub(crate) value: Value,
    pub(crate) kind: ColumnKind,
}

impl Kpi {
    pub(crate) fn new(label: impl Into<String>, value: impl Into<Value>, kind: ColumnKind) -> Self {
        Kpi {
            label: label.into(),
            value: value.into(),
            kind,
        }
    }
}

/// One titled block of a report: a table, a chart, or an empty-state note
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Section {
    pub(crate) title: String,
    pub(crate) table: Option<ResultTable>,
    pub(crate) chart: Option<ChartSpec>,
    pub(crate) note: Option<String>,
}

impl Section {
    /// Table section; an empty table becomes `empty_note`
    pub(crate) fn table(title: impl Into<String>, table: ResultTable, empty_note: &str) -> Self {
        let mut section = Section::note(title, empty_note);
        if !table.is_empty() {
            section.note = None;
            section.table = Some(table);
        }
        section
    }

    pub(crate) fn note(title: impl Into<String>, note: &str) -> Self {
        Section {
            title: title.into(),
            table: None,
            chart: None,
            note: Some(note.to_string()),
        }
    }

    /// Attach a chart unless the section is an empty state
    pub(crate) fn with_chart(mut self, chart: ChartSpec) -> Self {
        if self.table.is_some() {
            self.chart = Some(chart);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReportOutput {
    pub(crate) kind: ReportKind,
    pub(crate) title: String,
    pub(crate) kpis: Vec<Kpi>,
    pub(crate) sections: Vec<Section>,
}

impl ReportOutput {
    pub(crate) fn new(kind: ReportKind, title: impl Into<String>) -> Self {
        ReportOutput {
            kind,
            title: title.into(),
            kpis: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Report with a single informational note and nothing else
    pub(crate) fn empty(kind: ReportKind, note: &str) -> Self {
        let mut report = ReportOutput::new(kind, kind.title());
        report.sections.push(Section::note(kind.title(), note));
        report
    }

    pub(crate) fn section(&self, title_prefix: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title.starts_with(title_prefix))
    }
}

pub(crate) const NO_YEARS: &str = "No valid years in the selected data.";
pub(crate) const NO_DATA: &str = "No data for the selected period.";

/// Month-sliced window and comparison period shared by every report
pub(crate) struct Window {
    pub(crate) table: Table,
    pub(crate) period: Period,
}

impl Window {
    /// Slice `table` to `months`; the error is the empty-state note to show
    pub(crate) fn open(table: &Table, months: MonthRange) -> Result<Self, &'static str> {
        let period = Period::from_years(&table.years(), months).ok_or(NO_YEARS)?;
        let table = table.in_months(months);
        if table.is_empty() {
            return Err(NO_DATA);
        }
        Ok(Window { table, period })
    }

    pub(crate) fn years_label(&self) -> String {
        format!("{} vs {}", self.period.base_year, self.period.comparison_year)
    }
}

/// Build one report; a failure here never affects sibling reports
pub(crate) fn build_report(kind: ReportKind, table: &Table, params: &ReportParams) -> Result<ReportOutput, AppError> {
    let report = match kind {
        ReportKind::Overview => overview::build(table, params)?,
        ReportKind::Clients => clients::build(table, params)?,
        ReportKind::Churn => churn::build(table, params)?,
        ReportKind::Overlap => overlap::build(table, params)?,
        ReportKind::Abc => abc::build(table, params)?,
        ReportKind::Efficiency => efficiency::build(table, params)?,
    };
    tracing::debug!(
        report = kind.name(),
        sections = report.sections.len(),
        "report built"
    );
    Ok(report)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::BTreeSet;

    use crate::core::{Field, Table, Transaction};

    pub(crate) fn tx(
        client: &str,
        broadcaster: &str,
        executive: &str,
        year: i32,
        month: u32,
        revenue: f64,
        insertions: f64,
    ) -> Transaction {
        Transaction {
            client: client.to_string(),
            broadcaster: broadcaster.to_string(),
            executive: executive.to_string(),
            year,
            month,
            revenue,
            insertions,
        }
    }

    pub(crate) fn table(rows: Vec<Transaction>) -> Table {
        let present: BTreeSet<Field> = Field::ALL.into_iter().collect();
        Table::new(rows, present)
    }

    /// Two years, three broadcasters, one lost and one new client
    pub(crate) fn sample() -> Table {
        table(vec![
            tx("Acme", "TV1", "Ana", 2024, 1, 1000.0, 10.0),
            tx("Acme", "Radio", "Ana", 2024, 2, 500.0, 5.0),
            tx("Acme", "TV1", "Ana", 2025, 1, 1200.0, 12.0),
            tx("Beta", "TV1", "Bruno", 2024, 3, 300.0, 3.0),
            tx("Gone", "Radio", "Bruno", 2024, 4, 200.0, 0.0),
            tx("Fresh", "Web", "Ana", 2025, 2, 400.0, 8.0),
            tx("Beta", "Web", "Bruno", 2025, 3, 100.0, 1.0),
        ])
    }
}
