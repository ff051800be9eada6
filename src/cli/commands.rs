//! CLI subcommand definitions
//!
//! Each subcommand selects one or more reports and may tune their parameters.

use std::path::PathBuf;

use clap::Subcommand;

use crate::core::{Metric, OverlapMetric};
use crate::data::parse_year_arg;
use crate::error::AppError;
use crate::report::{EfficiencyScope, ReportKind, ReportParams};

/// Main CLI commands
#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Revenue KPIs, monthly evolution and breakdowns (default)
    Overview,
    /// Client counts, comparative revenue and client relation
    Clients,
    /// Lost and new clients between the compared years
    Churn,
    /// Exclusive vs shared clients and broadcaster intersections
    Overlap {
        /// Metric of the intersection matrix
        #[arg(long, value_enum, default_value = "clients")]
        metric: OverlapMetric,
        /// Number of shared clients to list
        #[arg(long, value_name = "N")]
        top: Option<usize>,
    },
    /// ABC (Pareto) classification of clients
    Abc {
        /// Metric the classes are computed on
        #[arg(long, value_enum, default_value = "revenue")]
        metric: Metric,
    },
    /// Yield (revenue per insertion) analysis
    Efficiency {
        /// Year of the efficiency matrix (default: most recent)
        #[arg(long, value_name = "YEAR")]
        year: Option<String>,
        /// Use the whole selected window instead of a single year
        #[arg(long, conflicts_with = "year")]
        consolidated: bool,
    },
    /// Every report, one after the other
    All,
    /// List the years, months and names the filters can select
    Filters,
    /// Pack tables and charts of the selected reports into a zip archive
    Export {
        /// Archive path (default: adrev-<report>.zip or adrev-export.zip in config `export_dir`)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Report to include (repeatable; default: all)
        #[arg(long = "report", value_enum, value_name = "REPORT")]
        reports: Vec<ReportKind>,
    },
}

/// What the invocation asks for, independent of how it was spelled
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    Show(Vec<ReportKind>),
    ListFilters,
    Export {
        reports: Vec<ReportKind>,
        out: Option<PathBuf>,
    },
}

impl Action {
    pub(crate) fn reports(&self) -> &[ReportKind] {
        match self {
            Action::Show(reports) | Action::Export { reports, .. } => reports,
            Action::ListFilters => &[],
        }
    }
}

/// Parse the subcommand into an action, applying its options to `params`
pub(crate) fn parse_command(cmd: &Option<Commands>, params: &mut ReportParams) -> Result<Action, AppError> {
    let action = match cmd {
        None | Some(Commands::Overview) => Action::Show(vec![ReportKind::Overview]),
        Some(Commands::Clients) => Action::Show(vec![ReportKind::Clients]),
        Some(Commands::Churn) => Action::Show(vec![ReportKind::Churn]),
        Some(Commands::Overlap { metric, top }) => {
            params.overlap_metric = *metric;
            if let Some(top) = top {
                params.top_shared = *top;
            }
            Action::Show(vec![ReportKind::Overlap])
        }
        Some(Commands::Abc { metric }) => {
            params.abc_metric = *metric;
            Action::Show(vec![ReportKind::Abc])
        }
        Some(Commands::Efficiency { year, consolidated }) => {
            params.efficiency = match (year, consolidated) {
                (_, true) => EfficiencyScope::Consolidated,
                (Some(year), false) => EfficiencyScope::Year(parse_year_arg(year)?),
                (None, false) => EfficiencyScope::Latest,
            };
            Action::Show(vec![ReportKind::Efficiency])
        }
        Some(Commands::All) => Action::Show(ReportKind::ALL.to_vec()),
        Some(Commands::Filters) => Action::ListFilters,
        Some(Commands::Export { out, reports }) => {
            let mut unique: Vec<ReportKind> = Vec::new();
            for kind in reports {
                if !unique.contains(kind) {
                    unique.push(*kind);
                }
            }
            let reports = if unique.is_empty() {
                ReportKind::ALL.to_vec()
            } else {
                unique
            };
            Action::Export {
                reports,
                out: out.clone(),
            }
        }
    };
    Ok(action)
}
