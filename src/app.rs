use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Action, Cli, parse_command};
use crate::config::Config;
use crate::consts::{DEFAULT_TOP_SHARED, FALLBACK_YEAR};
use crate::core::Table;
use crate::data::{AvailableFilters, load_table};
use crate::error::AppError;
use crate::export::{Packager, ZipPackager, export_items};
use crate::output::{NumberFormat, TableOptions, output_report_csv, output_report_json, print_report_table};
use crate::report::{ReportKind, ReportOutput, ReportParams, build_report};


/// Stderr logging; `RUST_LOG` wins over `--debug`
fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub(crate) fn run() -> Result<(), AppError> {
    let config = Config::load();
    let cli = Cli::parse().with_config(&config);
    init_tracing(cli.debug);
    if let Some(path) = config.source() {
        tracing::debug!(path = %path.display(), "config loaded");
    }

    let number_format = NumberFormat::from_locale(cli.locale.as_deref())?;
    let selection = cli.selection()?;

    let pattern = cli.data.as_deref().ok_or(AppError::NoDataSource)?;
    let (table, normalized) = load_table(pattern, config.fallback_year.unwrap_or(FALLBACK_YEAR))?;
    let table = selection.apply(&table);
    tracing::debug!(
        rows_read = normalized.rows_read,
        rows_selected = table.len(),
        filters = %selection.describe(),
        "selection ready"
    );

    let mut params = ReportParams {
        months: selection.month_range(),
        top_shared: config.top_shared.unwrap_or(DEFAULT_TOP_SHARED),
        broadcaster_order: config.broadcaster_order.clone(),
        ..ReportParams::default()
    };
    let action = parse_command(&cli.command, &mut params)?;

    match action {
        Action::ListFilters => show_filters(&table, &cli),
        Action::Show(kinds) => {
            let reports = build_reports(&kinds, &table, &params)?;
            if cli.json {
                output_report_json(&reports)
            } else if cli.csv {
                output_report_csv(&reports)
            } else {
                let opts = TableOptions {
                    use_color: cli.use_color(),
                    number_format,
                };
                for report in &reports {
                    print_report_table(report, opts);
                }
                Ok(())
            }
        }
        Action::Export { reports, out } => {
            let built = build_reports(&reports, &table, &params)?;
            let out: PathBuf = out.unwrap_or_else(|| {
                config
                    .export_dir
                    .clone()
                    .unwrap_or_default()
                    .join(archive_name(&reports))
            });
            let path = ZipPackager::new(out).package(&export_items(&built), &selection.describe())?;
            println!("Export archive written to {}", path.display());
            Ok(())
        }
    }
}

/// `adrev-<report>.zip` for a single report, `adrev-export.zip` otherwise
fn archive_name(reports: &[ReportKind]) -> String {
    match reports {
        [kind] => format!("adrev-{}.zip", kind.name()),
        _ => "adrev-export.zip".to_string(),
    }
}

/// Build each report; with several requested, a failing one is reported and skipped
fn build_reports(kinds: &[ReportKind], table: &Table, params: &ReportParams) -> Result<Vec<ReportOutput>, AppError> {
    if let [kind] = kinds {
        return Ok(vec![build_report(*kind, table, params)?]);
    }
    let mut reports = Vec::with_capacity(kinds.len());
    for kind in kinds {
        match build_report(*kind, table, params) {
            Ok(report) => reports.push(report),
            Err(e) => {
                tracing::warn!(report = kind.name(), error = %e, "report skipped");
                eprintln!("Warning: {} skipped: {e}", kind.title());
            }
        }
    }
    Ok(reports)
}

fn show_filters(table: &Table, cli: &Cli) -> Result<(), AppError> {
    let filters = AvailableFilters::of(table);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&filters)?);
        return Ok(());
    }
    let entries = filters.entries();
    let width = entries.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    for (label, values) in entries {
        println!("  {label:<width$}  {values}");
    }
    Ok(())
}
