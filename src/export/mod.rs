//! Export bundles: every table and chart of the selected reports packed into one archive

use std::collections::BTreeSet;
use std::fs;
use std::io::{Cursor, Write};
use std::path::PathBuf;

use chrono::Local;
use serde::Serialize;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::consts::EXPORT_NAME_LIMIT;
use crate::core::ResultTable;
use crate::error::AppError;
use crate::output::write_table_csv;
use crate::report::{ChartSpec, ReportOutput};

pub(crate) const FILTER_BANNER: &str = "ACTIVE FILTERS AT EXPORT TIME:";

/// One exportable unit: a table, its chart, or both
#[derive(Debug, Clone)]
pub(crate) struct ExportItem {
    pub(crate) name: String,
    pub(crate) table: Option<ResultTable>,
    pub(crate) chart: Option<ChartSpec>,
}

impl ExportItem {
    fn has_table(&self) -> bool {
        self.table.as_ref().is_some_and(|t| !t.is_empty())
    }

    fn is_empty(&self) -> bool {
        !self.has_table() && self.chart.is_none()
    }
}

/// Collect the exportable sections of built reports
pub(crate) fn export_items(reports: &[ReportOutput]) -> Vec<ExportItem> {
    reports
        .iter()
        .flat_map(|report| {
            report.sections.iter().map(|section| ExportItem {
                name: section
                    .table
                    .as_ref()
                    .map_or_else(|| section.title.clone(), |t| t.name.clone()),
                table: section.table.clone(),
                chart: section.chart.clone(),
            })
        })
        .filter(|item| !item.is_empty())
        .collect()
}

/// Drop `:` and `/`, then cut to the bundle name limit
pub(crate) fn sanitize_name(name: &str) -> String {
    let cleaned: String = name.chars().filter(|c| !matches!(c, ':' | '/')).collect();
    let trimmed = cleaned.trim();
    trimmed.chars().take(EXPORT_NAME_LIMIT).collect::<String>().trim_end().to_string()
}

/// Sanitized name not yet taken; repeats get a numeric suffix
fn unique_name(name: &str, taken: &mut BTreeSet<String>) -> String {
    let base = match sanitize_name(name) {
        s if s.is_empty() => "table".to_string(),
        s => s,
    };
    let mut candidate = base.clone();
    let mut n = 2;
    while taken.contains(&candidate) {
        let suffix = format!("_{n}");
        let keep = EXPORT_NAME_LIMIT.saturating_sub(suffix.len());
        candidate = format!("{}{suffix}", base.chars().take(keep).collect::<String>());
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

pub(crate) trait Packager {
    /// Write the bundle and return its location
    fn package(&self, items: &[ExportItem], active_filters: &str) -> Result<PathBuf, AppError>;
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    created_at: String,
    filters: &'a str,
    files: Vec<String>,
}

/// Bundle written as a single deflated zip archive
///
/// The archive is assembled in memory and written to disk in one go, so a
/// failure never leaves a partial bundle behind.
#[derive(Debug, Clone)]
pub(crate) struct ZipPackager {
    out: PathBuf,
}

type Archive = ZipWriter<Cursor<Vec<u8>>>;

impl ZipPackager {
    pub(crate) fn new(out: impl Into<PathBuf>) -> Self {
        ZipPackager { out: out.into() }
    }

    fn options() -> SimpleFileOptions {
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
    }

    fn write_table(zip: &mut Archive, name: &str, table: &ResultTable, filters: &str) -> Result<(), AppError> {
        zip.start_file(name, Self::options())?;
        writeln!(zip, "{FILTER_BANNER}")?;
        writeln!(zip, "{filters}")?;
        writeln!(zip)?;
        write_table_csv(table, &mut *zip)?;
        Ok(())
    }

    fn write_json<T: Serialize>(zip: &mut Archive, name: &str, value: &T) -> Result<(), AppError> {
        zip.start_file(name, Self::options())?;
        serde_json::to_writer_pretty(&mut *zip, value)?;
        Ok(())
    }
}

impl Packager for ZipPackager {
    fn package(&self, items: &[ExportItem], active_filters: &str) -> Result<PathBuf, AppError> {
        if items.iter().all(ExportItem::is_empty) {
            return Err(AppError::Export("nothing to export: no tables or charts".to_string()));
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let mut taken = BTreeSet::new();
        let mut files = Vec::new();
        for item in items.iter().filter(|i| !i.is_empty()) {
            let name = unique_name(&item.name, &mut taken);
            if let Some(table) = item.table.as_ref().filter(|t| !t.is_empty()) {
                let file = format!("{name}.csv");
                Self::write_table(&mut zip, &file, table, active_filters)?;
                files.push(file);
            }
            if let Some(chart) = &item.chart {
                let file = format!("{name}_chart.json");
                Self::write_json(&mut zip, &file, chart)?;
                files.push(file);
            }
        }

        let manifest = Manifest {
            created_at: Local::now().to_rfc3339(),
            filters: active_filters,
            files,
        };
        Self::write_json(&mut zip, "manifest.json", &manifest)?;
        let bytes = zip.finish()?.into_inner();

        if let Some(parent) = self.out.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.out, &bytes)?;
        tracing::info!(
            path = %self.out.display(),
            files = manifest.files.len(),
            bytes = bytes.len(),
            "export archive written"
        );
        Ok(self.out.clone())
    }
}
