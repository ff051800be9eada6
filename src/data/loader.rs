use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::core::Table;
use crate::data::schema::{NormalizeReport, RawTable, normalize};
use crate::error::AppError;

/// Expand a file path, a directory or a glob pattern into CSV files
pub(crate) fn resolve_files(pattern: &str) -> Result<Vec<PathBuf>, AppError> {
    let path = Path::new(pattern);
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let expanded = if path.is_dir() {
        format!("{}/*.csv", path.display())
    } else {
        pattern.to_string()
    };

    let entries = glob::glob(&expanded).map_err(|e| AppError::InvalidDataPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    let mut files: Vec<PathBuf> = entries.flatten().filter(|p| p.is_file()).collect();
    files.sort();

    if files.is_empty() {
        return Err(AppError::NoDataFiles {
            pattern: pattern.to_string(),
        });
    }
    Ok(files)
}

/// Semicolon-separated exports are common for comma-decimal locales
fn sniff_delimiter(path: &Path) -> Result<u8, AppError> {
    let mut first = String::new();
    BufReader::new(File::open(path)?).read_line(&mut first)?;
    let semicolons = first.matches(';').count();
    let commas = first.matches(',').count();
    Ok(if semicolons > commas { b';' } else { b',' })
}

pub(crate) fn read_raw(path: &Path) -> Result<RawTable, AppError> {
    let delimiter = sniff_delimiter(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        records.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawTable { headers, records })
}

/// Load and normalize every file matched by `pattern`
pub(crate) fn load_table(pattern: &str, fallback_year: i32) -> Result<(Table, NormalizeReport), AppError> {
    let start = Instant::now();
    let files = resolve_files(pattern)?;

    let mut rows = Vec::new();
    let mut present = BTreeSet::new();
    let mut report = NormalizeReport::default();
    for file in &files {
        let raw = read_raw(file)?;
        let (table, file_report) = normalize(&raw, fallback_year)?;
        tracing::debug!(
            file = %file.display(),
            rows = file_report.rows_kept,
            "loaded data file"
        );
        rows.extend(table.rows);
        present.extend(table.present);
        report.merge(&file_report);
    }
    // a field is missing only if no file had it
    report.missing_optional.retain(|f| !present.contains(f));

    if rows.is_empty() {
        return Err(AppError::NoData {
            source_name: pattern.to_string(),
        });
    }

    if report.is_lossy() {
        tracing::warn!(
            dropped_empty_client = report.dropped_empty_client,
            defaulted_year = report.defaulted_year,
            defaulted_month = report.defaulted_month,
            unparsed_revenue = report.unparsed_revenue,
            unparsed_insertions = report.unparsed_insertions,
            "input rows were coerced while normalizing"
        );
    }
    tracing::debug!(
        files = files.len(),
        rows = rows.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "data loaded"
    );

    Ok((Table::new(rows, present), report))
}
