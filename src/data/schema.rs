//! Schema normalizer: maps raw CSV columns onto `Transaction` rows

use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeSet, HashMap};

use crate::consts::FALLBACK_MONTH;
use crate::core::{Field, Table, Transaction};
use crate::error::AppError;

/// Untyped rows as read from a source file
#[derive(Debug, Clone, Default)]
pub(crate) struct RawTable {
    pub(crate) headers: Vec<String>,
    pub(crate) records: Vec<Vec<String>>,
}

/// Lossy coercions applied while normalizing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct NormalizeReport {
    pub(crate) rows_read: usize,
    pub(crate) rows_kept: usize,
    pub(crate) dropped_empty_client: usize,
    pub(crate) defaulted_year: usize,
    pub(crate) defaulted_month: usize,
    pub(crate) unparsed_revenue: usize,
    pub(crate) unparsed_insertions: usize,
    /// Optional fields the source did not have
    pub(crate) missing_optional: BTreeSet<Field>,
}

impl NormalizeReport {
    pub(crate) fn merge(&mut self, other: &NormalizeReport) {
        self.rows_read += other.rows_read;
        self.rows_kept += other.rows_kept;
        self.dropped_empty_client += other.dropped_empty_client;
        self.defaulted_year += other.defaulted_year;
        self.defaulted_month += other.defaulted_month;
        self.unparsed_revenue += other.unparsed_revenue;
        self.unparsed_insertions += other.unparsed_insertions;
        self.missing_optional.extend(other.missing_optional.iter().copied());
    }

    pub(crate) fn is_lossy(&self) -> bool {
        self.dropped_empty_client
            + self.defaulted_year
            + self.defaulted_month
            + self.unparsed_revenue
            + self.unparsed_insertions
            > 0
    }
}

/// Canonical field of a header, after trim and lower-case
fn canonical_field(header: &str) -> Option<Field> {
    let h = header.trim().trim_start_matches('\u{feff}').to_lowercase();
    let field = match h.as_str() {
        "client" | "cliente" => Field::Client,
        "broadcaster" | "emissora" => Field::Broadcaster,
        "executive" | "executivo" => Field::Executive,
        "year" | "ano" | "ano_ref" | "ano referência" | "ano referencia" => Field::Year,
        "month" | "mes" | "mês" | "mes_ref" | "mês referência" | "mes referencia" => Field::Month,
        "revenue" | "faturamento" => Field::Revenue,
        "insertions" | "insercoes" | "inserções" => Field::Insertions,
        _ => return None,
    };
    Some(field)
}

fn is_date_header(header: &str) -> bool {
    matches!(header.trim().to_lowercase().as_str(), "date" | "data")
}

/// Parse a number written in either `1.234,56` or `1,234.56` style
///
/// Currency prefixes and inner whitespace are ignored. A lone comma is read as
/// the decimal separator.
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '$' | '€' | '\u{a0}'))
        .collect();
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }

    let commas = cleaned.matches(',').count();
    let dots = cleaned.matches('.').count();
    let normalized = match (commas, dots) {
        (0, 0) | (0, 1) => cleaned,
        (0, _) => cleaned.replace('.', ""),
        (1, 0) => cleaned.replace(',', "."),
        (_, 0) => cleaned.replace(',', ""),
        _ => {
            let last_comma = cleaned.rfind(',').unwrap_or(0);
            let last_dot = cleaned.rfind('.').unwrap_or(0);
            if last_comma > last_dot {
                cleaned.replace('.', "").replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
    };
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Portuguese and English month abbreviations or full names
pub(crate) fn parse_month_name(raw: &str) -> Option<u32> {
    let lower = raw.trim().to_lowercase();
    let prefix: String = lower.chars().take(3).collect();
    let month = match prefix.as_str() {
        "jan" => 1,
        "fev" | "feb" => 2,
        "mar" => 3,
        "abr" | "apr" => 4,
        "mai" | "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "ago" | "aug" => 8,
        "set" | "sep" => 9,
        "out" | "oct" => 10,
        "nov" => 11,
        "dez" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

pub(crate) fn parse_month(raw: &str) -> Option<u32> {
    if let Some(n) = parse_number(raw) {
        let m = n as u32;
        return (n.fract() == 0.0 && (1..=12).contains(&m)).then_some(m);
    }
    parse_month_name(raw)
}

pub(crate) fn parse_year(raw: &str) -> Option<i32> {
    let n = raw.trim().parse::<f64>().ok()?;
    (n.fract() == 0.0 && n > 0.0 && n < 10000.0).then_some(n as i32)
}

pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    let head = s.get(..10).unwrap_or(s);
    ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(head, fmt).ok())
}

/// Map a raw table onto the canonical schema
///
/// Fails when `client` or `revenue` is missing. Every other field gets its
/// default: empty broadcaster/executive, zero insertions, `fallback_year`,
/// month 1.
pub(crate) fn normalize(raw: &RawTable, fallback_year: i32) -> Result<(Table, NormalizeReport), AppError> {
    let mut columns: HashMap<Field, usize> = HashMap::new();
    let mut date_column: Option<usize> = None;
    for (i, header) in raw.headers.iter().enumerate() {
        if let Some(field) = canonical_field(header) {
            columns.entry(field).or_insert(i);
        } else if is_date_header(header) && date_column.is_none() {
            date_column = Some(i);
        }
    }

    let missing: Vec<&str> = [Field::Client, Field::Revenue]
        .iter()
        .filter(|f| !columns.contains_key(f))
        .map(|f| f.name())
        .collect();
    if !missing.is_empty() {
        return Err(AppError::missing_columns(missing));
    }

    let mut present: BTreeSet<Field> = columns.keys().copied().collect();
    if date_column.is_some() {
        present.insert(Field::Year);
        present.insert(Field::Month);
    }
    let mut report = NormalizeReport {
        missing_optional: Field::ALL
            .iter()
            .filter(|f| !present.contains(f))
            .copied()
            .collect(),
        ..NormalizeReport::default()
    };

    let cell = |record: &[String], field: Field| -> Option<String> {
        columns
            .get(&field)
            .and_then(|i| record.get(*i))
            .map(|s| s.trim().to_string())
    };

    let mut rows = Vec::with_capacity(raw.records.len());
    for record in &raw.records {
        report.rows_read += 1;

        let client = cell(record, Field::Client).unwrap_or_default();
        if client.is_empty() {
            report.dropped_empty_client += 1;
            continue;
        }

        let date = date_column
            .and_then(|i| record.get(i))
            .and_then(|s| parse_date(s));

        let year = match cell(record, Field::Year) {
            Some(s) => parse_year(&s),
            None => date.map(|d| d.year()),
        };
        let year = year.unwrap_or_else(|| {
            report.defaulted_year += 1;
            fallback_year
        });

        let month = match cell(record, Field::Month) {
            Some(s) => parse_month(&s),
            None => date.map(|d| d.month()),
        };
        let month = month.unwrap_or_else(|| {
            report.defaulted_month += 1;
            FALLBACK_MONTH
        });

        let revenue = cell(record, Field::Revenue)
            .and_then(|s| parse_number(&s))
            .unwrap_or_else(|| {
                report.unparsed_revenue += 1;
                0.0
            });

        let insertions = match cell(record, Field::Insertions) {
            Some(s) if !s.is_empty() => parse_number(&s).unwrap_or_else(|| {
                report.unparsed_insertions += 1;
                0.0
            }),
            _ => 0.0,
        };

        rows.push(Transaction {
            client,
            broadcaster: cell(record, Field::Broadcaster).unwrap_or_default(),
            executive: cell(record, Field::Executive).unwrap_or_default(),
            year,
            month,
            revenue,
            insertions,
        });
    }
    report.rows_kept = rows.len();

    Ok((Table::new(rows, present), report))
}
