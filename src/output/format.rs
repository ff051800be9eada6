use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ContentArrangement, Table, TableComponent,
    modifiers::UTF8_SOLID_INNER_BORDERS, presets::UTF8_FULL,
};

use crate::core::{ColumnKind, Value};
use crate::error::AppError;

/// Placeholder for undefined values and zero counts
pub(crate) const EMPTY_CELL: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NumberFormat {
    group_sep: char,
    decimal_sep: char,
    currency: &'static str,
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat {
            group_sep: ',',
            decimal_sep: '.',
            currency: "$",
        }
    }
}

impl NumberFormat {
    pub(crate) fn from_locale(locale: Option<&str>) -> Result<Self, AppError> {
        let Some(raw) = locale else {
            return Ok(NumberFormat::default());
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(NumberFormat::default());
        }
        let base = trimmed
            .split(['-', '_'])
            .next()
            .unwrap_or(trimmed)
            .to_ascii_lowercase();

        let format = match base.as_str() {
            "pt" => NumberFormat {
                group_sep: '.',
                decimal_sep: ',',
                currency: "R$",
            },
            "de" => NumberFormat {
                group_sep: '.',
                decimal_sep: ',',
                currency: "€",
            },
            "fr" => NumberFormat {
                group_sep: ' ',
                decimal_sep: ',',
                currency: "€",
            },
            "en" => NumberFormat::default(),
            _ => {
                return Err(AppError::UnsupportedLocale {
                    input: trimmed.to_string(),
                });
            }
        };

        Ok(format)
    }
}

fn group_digits(digits: &str, sep: char) -> String {
    let mut result = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(sep);
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

pub(crate) fn format_number(n: i64, format: NumberFormat) -> String {
    let sign = if n < 0 { "-" } else { "" };
    format!("{sign}{}", group_digits(&n.unsigned_abs().to_string(), format.group_sep))
}

/// Fixed-point with group separators, e.g. `1,234.50`
pub(crate) fn format_decimal(n: f64, decimals: usize, format: NumberFormat) -> String {
    let fixed = format!("{:.*}", decimals, n.abs());
    let (int, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    // -0.00 renders without a sign
    let sign = if n < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    let grouped = group_digits(int, format.group_sep);
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}{}{frac}", format.decimal_sep)
    }
}

pub(crate) fn format_money(n: f64, format: NumberFormat) -> String {
    let amount = format_decimal(n.abs(), 2, format);
    if n < 0.0 && amount.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{} {amount}", format.currency)
    } else {
        format!("{} {amount}", format.currency)
    }
}

/// Signed change with two decimals, e.g. `+12.50%`
pub(crate) fn format_change(pct: f64, format: NumberFormat) -> String {
    let body = format_decimal(pct, 2, format);
    if pct > 0.0 && !body.starts_with('-') {
        format!("+{body}%")
    } else {
        format!("{body}%")
    }
}

/// Display text of one cell according to its column kind
pub(crate) fn format_value(value: &Value, kind: ColumnKind, format: NumberFormat) -> String {
    let n = match value {
        Value::Text(s) => return s.clone(),
        Value::Undefined => return EMPTY_CELL.to_string(),
        Value::Number(n) if !n.is_finite() => return EMPTY_CELL.to_string(),
        Value::Number(n) => *n,
    };
    match kind {
        ColumnKind::Label | ColumnKind::Text if n.fract() == 0.0 => format!("{n:.0}"),
        ColumnKind::Label | ColumnKind::Text | ColumnKind::Average => format_decimal(n, 2, format),
        ColumnKind::Money => format_money(n, format),
        ColumnKind::Count if n == 0.0 => EMPTY_CELL.to_string(),
        ColumnKind::Count if n.fract() == 0.0 => format_decimal(n, 0, format),
        ColumnKind::Count => format_decimal(n, 2, format),
        ColumnKind::Change => format_change(n, format),
        ColumnKind::Percent => format!("{}%", format_decimal(n, 2, format)),
        ColumnKind::Share => format!("{}%", format_decimal(n * 100.0, 2, format)),
    }
}

pub(super) fn styled_cell(text: &str, color: Option<Color>, bold: bool) -> Cell {
    let mut cell = Cell::new(text);
    if let Some(c) = color {
        cell = cell.fg(c);
    }
    if bold {
        cell = cell.add_attribute(Attribute::Bold);
    }
    cell
}

pub(super) fn header_cell(text: &str, use_color: bool) -> Cell {
    let mut cell = Cell::new(text).add_attribute(Attribute::Bold);
    if use_color {
        cell = cell.fg(Color::Cyan);
    }
    cell
}

/// Replace the double-line header separator (╞═╪═╡) with single-line (├─┼─┤)
fn normalize_header_separator(table: &mut Table) {
    table.set_style(TableComponent::HeaderLines, '─');
    table.set_style(TableComponent::LeftHeaderIntersection, '├');
    table.set_style(TableComponent::MiddleHeaderIntersections, '┼');
    table.set_style(TableComponent::RightHeaderIntersection, '┤');
}

/// Create a table with the standard preset, inner borders, and normalized header separator.
pub(super) fn create_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    normalize_header_separator(&mut table);
    table
}

pub(super) fn right_cell(text: &str, color: Option<Color>, bold: bool) -> Cell {
    let mut cell = Cell::new(text).set_alignment(CellAlignment::Right);
    if let Some(c) = color {
        cell = cell.fg(c);
    }
    if bold {
        cell = cell.add_attribute(Attribute::Bold);
    }
    cell
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_with_commas() {
        let fmt = NumberFormat::default();
        assert_eq!(format_number(0, fmt), "0");
        assert_eq!(format_number(999, fmt), "999");
        assert_eq!(format_number(1000, fmt), "1,000");
        assert_eq!(format_number(1_234_567, fmt), "1,234,567");
        assert_eq!(format_number(-1234, fmt), "-1,234");
    }

    #[test]
    fn from_locale_none_or_empty_returns_default() {
        assert_eq!(NumberFormat::from_locale(None).unwrap(), NumberFormat::default());
        assert_eq!(NumberFormat::from_locale(Some("")).unwrap(), NumberFormat::default());
    }

    #[test]
    fn from_locale_pt_uses_real_and_comma_decimals() {
        let fmt = NumberFormat::from_locale(Some("pt-BR")).unwrap();
        assert_eq!(format_money(1234.5, fmt), "R$ 1.234,50");
        assert_eq!(format_money(-1000.0, fmt), "-R$ 1.000,00");
    }

    #[test]
    fn from_locale_de_and_fr() {
        let de = NumberFormat::from_locale(Some("de_DE")).unwrap();
        assert_eq!(format_number(1000, de), "1.000");
        let fr = NumberFormat::from_locale(Some("fr")).unwrap();
        assert_eq!(format_decimal(1234.5, 2, fr), "1 234,50");
    }

    #[test]
    fn from_locale_unsupported_returns_error() {
        assert!(matches!(
            NumberFormat::from_locale(Some("ja")),
            Err(AppError::UnsupportedLocale { .. })
        ));
    }

    #[test]
    fn format_decimal_rounds_and_drops_negative_zero() {
        let fmt = NumberFormat::default();
        assert_eq!(format_decimal(1234.567, 2, fmt), "1,234.57");
        assert_eq!(format_decimal(-0.001, 2, fmt), "0.00");
        assert_eq!(format_decimal(-12.5, 1, fmt), "-12.5");
    }

    #[test]
    fn change_is_signed_with_two_decimals() {
        let fmt = NumberFormat::default();
        assert_eq!(format_change(12.5, fmt), "+12.50%");
        assert_eq!(format_change(-100.0, fmt), "-100.00%");
        assert_eq!(format_change(0.0, fmt), "0.00%");
    }

    #[test]
    fn format_value_by_kind() {
        let fmt = NumberFormat::default();
        assert_eq!(format_value(&Value::Undefined, ColumnKind::Money, fmt), "-");
        assert_eq!(format_value(&Value::Number(0.0), ColumnKind::Count, fmt), "-");
        assert_eq!(format_value(&Value::Number(1500.0), ColumnKind::Count, fmt), "1,500");
        assert_eq!(format_value(&Value::Number(0.0), ColumnKind::Money, fmt), "$ 0.00");
        assert_eq!(format_value(&Value::Number(0.256), ColumnKind::Share, fmt), "25.60%");
        assert_eq!(format_value(&Value::Number(42.0), ColumnKind::Percent, fmt), "42.00%");
        assert_eq!(format_value(&Value::Number(2.5), ColumnKind::Average, fmt), "2.50");
        assert_eq!(format_value(&Value::Number(2024.0), ColumnKind::Text, fmt), "2024");
        assert_eq!(format_value(&Value::from("Acme"), ColumnKind::Label, fmt), "Acme");
    }
}
