use comfy_table::{Cell, Color, Table};
use std::fmt::Write;

use crate::core::{ColumnKind, ResultTable};
use crate::output::format::{
    NumberFormat, create_styled_table, format_value, header_cell, right_cell, styled_cell,
};
use crate::report::{Kpi, ReportOutput};

#[derive(Debug, Clone, Copy)]
pub(crate) struct TableOptions {
    pub(crate) use_color: bool,
    pub(crate) number_format: NumberFormat,
}

fn is_numeric(kind: ColumnKind) -> bool {
    !matches!(kind, ColumnKind::Label | ColumnKind::Text)
}

/// Render one result table; the total row is bold and highlighted
pub(crate) fn render_table(result: &ResultTable, opts: TableOptions) -> Table {
    let mut table = create_styled_table();
    table.set_header(
        result
            .columns
            .iter()
            .map(|c| header_cell(&c.name, opts.use_color))
            .collect::<Vec<Cell>>(),
    );

    let total_index = result.has_total.then(|| result.rows.len() - 1);
    let cyan = if opts.use_color { Some(Color::Cyan) } else { None };
    for (i, row) in result.rows.iter().enumerate() {
        let is_total = Some(i) == total_index;
        let (color, bold) = if is_total { (cyan, true) } else { (None, false) };
        let cells: Vec<Cell> = result
            .columns
            .iter()
            .zip(row)
            .map(|(column, value)| {
                let text = format_value(value, column.kind, opts.number_format);
                if is_numeric(column.kind) {
                    right_cell(&text, color, bold)
                } else {
                    styled_cell(&text, color, bold)
                }
            })
            .collect();
        table.add_row(cells);
    }
    table
}

fn render_kpis(kpis: &[Kpi], opts: TableOptions) -> String {
    let width = kpis.iter().map(|k| k.label.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for kpi in kpis {
        let value = format_value(&kpi.value, kpi.kind, opts.number_format);
        if opts.use_color {
            let _ = writeln!(out, "  {:<width$}  \x1b[36m{value}\x1b[0m", kpi.label);
        } else {
            let _ = writeln!(out, "  {:<width$}  {value}", kpi.label);
        }
    }
    out
}

/// Full text rendering of a report: title, KPIs, then every section
pub(crate) fn render_report(report: &ReportOutput, opts: TableOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n  {}\n", report.title);
    if !report.kpis.is_empty() {
        out.push_str(&render_kpis(&report.kpis, opts));
    }
    for section in &report.sections {
        let _ = writeln!(out, "\n  {}\n", section.title);
        if let Some(table) = &section.table {
            let _ = writeln!(out, "{}", render_table(table, opts));
        }
        if let Some(note) = &section.note {
            let _ = writeln!(out, "  {note}");
        }
    }
    out
}

pub(crate) fn print_report_table(report: &ReportOutput, opts: TableOptions) {
    print!("{}", render_report(report, opts));
}
