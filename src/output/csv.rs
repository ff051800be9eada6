use std::io::Write;

use crate::core::{ResultTable, Value};
use crate::error::AppError;
use crate::report::ReportOutput;

/// Raw cell text: numbers unformatted, undefined cells empty
fn csv_field(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::Number(n) if n.is_finite() => n.to_string(),
        _ => String::new(),
    }
}

/// Header plus every row, total included
pub(crate) fn write_table_csv<W: Write>(table: &ResultTable, out: W) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(table.column_names())?;
    for row in &table.rows {
        writer.write_record(row.iter().map(csv_field))?;
    }
    writer.flush()?;
    Ok(())
}

/// Every table of the report, each preceded by a `# <title>` line
pub(crate) fn report_csv(report: &ReportOutput) -> Result<String, AppError> {
    let mut out: Vec<u8> = Vec::new();
    if !report.kpis.is_empty() {
        writeln!(out, "# {}", report.title)?;
        let mut writer = csv::Writer::from_writer(&mut out);
        writer.write_record(["kpi", "value"])?;
        for kpi in &report.kpis {
            writer.write_record([kpi.label.clone(), csv_field(&kpi.value)])?;
        }
        writer.flush()?;
    }
    for section in &report.sections {
        let Some(table) = &section.table else {
            continue;
        };
        if !out.is_empty() {
            out.push(b'\n');
        }
        writeln!(out, "# {}", section.title)?;
        write_table_csv(table, &mut out)?;
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}

pub(crate) fn output_report_csv(reports: &[ReportOutput]) -> Result<(), AppError> {
    let mut blocks = Vec::with_capacity(reports.len());
    for report in reports {
        blocks.push(report_csv(report)?);
    }
    print!("{}", blocks.join("\n"));
    Ok(())
}
