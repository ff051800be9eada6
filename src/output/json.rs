use serde_json::{Map, Value as Json, json};

use crate::core::ResultTable;
use crate::error::AppError;
use crate::report::{ReportOutput, Section};

/// Rows as objects keyed by column name; undefined cells become null
pub(crate) fn table_json(table: &ResultTable) -> Json {
    let rows: Vec<Json> = table
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, Json> = table
                .columns
                .iter()
                .zip(row)
                .map(|(column, value)| (column.name.clone(), json!(value)))
                .collect();
            Json::Object(object)
        })
        .collect();
    json!({
        "name": table.name,
        "columns": table.columns.iter().map(|c| json!({ "name": c.name, "kind": c.kind })).collect::<Vec<_>>(),
        "rows": rows,
        "has_total": table.has_total,
    })
}

fn section_json(section: &Section) -> Json {
    json!({
        "title": section.title,
        "table": section.table.as_ref().map(table_json),
        "chart": section.chart,
        "note": section.note,
    })
}

pub(crate) fn report_json(report: &ReportOutput) -> Json {
    json!({
        "report": report.kind,
        "title": report.title,
        "kpis": report
            .kpis
            .iter()
            .map(|k| json!({ "label": k.label, "value": k.value, "kind": k.kind }))
            .collect::<Vec<_>>(),
        "sections": report.sections.iter().map(section_json).collect::<Vec<_>>(),
    })
}

/// Print one report as an object, several as an array
pub(crate) fn output_report_json(reports: &[ReportOutput]) -> Result<(), AppError> {
    let value = match reports {
        [single] => report_json(single),
        many => Json::Array(many.iter().map(report_json).collect()),
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, ColumnKind, Value, append_total};
    use crate::report::{Kpi, ReportKind};

    fn sample() -> ResultTable {
        let mut t = ResultTable::new(
            "by_broadcaster",
            vec![
                Column::label("broadcaster"),
                Column::money("revenue"),
                Column::change("delta_pct", "revenue", "revenue"),
            ],
        );
        t.push(vec![Value::from("TV"), Value::Number(10.0), Value::Undefined]);
        append_total(t)
    }

    #[test]
    fn table_rows_are_keyed_objects() {
        let json = table_json(&sample());
        assert_eq!(json["rows"][0]["broadcaster"], "TV");
        assert_eq!(json["rows"][0]["revenue"], 10.0);
        assert!(json["rows"][0]["delta_pct"].is_null());
        assert_eq!(json["rows"][1]["broadcaster"], "Totalizer");
        assert_eq!(json["columns"][1]["kind"], "money");
        assert_eq!(json["has_total"], true);
    }

    #[test]
    fn report_json_carries_kpis_and_sections() {
        let mut report = ReportOutput::new(ReportKind::Overview, "Overview");
        report.kpis.push(Kpi::new("Delta %", Value::Undefined, ColumnKind::Change));
        report.sections.push(Section::table("Revenue", sample(), "none"));
        report.sections.push(Section::note("Empty", "nothing"));
        let json = report_json(&report);
        assert_eq!(json["report"], "overview");
        assert!(json["kpis"][0]["value"].is_null());
        assert_eq!(json["sections"][0]["table"]["name"], "by_broadcaster");
        assert!(json["sections"][1]["table"].is_null());
        assert_eq!(json["sections"][1]["note"], "nothing");
    }
}
