//! ABC (Pareto) report over clients

use crate::core::{
    AbcClass, AbcRow, Aggregation, ClassSummary, Column, ColumnKind, Dimension, Metric, ResultTable, Table, Value,
    append_total, classify, ratio, summarize,
};
use crate::error::AppError;
use crate::report::{ChartSpec, Kpi, ReportKind, ReportOutput, ReportParams, Section, Window};

pub(super) fn build(table: &Table, params: &ReportParams) -> Result<ReportOutput, AppError> {
    let window = match Window::open(table, params.months) {
        Ok(w) => w,
        Err(note) => return Ok(ReportOutput::empty(ReportKind::Abc, note)),
    };
    let metric = params.abc_metric;
    let mut report = ReportOutput::new(
        ReportKind::Abc,
        format!("{} by {}", ReportKind::Abc.title(), metric.name()),
    );

    let clients = Aggregation::by(&[Dimension::Client]).run(&window.table.rows);
    let rows = classify(&clients, metric);
    let summary = summarize(&rows);

    let class_a = summary.iter().find(|s| s.class == AbcClass::A);
    let metric_total: f64 = rows.iter().map(|r| r.value).sum();
    let class_a_value = class_a.map_or(0.0, |s| match metric {
        Metric::Revenue => s.revenue,
        Metric::Insertions => s.insertions,
    });
    report.kpis = vec![
        Kpi::new("Clients", rows.len(), ColumnKind::Count),
        Kpi::new("Class A clients", class_a.map_or(0, |s| s.entities), ColumnKind::Count),
        Kpi::new("Class A share", ratio(class_a_value, metric_total), ColumnKind::Share),
    ];

    let classes = class_table(&summary);
    let chart = ChartSpec::pie("Clients by class", &classes, "class", "clients");
    report
        .sections
        .push(Section::table("Class summary", classes, super::NO_DATA).with_chart(chart));
    report.sections.push(Section::table(
        "ABC classification",
        client_table(&rows, metric),
        super::NO_DATA,
    ));
    Ok(report)
}

fn class_table(summary: &[ClassSummary]) -> ResultTable {
    let mut result = ResultTable::new(
        "abc_summary",
        vec![
            Column::label("class"),
            Column::text("description"),
            Column::count("clients"),
            Column::money("revenue"),
            Column::count("insertions"),
        ],
    );
    for s in summary {
        result.push(vec![
            Value::from(s.class.to_string()),
            Value::from(s.class.description()),
            Value::from(s.entities),
            Value::from(s.revenue),
            Value::from(s.insertions),
        ]);
    }
    append_total(result)
}

fn client_table(rows: &[AbcRow], metric: Metric) -> ResultTable {
    let measured = match metric {
        Metric::Revenue => "revenue",
        Metric::Insertions => "insertions",
    };
    let mut result = ResultTable::new(
        "abc_clients",
        vec![
            Column::text("class"),
            Column::label("client"),
            Column::money("revenue"),
            Column::count("insertions"),
            Column::ratio("unit_cost", ColumnKind::Money, "revenue", "insertions"),
            Column::ratio("share", ColumnKind::Share, measured, measured),
            Column::new("cumulative_share", ColumnKind::Share),
        ],
    );
    for row in rows {
        result.push(vec![
            Value::from(row.class.to_string()),
            Value::from(row.entity.as_str()),
            Value::from(row.revenue),
            Value::from(row.insertions),
            Value::from(row.unit_cost),
            Value::from(row.share),
            Value::from(row.cumulative_share),
        ]);
    }
    append_total(result)
}
