//! Crossings & intersections: exclusive vs shared clients across broadcasters

use std::cmp::Ordering;

use crate::core::{
    Aggregation, Column, ColumnKind, Dimension, Exclusivity, Field, Measure, OverlapMatrix, OverlapMetric,
    PresenceMatrix, ResultTable, Share, Table, TotalRule, Value, append_total, compare_values, ratio,
};
use crate::error::AppError;
use crate::report::{ChartSpec, Kpi, ReportKind, ReportOutput, ReportParams, Section, Window};

const FEW_BROADCASTERS: &str = "At least 2 broadcasters are required for the intersection matrix.";

pub(super) fn build(table: &Table, params: &ReportParams) -> Result<ReportOutput, AppError> {
    table.require(&[Field::Broadcaster])?;
    let window = match Window::open(table, params.months) {
        Ok(w) => w,
        Err(note) => return Ok(ReportOutput::empty(ReportKind::Overlap, note)),
    };
    let mut report = ReportOutput::new(ReportKind::Overlap, ReportKind::Overlap.title());

    let presence = PresenceMatrix::build(&window.table.rows);
    let exclusivity = presence.exclusivity();
    let shared = presence.shared_clients();
    report.kpis = vec![
        Kpi::new("Broadcasters", presence.broadcasters().len(), ColumnKind::Count),
        Kpi::new(
            "Exclusive clients",
            exclusivity.iter().map(|e| e.exclusive.clients).sum::<usize>(),
            ColumnKind::Count,
        ),
        Kpi::new("Shared clients", shared.len(), ColumnKind::Count),
    ];

    report.sections.push(Section::table(
        "Exclusive clients per broadcaster",
        split_table("exclusive_clients", &exclusivity, |e| e.exclusive),
        "No exclusive clients.",
    ));
    report.sections.push(Section::table(
        "Shared clients per broadcaster",
        split_table("shared_clients", &exclusivity, |e| e.shared),
        "No shared clients.",
    ));
    report.sections.push(Section::table(
        format!("Top {} shared clients", params.top_shared),
        top_shared(&window.table, &presence, &shared, params),
        "No client is shared between broadcasters.",
    ));

    let title = format!("Intersection matrix: {}", params.overlap_metric.label());
    if presence.broadcasters().len() < 2 {
        report.sections.push(Section::note(title, FEW_BROADCASTERS));
    } else {
        let matrix = presence.intersection(params.overlap_metric);
        let chart = ChartSpec::heatmap(&title, &matrix);
        report.sections.push(
            Section::table(title, matrix_table(&matrix, params.overlap_metric), FEW_BROADCASTERS)
                .with_chart(chart),
        );
        report.sections.push(Section::table(
            "Intersection as % of row broadcaster",
            matrix_percent_table(&matrix),
            FEW_BROADCASTERS,
        ));
    }
    Ok(report)
}

/// Exclusive or shared figures per broadcaster, ranked by that revenue
fn split_table<F>(name: &str, rows: &[Exclusivity], part: F) -> ResultTable
where
    F: Fn(&Exclusivity) -> Share,
{
    // broadcasters without clients in this category still count in the total share
    let all_revenue: f64 = rows.iter().map(|e| e.total_revenue).sum();
    let mut result = ResultTable::new(
        name,
        vec![
            Column::label("broadcaster"),
            Column::count("clients"),
            Column::money("revenue"),
            Column::count("insertions"),
            Column::money("broadcaster_revenue").with_total(TotalRule::Fixed(all_revenue.into())),
            Column::percent_of("pct_of_revenue", "revenue", "broadcaster_revenue"),
        ],
    );
    let mut ranked: Vec<(&Exclusivity, Share)> = rows.iter().map(|e| (e, part(e))).collect();
    ranked.sort_by(|a, b| compare_values(b.1.revenue, a.1.revenue));
    for (row, share) in ranked.into_iter().filter(|(_, s)| s.clients > 0) {
        result.push(vec![
            Value::from(row.broadcaster.as_str()),
            Value::from(share.clients),
            Value::from(share.revenue),
            Value::from(share.insertions),
            Value::from(row.total_revenue),
            Value::from(ratio(share.revenue, row.total_revenue).map(|r| r * 100.0)),
        ]);
    }
    append_total(result)
}

/// Position of `name` in the preferred order, compared case-insensitively
fn preferred_rank(order: &[String], name: &str) -> Option<usize> {
    order.iter().position(|o| o.eq_ignore_ascii_case(name))
}

/// Broadcasters in the preferred order first, then the rest alphabetically
fn order_broadcasters<'a>(mut names: Vec<&'a str>, order: &[String]) -> Vec<&'a str> {
    names.sort_by(|a, b| match (preferred_rank(order, a), preferred_rank(order, b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    });
    names
}

fn top_shared(table: &Table, presence: &PresenceMatrix, shared: &[&str], params: &ReportParams) -> ResultTable {
    let mut result = ResultTable::new(
        "top_shared_clients",
        vec![
            Column::label("client"),
            Column::money("revenue"),
            Column::count("insertions"),
            Column::new("broadcaster_count", ColumnKind::Count).with_total(TotalRule::Blank),
            Column::text("broadcasters"),
        ],
    );
    let groups = Aggregation::by(&[Dimension::Client])
        .ranked_by(Measure::Revenue)
        .run(table.rows.iter().filter(|t| shared.contains(&t.client.as_str())));
    for row in groups.iter().take(params.top_shared) {
        let broadcasters = order_broadcasters(presence.presence(row.name()), &params.broadcaster_order);
        result.push(vec![
            Value::from(row.name()),
            Value::from(row.total.revenue),
            Value::from(row.total.insertions),
            Value::from(broadcasters.len()),
            Value::from(broadcasters.join(", ")),
        ]);
    }
    append_total(result)
}

fn matrix_table(matrix: &OverlapMatrix, metric: OverlapMetric) -> ResultTable {
    let kind = match metric {
        OverlapMetric::Revenue => ColumnKind::Money,
        OverlapMetric::Clients | OverlapMetric::Insertions => ColumnKind::Count,
    };
    let mut columns = vec![Column::label("broadcaster")];
    columns.extend(matrix.labels.iter().map(|l| Column::new(l.as_str(), kind)));
    let mut result = ResultTable::new("intersection_matrix", columns);
    for (label, values) in matrix.labels.iter().zip(&matrix.values) {
        let mut row = vec![Value::from(label.as_str())];
        row.extend(values.iter().map(|v| Value::from(*v)));
        result.push(row);
    }
    result
}

/// Each cell as a percentage of the row broadcaster's own total (the diagonal)
fn matrix_percent_table(matrix: &OverlapMatrix) -> ResultTable {
    let mut columns = vec![Column::label("broadcaster")];
    columns.extend(matrix.labels.iter().map(|l| Column::new(l.as_str(), ColumnKind::Percent)));
    let mut result = ResultTable::new("intersection_percent", columns);
    for (i, (label, values)) in matrix.labels.iter().zip(&matrix.values).enumerate() {
        let own = values[i];
        let mut row = vec![Value::from(label.as_str())];
        row.extend(values.iter().map(|v| Value::from(ratio(*v, own).map(|r| r * 100.0))));
        result.push(row);
    }
    result
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::report::fixtures::{sample, table, tx};

    fn params() -> ReportParams {
        ReportParams::default()
    }

    #[test]
    fn requires_broadcaster_column() {
        let mut t = sample();
        t.present.remove(&Field::Broadcaster);
        let err = build(&t, &params()).unwrap_err();
        assert_eq!(err.to_string(), "Missing required column(s): broadcaster");
    }

    #[test]
    fn exclusive_and_shared_split() {
        let report = build(&sample(), &params()).unwrap();
        // Acme: TV1 + Radio, Beta: TV1 + Web, Gone: Radio, Fresh: Web
        let shared = report.section("Shared clients").unwrap().table.as_ref().unwrap();
        assert_eq!(shared.cell(0, "broadcaster"), Some(&Value::from("TV1")));
        assert_eq!(shared.cell(0, "pct_of_revenue"), Some(&Value::Number(100.0)));
        let exclusive = report.section("Exclusive clients").unwrap().table.as_ref().unwrap();
        assert_eq!(exclusive.column_values("broadcaster"), vec![Value::from("Web"), Value::from("Radio")]);
        let total = exclusive.total_row().unwrap();
        assert_eq!(total[2], Value::Number(600.0));
        // TV1 has no exclusive client but its revenue stays in the denominator
        assert_eq!(total[4], Value::Number(3700.0));
        assert_eq!(total[5], Value::Number(600.0 / 3700.0 * 100.0));
    }

    #[test]
    fn split_total_share_covers_every_broadcaster() {
        let t = table(vec![
            tx("X", "A", "E", 2024, 1, 100.0, 1.0),
            tx("Y", "B", "E", 2024, 1, 900.0, 1.0),
            tx("Y", "C", "E", 2024, 1, 900.0, 1.0),
        ]);
        let report = build(&t, &params()).unwrap();
        let exclusive = report.section("Exclusive clients").unwrap().table.as_ref().unwrap();
        assert_eq!(exclusive.data_rows().len(), 1);
        let total = exclusive.total_row().unwrap();
        assert_eq!(total[4], Value::Number(1900.0));
        assert_eq!(total[5], Value::Number(100.0 / 1900.0 * 100.0));

        let shared = report.section("Shared clients").unwrap().table.as_ref().unwrap();
        assert_eq!(shared.total_row().unwrap()[5], Value::Number(1800.0 / 1900.0 * 100.0));
    }

    #[test]
    fn top_shared_honours_preferred_order() {
        let mut p = params();
        p.broadcaster_order = vec!["tv1".to_string()];
        let report = build(&sample(), &p).unwrap();
        let top = report.section("Top 20 shared clients").unwrap().table.as_ref().unwrap();
        assert_eq!(top.cell(0, "client"), Some(&Value::from("Acme")));
        assert_eq!(top.cell(0, "broadcasters"), Some(&Value::from("TV1, Radio")));
        assert_eq!(top.cell(1, "broadcasters"), Some(&Value::from("TV1, Web")));
        assert_eq!(top.total_row().unwrap()[4], Value::from(""));
    }

    #[test]
    fn top_shared_is_truncated() {
        let mut p = params();
        p.top_shared = 1;
        let report = build(&sample(), &p).unwrap();
        let top = report.section("Top 1 shared clients").unwrap().table.as_ref().unwrap();
        assert_eq!(top.data_rows().len(), 1);
    }

    #[test]
    fn matrix_and_percentages() {
        let report = build(&sample(), &params()).unwrap();
        let matrix = report.section("Intersection matrix").unwrap();
        assert!(matrix.chart.is_some());
        let matrix = matrix.table.as_ref().unwrap();
        assert_eq!(matrix.column_names(), vec!["broadcaster", "Radio", "TV1", "Web"]);
        // TV1 row: itself 2 clients, 1 shared with Radio, 1 with Web
        assert_eq!(matrix.cell(1, "TV1"), Some(&Value::Number(2.0)));
        assert_eq!(matrix.cell(1, "Radio"), Some(&Value::Number(1.0)));
        let percent = report.section("Intersection as %").unwrap().table.as_ref().unwrap();
        assert_eq!(percent.cell(1, "Web"), Some(&Value::Number(50.0)));
        assert_eq!(percent.cell(1, "TV1"), Some(&Value::Number(100.0)));
    }

    #[test]
    fn single_broadcaster_matrix_is_a_note() {
        let t = table(vec![tx("X", "TV", "E", 2024, 1, 10.0, 1.0)]);
        let report = build(&t, &params()).unwrap();
        let section = report.section("Intersection matrix").unwrap();
        assert_eq!(section.note.as_deref(), Some(FEW_BROADCASTERS));
    }

    #[test]
    fn order_broadcasters_falls_back_to_alphabetical() {
        let order = vec!["Web".to_string(), "radio".to_string()];
        let names = order_broadcasters(vec!["TV1", "Radio", "AM", "Web"], &order);
        assert_eq!(names, vec!["Web", "Radio", "AM", "TV1"]);
    }
}
