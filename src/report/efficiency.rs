//! Efficiency: yield (revenue per insertion) by client and broadcaster

use crate::core::{
    Aggregation, Column, ColumnKind, Dimension, Field, Measure, Period, ResultTable, Table, Totals, Value,
    append_total, compare_optional_desc, median, ratio,
};
use crate::error::AppError;
use crate::report::chart::Point;
use crate::report::{ChartSpec, EfficiencyScope, Kpi, ReportKind, ReportOutput, ReportParams, Section, Window};

const NO_REVENUE: &str = "No rows with positive revenue in the selection.";

pub(super) fn build(table: &Table, params: &ReportParams) -> Result<ReportOutput, AppError> {
    let window = match Window::open(table, params.months) {
        Ok(w) => w,
        Err(note) => return Ok(ReportOutput::empty(ReportKind::Efficiency, note)),
    };
    let billed = window.table.retain(|t| t.revenue > 0.0);
    let Some(latest) = billed.years().last().copied() else {
        return Ok(ReportOutput::empty(ReportKind::Efficiency, NO_REVENUE));
    };

    let mut report = ReportOutput::new(ReportKind::Efficiency, ReportKind::Efficiency.title());
    let totals = Totals::from_rows(&billed.rows);
    report.kpis = vec![
        Kpi::new("Global yield", totals.unit_cost(), ColumnKind::Money),
        Kpi::new(
            "Insertions per client",
            ratio(totals.insertions, totals.client_count() as f64),
            ColumnKind::Average,
        ),
        Kpi::new("Total insertions", totals.insertions, ColumnKind::Count),
    ];

    let (scope_label, scoped) = match params.efficiency {
        EfficiencyScope::Consolidated => ("consolidated".to_string(), billed.clone()),
        EfficiencyScope::Year(year) => (year.to_string(), billed.retain(|t| t.year == year)),
        EfficiencyScope::Latest => (latest.to_string(), billed.retain(|t| t.year == latest)),
    };
    let title = format!("Efficiency matrix ({scope_label})");
    let matrix = efficiency_matrix(&scoped);
    if matrix.is_empty() {
        report
            .sections
            .push(Section::note(title, &format!("No insertions for {scope_label}.")));
    } else {
        let chart = scatter(&matrix, &title);
        report.sections.push(Section::table(title, matrix, NO_REVENUE).with_chart(chart));
    }

    if window.table.has(Field::Broadcaster) {
        let summary = yearly_summary(&window.table, &window.period);
        report.sections.push(Section::table(
            format!("Yield per broadcaster ({})", window.years_label()),
            summary,
            super::NO_DATA,
        ));
    }
    Ok(report)
}

/// (client, broadcaster) pairs with insertions, listed by client
fn efficiency_matrix(table: &Table) -> ResultTable {
    let mut result = ResultTable::new(
        "efficiency_matrix",
        vec![
            Column::label("client"),
            Column::text("broadcaster"),
            Column::count("insertions"),
            Column::money("revenue"),
            Column::ratio("unit_cost", ColumnKind::Money, "revenue", "insertions"),
        ],
    );
    let pairs = Aggregation::by(&[Dimension::Client, Dimension::Broadcaster])
        .listed()
        .run(&table.rows);
    for row in pairs.iter().filter(|r| r.total.insertions > 0.0) {
        result.push(vec![
            Value::from(row.name()),
            Value::from(row.key.get(1).map_or("", String::as_str)),
            Value::from(row.total.insertions),
            Value::from(row.total.revenue),
            Value::from(row.total.unit_cost()),
        ]);
    }
    append_total(result)
}

/// Insertions against unit cost, one point per matrix row, with median guides
fn scatter(matrix: &ResultTable, title: &str) -> ChartSpec {
    let text = |v: &Value| v.as_text().unwrap_or_default().to_string();
    let col = |name: &str| matrix.column_index(name).unwrap_or_default();
    let (client, broadcaster, insertions, revenue, unit_cost) = (
        col("client"),
        col("broadcaster"),
        col("insertions"),
        col("revenue"),
        col("unit_cost"),
    );

    let points: Vec<Point> = matrix
        .data_rows()
        .iter()
        .filter_map(|row| {
            Some(Point {
                label: text(&row[client]),
                group: text(&row[broadcaster]),
                x: row[insertions].as_f64()?,
                y: row[unit_cost].as_f64()?,
                size: row[revenue].as_f64().unwrap_or_default(),
            })
        })
        .collect();
    let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
    ChartSpec::scatter(title, points)
        .with_reference("x", median(&xs), "Median insertions")
        .with_reference("y", median(&ys), "Median unit cost")
}

/// Insertions, revenue and yield per broadcaster for both compared years
fn yearly_summary(table: &Table, period: &Period) -> ResultTable {
    let mut result = ResultTable::new(
        "yield_per_broadcaster",
        vec![
            Column::label("broadcaster"),
            Column::count("insertions_base"),
            Column::count("insertions_comparison"),
            Column::money("revenue_base"),
            Column::money("revenue_comparison"),
            Column::ratio("yield_base", ColumnKind::Money, "revenue_base", "insertions_base"),
            Column::ratio(
                "yield_comparison",
                ColumnKind::Money,
                "revenue_comparison",
                "insertions_comparison",
            ),
        ],
    );
    let (base, comparison) = (period.base_year, period.comparison_year);
    let mut groups = Aggregation::by(&[Dimension::Broadcaster])
        .split_by_years(&period.years())
        .listed()
        .run(&table.rows);
    groups.sort_by(|a, b| {
        compare_optional_desc(
            a.year_totals(comparison).unit_cost(),
            b.year_totals(comparison).unit_cost(),
        )
    });
    for row in groups {
        result.push(vec![
            Value::from(row.name()),
            Value::from(row.year_value(base, Measure::Insertions)),
            Value::from(row.year_value(comparison, Measure::Insertions)),
            Value::from(row.year_value(base, Measure::Revenue)),
            Value::from(row.year_value(comparison, Measure::Revenue)),
            Value::from(row.year_totals(base).unit_cost()),
            Value::from(row.year_totals(comparison).unit_cost()),
        ]);
    }
    append_total(result)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::report::fixtures::{sample, table, tx};

    fn with_scope(scope: EfficiencyScope) -> ReportParams {
        ReportParams {
            efficiency: scope,
            ..ReportParams::default()
        }
    }

    #[test]
    fn kpis_over_billed_rows() {
        let t = table(vec![
            tx("X", "TV", "E", 2024, 1, 100.0, 4.0),
            tx("Y", "TV", "E", 2024, 1, 0.0, 6.0),
            tx("Z", "Web", "E", 2024, 2, 300.0, 4.0),
        ]);
        let report = build(&t, &ReportParams::default()).unwrap();
        assert_eq!(report.kpis[0].value, Value::Number(50.0));
        assert_eq!(report.kpis[1].value, Value::Number(4.0));
        assert_eq!(report.kpis[2].value, Value::Number(8.0));
    }

    #[test]
    fn matrix_defaults_to_latest_year() {
        let report = build(&sample(), &ReportParams::default()).unwrap();
        let section = report.section("Efficiency matrix").unwrap();
        assert_eq!(section.title, "Efficiency matrix (2025)");
        let matrix = section.table.as_ref().unwrap();
        assert_eq!(
            matrix.column_values("client"),
            vec![Value::from("Acme"), Value::from("Beta"), Value::from("Fresh")]
        );
        assert_eq!(matrix.cell(2, "unit_cost"), Some(&Value::Number(50.0)));
        let chart = section.chart.as_ref().unwrap();
        assert_eq!(chart.points.len(), 3);
        assert_eq!(chart.reference_lines.len(), 2);
        assert_eq!(chart.reference_lines[0].value, 8.0);
    }

    #[test]
    fn consolidated_scope_skips_pairs_without_insertions() {
        let report = build(&sample(), &with_scope(EfficiencyScope::Consolidated)).unwrap();
        let matrix = report.section("Efficiency matrix").unwrap().table.as_ref().unwrap();
        // Gone / Radio billed without insertions
        assert!(!matrix.column_values("client").contains(&Value::from("Gone")));
        assert_eq!(matrix.total_row().unwrap()[2], Value::Number(39.0));
    }

    #[test]
    fn empty_year_scope_is_a_note() {
        let report = build(&sample(), &with_scope(EfficiencyScope::Year(2019))).unwrap();
        let section = report.section("Efficiency matrix").unwrap();
        assert!(section.table.is_none());
        assert_eq!(section.note.as_deref(), Some("No insertions for 2019."));
    }

    #[test]
    fn yearly_summary_ranked_by_comparison_yield() {
        let report = build(&sample(), &ReportParams::default()).unwrap();
        let summary = report.section("Yield per broadcaster").unwrap().table.as_ref().unwrap();
        // TV1 100 per insertion in 2025, Web 500 / 9, Radio nothing in 2025
        assert_eq!(
            summary.column_values("broadcaster"),
            vec![Value::from("TV1"), Value::from("Web"), Value::from("Radio")]
        );
        assert_eq!(summary.cell(2, "yield_comparison"), Some(&Value::Undefined));
        let total = summary.total_row().unwrap();
        assert_eq!(total[6], Value::Number(1700.0 / 21.0));
    }

    #[test]
    fn no_billed_rows_is_an_empty_state() {
        let t = table(vec![tx("X", "TV", "E", 2024, 1, 0.0, 3.0)]);
        let report = build(&t, &ReportParams::default()).unwrap();
        assert!(report.kpis.is_empty());
        assert_eq!(report.sections[0].note.as_deref(), Some(NO_REVENUE));
    }
}
