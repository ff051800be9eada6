//! Losses & gains: lost and new clients and per-group revenue variation

use crate::core::{
    Aggregation, ChurnSide, Column, ColumnKind, Dimension, Field, Measure, Period, ResultTable, Table, Value,
    append_total, churn, compare_rows, compare_values, compute_deltas,
};
use crate::error::AppError;
use crate::report::{ChartSpec, Kpi, ReportKind, ReportOutput, ReportParams, Section, Window};

pub(super) fn build(table: &Table, params: &ReportParams) -> Result<ReportOutput, AppError> {
    let window = match Window::open(table, params.months) {
        Ok(w) => w,
        Err(note) => return Ok(ReportOutput::empty(ReportKind::Churn, note)),
    };
    let period = &window.period;
    let mut report = ReportOutput::new(
        ReportKind::Churn,
        format!("{} ({})", ReportKind::Churn.title(), window.years_label()),
    );

    let summary = churn(&window.table.rows, period);
    report.kpis = vec![
        Kpi::new("Lost clients", summary.lost.client_count(), ColumnKind::Count),
        Kpi::new("New clients", summary.new.client_count(), ColumnKind::Count),
        Kpi::new("Net revenue", summary.net_revenue(), ColumnKind::Money),
        Kpi::new("Net clients", summary.net_clients(), ColumnKind::Count),
        Kpi::new("Net insertions", summary.net_insertions(), ColumnKind::Count),
        Kpi::new("Net unit cost", summary.net_unit_cost(), ColumnKind::Money),
    ];

    report.sections.push(Section::table(
        format!("Lost clients (in {}, not in {})", period.base_year, period.comparison_year),
        side_table("lost_clients", &summary.lost),
        "No lost clients.",
    ));
    report.sections.push(Section::table(
        format!("New clients (in {}, not in {})", period.comparison_year, period.base_year),
        side_table("new_clients", &summary.new),
        "No new clients.",
    ));

    // groups present only outside the two compared years are left out
    let compared = window
        .table
        .retain(|t| t.year == period.base_year || t.year == period.comparison_year);
    report.sections.push(Section::table(
        "Variation by client",
        variation(&compared, period, Dimension::Client),
        super::NO_DATA,
    ));
    if compared.has(Field::Broadcaster) {
        let by_broadcaster = variation(&compared, period, Dimension::Broadcaster);
        let chart = ChartSpec::bar("Revenue variation by broadcaster", &by_broadcaster, "broadcaster", "delta");
        report.sections.push(
            Section::table("Variation by broadcaster", by_broadcaster, super::NO_DATA).with_chart(chart),
        );
    }
    Ok(report)
}

/// Clients of one churn side with their sums in the originating year
fn side_table(name: &str, side: &ChurnSide) -> ResultTable {
    let mut result = ResultTable::new(
        name,
        vec![
            Column::label("client"),
            Column::money("revenue"),
            Column::count("insertions"),
            Column::ratio("unit_cost", ColumnKind::Money, "revenue", "insertions"),
        ],
    );
    for row in &side.clients {
        result.push(vec![
            Value::from(row.name()),
            Value::from(row.total.revenue),
            Value::from(row.total.insertions),
            Value::from(row.total.unit_cost()),
        ]);
    }
    append_total(result)
}

/// Revenue and insertion change per group, largest drop first
fn variation(table: &Table, period: &Period, dimension: Dimension) -> ResultTable {
    let column = dimension.column();
    let mut result = ResultTable::new(
        format!("variation_by_{column}"),
        vec![
            Column::label(column),
            Column::money("revenue_base"),
            Column::money("revenue_comparison"),
            Column::money("delta"),
            Column::change("delta_pct", "revenue_base", "revenue_comparison"),
            Column::count("insertions_base"),
            Column::count("insertions_comparison"),
            Column::count("insertions_delta"),
        ],
    );

    let groups = Aggregation::by(&[dimension])
        .split_by_years(&period.years())
        .run(&table.rows);
    let mut compared = compare_rows(&groups, period, Measure::Revenue);
    compared.sort_by(|a, b| compare_values(a.delta.delta, b.delta.delta));

    for row in compared {
        let insertions = compute_deltas(row.row, period, Measure::Insertions);
        result.push(vec![
            Value::from(row.row.name()),
            Value::from(row.delta.base),
            Value::from(row.delta.comparison),
            Value::from(row.delta.delta),
            Value::from(row.delta.delta_pct),
            Value::from(insertions.base),
            Value::from(insertions.comparison),
            Value::from(insertions.delta),
        ]);
    }
    append_total(result)
}
