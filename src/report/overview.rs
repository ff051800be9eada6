//! Overview: headline KPIs, monthly evolution and revenue breakdowns

use crate::core::{
    Aggregation, Column, ColumnKind, Delta, Dimension, Field, Measure, ResultTable, Table, Totals, Value,
    append_total, ratio,
};
use crate::data::month_abbreviation;
use crate::error::AppError;
use crate::report::{ChartSpec, Kpi, ReportKind, ReportOutput, ReportParams, Section, Window};

pub(super) fn build(table: &Table, params: &ReportParams) -> Result<ReportOutput, AppError> {
    let window = match Window::open(table, params.months) {
        Ok(w) => w,
        Err(note) => return Ok(ReportOutput::empty(ReportKind::Overview, note)),
    };
    let mut report = ReportOutput::new(
        ReportKind::Overview,
        format!("{} ({})", ReportKind::Overview.title(), window.years_label()),
    );
    report.kpis = kpis(&window);

    let evolution = monthly_evolution(&window.table);
    let chart = ChartSpec::bar_line("Monthly evolution", &evolution, "label", "revenue", "insertions");
    report
        .sections
        .push(Section::table("Monthly evolution", evolution, super::NO_DATA).with_chart(chart));

    for (dimension, field, title) in [
        (Dimension::Broadcaster, Field::Broadcaster, "Revenue by broadcaster"),
        (Dimension::Executive, Field::Executive, "Revenue by executive"),
    ] {
        if !window.table.has(field) {
            report
                .sections
                .push(Section::note(title, &format!("No {} column in the data.", field.name())));
            continue;
        }
        let breakdown = revenue_breakdown(&window.table, dimension);
        let chart = ChartSpec::bar(title, &breakdown, dimension.column(), "revenue");
        report
            .sections
            .push(Section::table(title, breakdown, super::NO_DATA).with_chart(chart));
    }
    Ok(report)
}

fn kpis(window: &Window) -> Vec<Kpi> {
    let period = &window.period;
    let in_year = |year: i32| Totals::from_rows(window.table.rows.iter().filter(|t| t.year == year));
    let base = in_year(period.base_year);
    let comparison = in_year(period.comparison_year);
    let delta = Delta::between(base.revenue, comparison.revenue);

    let top_client = Aggregation::by(&[Dimension::Client])
        .ranked_by(Measure::Revenue)
        .run(window.table.rows.iter().filter(|t| t.year == period.comparison_year))
        .first()
        .map_or(Value::Undefined, |row| Value::from(row.name()));

    vec![
        Kpi::new(format!("Revenue {}", period.base_year), base.revenue, ColumnKind::Money),
        Kpi::new(
            format!("Revenue {}", period.comparison_year),
            comparison.revenue,
            ColumnKind::Money,
        ),
        Kpi::new("Delta", delta.delta, ColumnKind::Money),
        Kpi::new("Delta %", delta.delta_pct, ColumnKind::Change),
        Kpi::new(
            format!("Active clients {}", period.comparison_year),
            comparison.client_count(),
            ColumnKind::Count,
        ),
        Kpi::new(
            "Average ticket",
            ratio(comparison.revenue, comparison.client_count() as f64),
            ColumnKind::Money,
        ),
        Kpi::new("Top client", top_client, ColumnKind::Text),
    ]
}

/// Revenue and insertions per (year, month), chronological
fn monthly_evolution(table: &Table) -> ResultTable {
    let mut evolution = ResultTable::new(
        "monthly_evolution",
        vec![
            Column::text("year"),
            Column::text("month"),
            Column::label("label"),
            Column::money("revenue"),
            Column::count("insertions"),
        ],
    );
    for year in table.years() {
        let months = Aggregation::by(&[Dimension::Month])
            .listed()
            .run(table.rows.iter().filter(|t| t.year == year));
        for row in months {
            let month: u32 = row.name().parse().unwrap_or_default();
            evolution.push(vec![
                Value::from(year),
                Value::from(i64::from(month)),
                Value::from(format!("{}/{:02}", month_abbreviation(month), year.rem_euclid(100))),
                Value::from(row.total.revenue),
                Value::from(row.total.insertions),
            ]);
        }
    }
    evolution
}

/// Ranked revenue per `dimension` with each group's share of the window
fn revenue_breakdown(table: &Table, dimension: Dimension) -> ResultTable {
    let column = dimension.column();
    let mut breakdown = ResultTable::new(
        format!("revenue_by_{column}"),
        vec![
            Column::label(column),
            Column::money("revenue"),
            Column::count("insertions"),
            Column::ratio("share", ColumnKind::Share, "revenue", "revenue"),
        ],
    );
    let total = Totals::from_rows(&table.rows).revenue;
    for row in Aggregation::by(&[dimension]).ranked_by(Measure::Revenue).run(&table.rows) {
        breakdown.push(vec![
            Value::from(row.name()),
            Value::from(row.total.revenue),
            Value::from(row.total.insertions),
            Value::from(ratio(row.total.revenue, total)),
        ]);
    }
    append_total(breakdown)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::report::fixtures::{sample, table, tx};

    fn kpi<'a>(report: &'a ReportOutput, label: &str) -> &'a Value {
        &report.kpis.iter().find(|k| k.label == label).unwrap().value
    }

    #[test]
    fn kpis_compare_base_and_comparison_year() {
        let report = build(&sample(), &ReportParams::default()).unwrap();
        assert_eq!(report.title, "Overview (2024 vs 2025)");
        assert_eq!(kpi(&report, "Revenue 2024"), &Value::Number(2000.0));
        assert_eq!(kpi(&report, "Revenue 2025"), &Value::Number(1700.0));
        assert_eq!(kpi(&report, "Delta"), &Value::Number(-300.0));
        assert_eq!(kpi(&report, "Delta %"), &Value::Number(-15.0));
        assert_eq!(kpi(&report, "Active clients 2025"), &Value::Number(3.0));
        assert_eq!(kpi(&report, "Top client"), &Value::from("Acme"));
    }

    #[test]
    fn delta_pct_undefined_without_base_revenue() {
        let t = table(vec![
            tx("X", "TV", "E", 2024, 1, 0.0, 1.0),
            tx("X", "TV", "E", 2025, 1, 100.0, 1.0),
        ]);
        let report = build(&t, &ReportParams::default()).unwrap();
        assert_eq!(kpi(&report, "Delta %"), &Value::Undefined);
    }

    #[test]
    fn monthly_evolution_is_chronological_with_labels() {
        let report = build(&sample(), &ReportParams::default()).unwrap();
        let evolution = report.section("Monthly evolution").unwrap().table.as_ref().unwrap();
        let labels: Vec<Value> = evolution.column_values("label");
        assert_eq!(labels.first(), Some(&Value::from("Jan/24")));
        assert_eq!(labels.last(), Some(&Value::from("Mar/25")));
        assert_eq!(labels.len(), 7);
        assert!(!evolution.has_total);
    }

    #[test]
    fn broadcaster_shares_total_to_one() {
        let report = build(&sample(), &ReportParams::default()).unwrap();
        let section = report.section("Revenue by broadcaster").unwrap();
        let breakdown = section.table.as_ref().unwrap();
        assert_eq!(breakdown.cell(0, "broadcaster"), Some(&Value::from("TV1")));
        let total = breakdown.total_row().unwrap();
        assert_eq!(total[3], Value::Number(1.0));
        assert!(section.chart.is_some());
    }

    #[test]
    fn missing_executive_column_is_a_note() {
        let mut t = sample();
        t.present.remove(&Field::Executive);
        let report = build(&t, &ReportParams::default()).unwrap();
        let section = report.section("Revenue by executive").unwrap();
        assert!(section.table.is_none());
        assert!(section.note.is_some());
    }
}
