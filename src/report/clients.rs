//! Clients & revenue: comparative breakdowns per broadcaster, executive and client

use crate::core::{
    AggregateRow, Aggregation, Column, ColumnKind, Dimension, Field, Measure, Period, ResultTable, Table, TotalRule,
    Totals, Value, append_total, compare_rows, compare_values, ratio,
};
use crate::data::month_abbreviation;
use crate::error::AppError;
use crate::report::{ChartSpec, ReportKind, ReportOutput, ReportParams, Section, Window};

const NO_ROWS: &str = "No data for the selected filters.";

pub(super) fn build(table: &Table, params: &ReportParams) -> Result<ReportOutput, AppError> {
    let window = match Window::open(table, params.months) {
        Ok(w) => w,
        Err(note) => return Ok(ReportOutput::empty(ReportKind::Clients, note)),
    };
    let mut report = ReportOutput::new(
        ReportKind::Clients,
        format!("{} ({})", ReportKind::Clients.title(), window.years_label()),
    );
    let rows = &window.table;
    let period = &window.period;

    let totals = by_field(rows, Field::Broadcaster, "Broadcaster totals", || broadcaster_totals(rows));
    let chart = totals
        .table
        .as_ref()
        .map(|result| ChartSpec::bar("Revenue per broadcaster", result, "broadcaster", "revenue"));
    let totals = match chart {
        Some(chart) => totals.with_chart(chart),
        None => totals,
    };
    report.sections = vec![
        by_field(rows, Field::Broadcaster, "Clients per broadcaster", || {
            client_counts(rows, period)
        }),
        by_field(rows, Field::Broadcaster, "Revenue per broadcaster", || {
            revenue_comparison(rows, period, Dimension::Broadcaster)
        }),
        by_field(rows, Field::Executive, "Revenue per executive", || {
            revenue_comparison(rows, period, Dimension::Executive)
        }),
        by_field(rows, Field::Broadcaster, "Averages per client", || per_client_averages(rows)),
        totals,
        Section::table("Month-by-month revenue", month_by_month(rows), NO_ROWS),
        Section::table("Client relation", client_relation(rows, period), NO_ROWS),
    ];
    Ok(report)
}

/// Section built only when the source carried `field`
fn by_field<F>(table: &Table, field: Field, title: &str, build: F) -> Section
where
    F: FnOnce() -> ResultTable,
{
    if table.has(field) {
        Section::table(title, build(), NO_ROWS)
    } else {
        Section::note(title, &format!("No {} column in the data.", field.name()))
    }
}

fn by_year(table: &Table, period: &Period, dimension: Dimension) -> Vec<AggregateRow> {
    Aggregation::by(&[dimension])
        .split_by_years(&period.years())
        .listed()
        .run(&table.rows)
}

/// Distinct clients per broadcaster in the base and comparison year
fn client_counts(table: &Table, period: &Period) -> ResultTable {
    let mut result = ResultTable::new(
        "clients_per_broadcaster",
        vec![
            Column::label("broadcaster"),
            Column::count("clients_base"),
            Column::count("clients_comparison"),
            Column::count("delta"),
            Column::change("delta_pct", "clients_base", "clients_comparison"),
        ],
    );
    let groups = by_year(table, period, Dimension::Broadcaster);
    for row in compare_rows(&groups, period, Measure::Clients) {
        result.push(vec![
            Value::from(row.row.name()),
            Value::from(row.delta.base),
            Value::from(row.delta.comparison),
            Value::from(row.delta.delta),
            Value::from(row.delta.delta_pct),
        ]);
    }
    append_total(result)
}

/// Revenue base vs comparison per group, plus insertions and unit cost over the window
fn revenue_comparison(table: &Table, period: &Period, dimension: Dimension) -> ResultTable {
    let window = Totals::from_rows(&table.rows);
    let column = dimension.column();
    let mut result = ResultTable::new(
        format!("revenue_per_{column}"),
        vec![
            Column::label(column),
            Column::money("revenue_base"),
            Column::money("revenue_comparison"),
            Column::money("delta"),
            Column::change("delta_pct", "revenue_base", "revenue_comparison"),
            Column::count("insertions"),
            Column::new("unit_cost", ColumnKind::Money).with_total(TotalRule::Fixed(window.unit_cost().into())),
        ],
    );
    let groups = by_year(table, period, dimension);
    for row in compare_rows(&groups, period, Measure::Revenue) {
        result.push(vec![
            Value::from(row.row.name()),
            Value::from(row.delta.base),
            Value::from(row.delta.comparison),
            Value::from(row.delta.delta),
            Value::from(row.delta.delta_pct),
            Value::from(row.row.total.insertions),
            Value::from(row.row.total.unit_cost()),
        ]);
    }
    append_total(result)
}

/// Revenue and insertions per client for each broadcaster
///
/// The total row divides by the distinct clients of the whole window, so a
/// client active under several broadcasters counts once.
fn per_client_averages(table: &Table) -> ResultTable {
    let window = Totals::from_rows(&table.rows);
    let mut result = ResultTable::new(
        "averages_per_client",
        vec![
            Column::label("broadcaster"),
            Column::money("revenue"),
            Column::count("insertions"),
            Column::count("clients").with_total(TotalRule::Fixed(window.client_count().into())),
            Column::ratio("revenue_per_client", ColumnKind::Money, "revenue", "clients"),
            Column::ratio("insertions_per_client", ColumnKind::Average, "insertions", "clients"),
        ],
    );
    for row in Aggregation::by(&[Dimension::Broadcaster]).listed().run(&table.rows) {
        let clients = row.total.client_count() as f64;
        result.push(vec![
            Value::from(row.name()),
            Value::from(row.total.revenue),
            Value::from(row.total.insertions),
            Value::from(clients),
            Value::from(ratio(row.total.revenue, clients)),
            Value::from(ratio(row.total.insertions, clients)),
        ]);
    }
    append_total(result)
}

fn broadcaster_totals(table: &Table) -> ResultTable {
    let mut result = ResultTable::new(
        "broadcaster_totals",
        vec![
            Column::label("broadcaster"),
            Column::money("revenue"),
            Column::count("insertions"),
            Column::ratio("unit_cost", ColumnKind::Money, "revenue", "insertions"),
        ],
    );
    for row in Aggregation::by(&[Dimension::Broadcaster])
        .ranked_by(Measure::Revenue)
        .run(&table.rows)
    {
        result.push(vec![
            Value::from(row.name()),
            Value::from(row.total.revenue),
            Value::from(row.total.insertions),
            Value::from(row.total.unit_cost()),
        ]);
    }
    append_total(result)
}

/// One revenue column per year present, one row per month present
fn month_by_month(table: &Table) -> ResultTable {
    let years: Vec<i32> = table.years().into_iter().collect();
    let mut columns = vec![Column::label("month")];
    columns.extend(years.iter().map(|y| Column::money(y.to_string())));
    let mut result = ResultTable::new("month_by_month", columns);

    let groups = Aggregation::by(&[Dimension::Month])
        .split_by_years(&years)
        .listed()
        .run(&table.rows);
    for row in groups {
        let month: u32 = row.name().parse().unwrap_or_default();
        let mut cells = vec![Value::from(month_abbreviation(month))];
        cells.extend(years.iter().map(|y| Value::from(row.year_value(*y, Measure::Revenue))));
        result.push(cells);
    }
    append_total(result)
}

/// Every client with its two-year revenue, ranked by the sum of both years
fn client_relation(table: &Table, period: &Period) -> ResultTable {
    let window = Totals::from_rows(&table.rows);
    let mut result = ResultTable::new(
        "client_relation",
        vec![
            Column::label("client"),
            Column::money("revenue_base"),
            Column::money("revenue_comparison"),
            Column::money("total"),
            Column::ratio("share", ColumnKind::Share, "total", "total"),
            Column::count("insertions"),
            Column::new("unit_cost", ColumnKind::Money).with_total(TotalRule::Fixed(window.unit_cost().into())),
        ],
    );

    let groups = by_year(table, period, Dimension::Client);
    let mut compared = compare_rows(&groups, period, Measure::Revenue);
    // a single-year period compares the year with itself; count it once
    let pair_total = |base: f64, comparison: f64| {
        if period.is_single_year() {
            base
        } else {
            base + comparison
        }
    };
    compared.sort_by(|a, b| {
        compare_values(
            pair_total(b.delta.base, b.delta.comparison),
            pair_total(a.delta.base, a.delta.comparison),
        )
    });
    let grand: f64 = compared
        .iter()
        .map(|c| pair_total(c.delta.base, c.delta.comparison))
        .sum();

    for row in compared {
        let total = pair_total(row.delta.base, row.delta.comparison);
        result.push(vec![
            Value::from(row.row.name()),
            Value::from(row.delta.base),
            Value::from(row.delta.comparison),
            Value::from(total),
            Value::from(ratio(total, grand)),
            Value::from(row.row.total.insertions),
            Value::from(row.row.total.unit_cost()),
        ]);
    }
    append_total(result)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::report::fixtures::{sample, table, tx};

    fn run() -> ReportOutput {
        build(&sample(), &ReportParams::default()).unwrap()
    }

    fn section<'a>(report: &'a ReportOutput, title: &str) -> &'a ResultTable {
        report.section(title).unwrap().table.as_ref().unwrap()
    }

    #[test]
    fn seven_sections_in_order() {
        let titles: Vec<String> = run().sections.into_iter().map(|s| s.title).collect();
        assert_eq!(
            titles,
            vec![
                "Clients per broadcaster",
                "Revenue per broadcaster",
                "Revenue per executive",
                "Averages per client",
                "Broadcaster totals",
                "Month-by-month revenue",
                "Client relation",
            ]
        );
    }

    #[test]
    fn client_counts_are_listed_with_deltas() {
        let report = run();
        let counts = section(&report, "Clients per broadcaster");
        let names: Vec<Value> = counts.column_values("broadcaster");
        assert_eq!(names, vec![Value::from("Radio"), Value::from("TV1"), Value::from("Web")]);
        // Radio: Acme and Gone in 2024, nobody in 2025
        assert_eq!(counts.cell(0, "delta"), Some(&Value::Number(-2.0)));
        assert_eq!(counts.cell(0, "delta_pct"), Some(&Value::Number(-100.0)));
        // Web only exists in 2025
        assert_eq!(counts.cell(2, "delta_pct"), Some(&Value::Undefined));
    }

    #[test]
    fn revenue_comparison_total_recomputes_change() {
        let report = run();
        let revenue = section(&report, "Revenue per broadcaster");
        let total = revenue.total_row().unwrap();
        assert_eq!(total[1], Value::Number(2000.0));
        assert_eq!(total[2], Value::Number(1700.0));
        assert_eq!(total[4], Value::Number(-15.0));
        // window unit cost: 3700 / 39
        assert_eq!(total[6], Value::Number(3700.0 / 39.0));
    }

    #[test]
    fn averages_total_uses_distinct_window_clients() {
        let report = run();
        let averages = section(&report, "Averages per client");
        let total = averages.total_row().unwrap();
        // Acme and Beta appear under two broadcasters but count once
        assert_eq!(total[3], Value::Number(4.0));
        assert_eq!(total[4], Value::Number(3700.0 / 4.0));
    }

    #[test]
    fn month_by_month_has_one_column_per_year() {
        let report = run();
        let months = section(&report, "Month-by-month revenue");
        assert_eq!(months.column_names(), vec!["month", "2024", "2025"]);
        assert_eq!(months.cell(0, "month"), Some(&Value::from("Jan")));
        assert_eq!(months.cell(0, "2025"), Some(&Value::Number(1200.0)));
        assert_eq!(months.cell(3, "2025"), Some(&Value::Number(0.0)));
    }

    #[test]
    fn client_relation_ranked_by_two_year_sum() {
        let report = run();
        let relation = section(&report, "Client relation");
        assert_eq!(relation.cell(0, "client"), Some(&Value::from("Acme")));
        assert_eq!(relation.cell(0, "total"), Some(&Value::Number(2700.0)));
        let total = relation.total_row().unwrap();
        assert_eq!(total[3], Value::Number(3700.0));
        assert_eq!(total[4], Value::Number(1.0));
    }

    #[test]
    fn single_year_relation_counts_year_once() {
        let t = table(vec![tx("X", "TV", "E", 2024, 1, 100.0, 1.0)]);
        let report = build(&t, &ReportParams::default()).unwrap();
        let relation = section(&report, "Client relation");
        assert_eq!(relation.cell(0, "total"), Some(&Value::Number(100.0)));
    }

    #[test]
    fn broadcaster_sections_need_the_column() {
        let mut t = sample();
        t.present.remove(&Field::Broadcaster);
        let report = build(&t, &ReportParams::default()).unwrap();
        assert!(report.section("Clients per broadcaster").unwrap().table.is_none());
        assert!(report.section("Revenue per executive").unwrap().table.is_some());
        assert!(report.section("Client relation").unwrap().table.is_some());
    }
}
