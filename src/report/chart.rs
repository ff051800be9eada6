//! Renderer-agnostic chart descriptions attached to report sections

use serde::Serialize;

use crate::core::{OverlapMatrix, ResultTable, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ChartKind {
    Bar,
    Line,
    Pie,
    Heatmap,
    Scatter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Series {
    pub(crate) name: String,
    pub(crate) kind: ChartKind,
    pub(crate) values: Vec<Option<f64>>,
    /// Plot against a secondary y axis
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub(crate) secondary_axis: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Point {
    pub(crate) label: String,
    pub(crate) group: String,
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ReferenceLine {
    pub(crate) axis: &'static str,
    pub(crate) value: f64,
    pub(crate) label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ChartSpec {
    pub(crate) kind: ChartKind,
    pub(crate) title: String,
    pub(crate) categories: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) series: Vec<Series>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) points: Vec<Point>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) reference_lines: Vec<ReferenceLine>,
}

impl ChartSpec {
    fn new(kind: ChartKind, title: impl Into<String>, categories: Vec<String>) -> Self {
        ChartSpec {
            kind,
            title: title.into(),
            categories,
            series: Vec::new(),
            points: Vec::new(),
            reference_lines: Vec::new(),
        }
    }

    fn series(mut self, name: &str, kind: ChartKind, values: Vec<Option<f64>>, secondary_axis: bool) -> Self {
        self.series.push(Series {
            name: name.to_string(),
            kind,
            values,
            secondary_axis,
        });
        self
    }

    /// Bar chart of one numeric column against the label column of a table
    pub(crate) fn bar(title: &str, table: &ResultTable, label: &str, value: &str) -> Self {
        let (categories, values) = column_pair(table, label, value);
        ChartSpec::new(ChartKind::Bar, title, categories).series(value, ChartKind::Bar, values, false)
    }

    pub(crate) fn pie(title: &str, table: &ResultTable, label: &str, value: &str) -> Self {
        let (categories, values) = column_pair(table, label, value);
        ChartSpec::new(ChartKind::Pie, title, categories).series(value, ChartKind::Pie, values, false)
    }

    /// Bars for `bars` with a line for `line` on a secondary axis
    pub(crate) fn bar_line(title: &str, table: &ResultTable, label: &str, bars: &str, line: &str) -> Self {
        let (categories, bar_values) = column_pair(table, label, bars);
        let (_, line_values) = column_pair(table, label, line);
        ChartSpec::new(ChartKind::Bar, title, categories)
            .series(bars, ChartKind::Bar, bar_values, false)
            .series(line, ChartKind::Line, line_values, true)
    }

    pub(crate) fn heatmap(title: &str, matrix: &OverlapMatrix) -> Self {
        let mut chart = ChartSpec::new(ChartKind::Heatmap, title, matrix.labels.clone());
        for (label, row) in matrix.labels.iter().zip(&matrix.values) {
            chart = chart.series(label, ChartKind::Heatmap, row.iter().map(|v| Some(*v)).collect(), false);
        }
        chart
    }

    pub(crate) fn scatter(title: &str, points: Vec<Point>) -> Self {
        let mut groups: Vec<String> = points.iter().map(|p| p.group.clone()).collect();
        groups.sort();
        groups.dedup();
        let mut chart = ChartSpec::new(ChartKind::Scatter, title, groups);
        chart.points = points;
        chart
    }

    pub(crate) fn with_reference(mut self, axis: &'static str, value: Option<f64>, label: &str) -> Self {
        if let Some(value) = value {
            self.reference_lines.push(ReferenceLine {
                axis,
                value,
                label: label.to_string(),
            });
        }
        self
    }
}

/// Labels and values of two columns, data rows only
fn column_pair(table: &ResultTable, label: &str, value: &str) -> (Vec<String>, Vec<Option<f64>>) {
    let labels = table
        .column_values(label)
        .into_iter()
        .map(|v| match v.as_text() {
            Some(s) => s.to_string(),
            None => v.as_f64().map(|n| n.to_string()).unwrap_or_default(),
        })
        .collect();
    let values = table
        .column_values(value)
        .iter()
        .map(Value::as_f64)
        .collect();
    (labels, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, append_total};

    fn table() -> ResultTable {
        let mut t = ResultTable::new(
            "by_broadcaster",
            vec![Column::label("broadcaster"), Column::money("revenue"), Column::count("insertions")],
        );
        t.push(vec![Value::from("A"), Value::Number(10.0), Value::Number(2.0)]);
        t.push(vec![Value::from("B"), Value::Undefined, Value::Number(1.0)]);
        append_total(t)
    }

    #[test]
    fn bar_chart_skips_total_row() {
        let chart = ChartSpec::bar("Revenue", &table(), "broadcaster", "revenue");
        assert_eq!(chart.categories, vec!["A", "B"]);
        assert_eq!(chart.series[0].values, vec![Some(10.0), None]);
    }

    #[test]
    fn bar_line_uses_secondary_axis() {
        let chart = ChartSpec::bar_line("Evolution", &table(), "broadcaster", "revenue", "insertions");
        assert_eq!(chart.series.len(), 2);
        assert!(chart.series[1].secondary_axis);
        assert_eq!(chart.series[1].kind, ChartKind::Line);
    }

    #[test]
    fn heatmap_serializes_rows() {
        let matrix = OverlapMatrix {
            labels: vec!["A".to_string(), "B".to_string()],
            values: vec![vec![2.0, 1.0], vec![1.0, 3.0]],
        };
        let json = serde_json::to_value(ChartSpec::heatmap("Overlap", &matrix)).unwrap();
        assert_eq!(json["kind"], "heatmap");
        assert_eq!(json["series"][1]["values"][1], 3.0);
        assert!(json.get("points").is_none());
    }

    #[test]
    fn reference_line_only_when_defined() {
        let chart = ChartSpec::scatter("Efficiency", Vec::new())
            .with_reference("x", None, "median")
            .with_reference("y", Some(2.0), "median");
        assert_eq!(chart.reference_lines.len(), 1);
        assert_eq!(chart.reference_lines[0].axis, "y");
    }
}
