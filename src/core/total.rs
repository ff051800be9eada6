//! Totalizer: synthetic grand-total row of a result table

use crate::consts::TOTAL_LABEL;
use crate::core::metrics::{percent_change, ratio};
use crate::core::table::{ColumnKind, ResultTable, TotalRule, Value};

fn sum_column(rows: &[Vec<Value>], col: usize) -> Value {
    let defined: Vec<f64> = rows.iter().filter_map(|r| r[col].as_f64()).collect();
    if defined.is_empty() {
        Value::Undefined
    } else {
        Value::Number(defined.iter().sum())
    }
}

fn number_at(table: &ResultTable, row: &[Value], column: &str) -> Option<f64> {
    table.column_index(column).and_then(|i| row[i].as_f64())
}

/// Append the total row as the last row of `table`
///
/// Sums skip undefined cells. Ratio and change columns are recomputed from the
/// summed columns of the total row itself, never averaged. Empty tables and
/// tables that already carry a total are returned unchanged.
pub(crate) fn append_total(mut table: ResultTable) -> ResultTable {
    if table.has_total || table.rows.is_empty() {
        return table;
    }

    let mut total: Vec<Value> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| match &column.total {
            TotalRule::Label => Value::from(TOTAL_LABEL),
            TotalRule::Sum => sum_column(&table.rows, i),
            TotalRule::Fixed(v) => v.clone(),
            _ => Value::Undefined,
        })
        .collect();

    for (i, column) in table.columns.iter().enumerate() {
        total[i] = match &column.total {
            TotalRule::Ratio {
                numerator,
                denominator,
                scale,
            } => match (
                number_at(&table, &total, numerator),
                number_at(&table, &total, denominator),
            ) {
                (Some(n), Some(d)) => Value::from(ratio(n, d).map(|r| r * scale)),
                _ => Value::Undefined,
            },
            TotalRule::Change { base, comparison } => match (
                number_at(&table, &total, base),
                number_at(&table, &total, comparison),
            ) {
                (Some(b), Some(c)) => Value::from(percent_change(b, c)),
                _ => Value::Undefined,
            },
            TotalRule::Blank if column.kind == ColumnKind::Text => Value::from(""),
            _ => continue,
        };
    }

    table.rows.push(total);
    table.has_total = true;
    table
}
