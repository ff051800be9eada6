//! Result tables handed to the output and export layers
//!
//! Column names are stable contracts (`delta`, `delta_pct`, `share`,
//! `cumulative_share`, `class`, ...); the kind of a column only drives
//! formatting.

use serde::{Serialize, Serializer};

/// One cell of a result table
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Text(String),
    Number(f64),
    /// Division by a non-positive denominator; never rendered as zero
    Undefined,
}

impl Value {
    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    pub(crate) fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn is_undefined(&self) -> bool {
        self.as_f64().is_none() && self.as_text().is_none()
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        if n.is_finite() {
            Value::Number(n)
        } else {
            Value::Undefined
        }
    }
}

impl From<Option<f64>> for Value {
    fn from(n: Option<f64>) -> Self {
        n.map_or(Value::Undefined, Value::from)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Text(s) => serializer.serialize_str(s),
            Value::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            _ => serializer.serialize_none(),
        }
    }
}

/// Formatting family of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ColumnKind {
    /// Row identity (client, broadcaster, ...); holds the total label
    Label,
    Text,
    Money,
    /// Integral quantity (clients, insertions, years)
    Count,
    /// Non-integral quantity such as insertions per client
    Average,
    /// Signed percentage change
    Change,
    /// Unsigned percentage in 0-100
    Percent,
    /// Fraction in 0-1, displayed as a percentage
    Share,
}

/// How the totalizer fills a column
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TotalRule {
    /// The fixed total label
    Label,
    /// Sum of the defined cells
    Sum,
    /// Left empty
    Blank,
    /// A value known by the caller, e.g. a distinct count over the whole window
    Fixed(Value),
    /// `numerator / denominator * scale`, both read from the total row
    Ratio {
        numerator: &'static str,
        denominator: &'static str,
        scale: f64,
    },
    /// Percentage change between two columns of the total row
    Change {
        base: &'static str,
        comparison: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Column {
    pub(crate) name: String,
    pub(crate) kind: ColumnKind,
    pub(crate) total: TotalRule,
}

impl Column {
    pub(crate) fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        let total = match kind {
            ColumnKind::Label => TotalRule::Label,
            ColumnKind::Money | ColumnKind::Count => TotalRule::Sum,
            _ => TotalRule::Blank,
        };
        Column {
            name: name.into(),
            kind,
            total,
        }
    }

    pub(crate) fn label(name: impl Into<String>) -> Self {
        Column::new(name, ColumnKind::Label)
    }

    pub(crate) fn text(name: impl Into<String>) -> Self {
        Column::new(name, ColumnKind::Text)
    }

    pub(crate) fn money(name: impl Into<String>) -> Self {
        Column::new(name, ColumnKind::Money)
    }

    pub(crate) fn count(name: impl Into<String>) -> Self {
        Column::new(name, ColumnKind::Count)
    }

    pub(crate) fn with_total(mut self, rule: TotalRule) -> Self {
        self.total = rule;
        self
    }

    /// Percentage change column totalled from the two compared columns
    pub(crate) fn change(name: impl Into<String>, base: &'static str, comparison: &'static str) -> Self {
        Column::new(name, ColumnKind::Change).with_total(TotalRule::Change { base, comparison })
    }

    /// Ratio column totalled as ratio-of-sums
    pub(crate) fn ratio(
        name: impl Into<String>,
        kind: ColumnKind,
        numerator: &'static str,
        denominator: &'static str,
    ) -> Self {
        Column::new(name, kind).with_total(TotalRule::Ratio {
            numerator,
            denominator,
            scale: 1.0,
        })
    }

    /// Percentage-of column (0-100) totalled as ratio-of-sums
    pub(crate) fn percent_of(name: impl Into<String>, numerator: &'static str, denominator: &'static str) -> Self {
        Column::new(name, ColumnKind::Percent).with_total(TotalRule::Ratio {
            numerator,
            denominator,
            scale: 100.0,
        })
    }
}

/// Ordered collection of uniform records
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResultTable {
    pub(crate) name: String,
    pub(crate) columns: Vec<Column>,
    pub(crate) rows: Vec<Vec<Value>>,
    /// Whether the last row is the synthetic total
    pub(crate) has_total: bool,
}

impl ResultTable {
    pub(crate) fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        ResultTable {
            name: name.into(),
            columns,
            rows: Vec::new(),
            has_total: false,
        }
    }

    /// Append a data row; short rows are padded with undefined cells
    pub(crate) fn push(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Undefined);
        self.rows.push(row);
    }

    pub(crate) fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub(crate) fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Rows without the total
    pub(crate) fn data_rows(&self) -> &[Vec<Value>] {
        if self.has_total {
            &self.rows[..self.rows.len().saturating_sub(1)]
        } else {
            &self.rows
        }
    }

    pub(crate) fn total_row(&self) -> Option<&[Value]> {
        if self.has_total {
            self.rows.last().map(Vec::as_slice)
        } else {
            None
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.data_rows().is_empty()
    }

    pub(crate) fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col)
    }

    /// Cells of one column, data rows only
    pub(crate) fn column_values(&self, column: &str) -> Vec<Value> {
        let Some(col) = self.column_index(column) else {
            return Vec::new();
        };
        self.data_rows().iter().map(|r| r[col].clone()).collect()
    }
}
