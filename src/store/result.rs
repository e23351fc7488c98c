//! Tabular query results.

use rusqlite::types::Value;
use serde_json::{Map, Value as JsonValue};

/// Rows returned by a statement, or the change count for statements that
/// return no columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    /// Set for statements without result columns (INSERT, CREATE, ...).
    pub rows_affected: Option<usize>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Value at `row`, named `column`.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Aligned plain-text table, followed by a row count line.
    pub fn render(&self) -> String {
        if self.columns.is_empty() {
            return match self.rows_affected {
                Some(n) => format!("OK ({} {} affected)", n, plural(n, "row")),
                None => "(no columns)".to_string(),
            };
        }

        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(format_value).collect())
            .collect();

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let mut lines = Vec::with_capacity(cells.len() + 3);
        lines.push(format_line(&self.columns, &widths));
        lines.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        for row in &cells {
            lines.push(format_line(row, &widths));
        }
        let n = self.rows.len();
        lines.push(format!("({} {})", n, plural(n, "row")));
        lines.join("\n")
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_json(&self) -> JsonValue {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                for (name, value) in self.columns.iter().zip(row) {
                    obj.insert(name.clone(), value_to_json(value));
                }
                JsonValue::Object(obj)
            })
            .collect();
        JsonValue::Array(rows)
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

fn format_line<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell.as_ref(), width = *w))
        .collect();
    padded.join(" | ").trim_end().to_string()
}

/// Display form of a single cell.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Integer(i) => JsonValue::from(*i),
        Value::Real(r) => serde_json::Number::from_f64(*r)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::Blob(b) => JsonValue::Array(b.iter().map(|byte| JsonValue::from(*byte)).collect()),
    }
}
