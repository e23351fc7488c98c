//! Typed field values for row insertion.

use chrono::NaiveDate;
use rusqlite::types::{ToSql, ToSqlOutput, Value};

use super::schema::{ColumnDef, ColumnType, TableDescriptor, ValidationError};

/// Date formats accepted from user input. Dates are always stored as ISO.
const DATE_INPUT_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];

/// A single value bound into an INSERT.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Date(NaiveDate),
}

impl FieldValue {
    /// Convert raw user input for a column.
    ///
    /// Dates must parse. Numbers that do not parse are kept as text and left
    /// to the store's type affinity.
    pub fn from_input(column: &ColumnDef, raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let value = match column.data_type {
            ColumnType::Date => FieldValue::Date(parse_date(trimmed).ok_or_else(|| {
                ValidationError::InvalidDate {
                    column: column.name.clone(),
                    value: raw.to_string(),
                }
            })?),
            ColumnType::Integer => trimmed
                .parse()
                .map(FieldValue::Integer)
                .unwrap_or_else(|_| FieldValue::Text(raw.to_string())),
            ColumnType::Real => trimmed
                .parse()
                .map(FieldValue::Real)
                .unwrap_or_else(|_| FieldValue::Text(raw.to_string())),
            ColumnType::Text => FieldValue::Text(raw.to_string()),
        };
        Ok(value)
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            FieldValue::Null => Value::Null,
            FieldValue::Integer(i) => Value::Integer(*i),
            FieldValue::Real(r) => Value::Real(*r),
            FieldValue::Text(s) => Value::Text(s.clone()),
            FieldValue::Date(d) => Value::Text(format_date(*d)),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(date: NaiveDate) -> Self {
        FieldValue::Date(date)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<f64> for FieldValue {
    fn from(r: f64) -> Self {
        FieldValue::Real(r)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

/// ISO `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Convert a full row of raw inputs, checking arity first.
pub fn parse_row<S: AsRef<str>>(
    table: &TableDescriptor,
    raw: &[S],
) -> Result<Vec<FieldValue>, ValidationError> {
    if raw.len() != table.columns().len() {
        return Err(ValidationError::Arity {
            expected: table.columns().len(),
            got: raw.len(),
        });
    }
    table
        .columns()
        .iter()
        .zip(raw)
        .map(|(col, value)| FieldValue::from_input(col, value.as_ref()))
        .collect()
}
