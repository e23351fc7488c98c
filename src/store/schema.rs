//! Table definitions and CREATE TABLE generation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Maximum number of columns a table can be defined with.
pub const MAX_COLUMNS: usize = 10;

/// Errors for user-supplied table and row definitions.
///
/// Returned before anything touches the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Table name is required")]
    EmptyTableName,

    #[error("All column names must be filled in (column {index} is empty)")]
    EmptyColumnName { index: usize },

    #[error("A table needs between 1 and {max} columns, got {got}")]
    ColumnCount { got: usize, max: usize },

    #[error("Unknown column type '{0}' (expected INTEGER, TEXT, REAL or DATE)")]
    UnknownColumnType(String),

    #[error("Invalid column definition '{0}' (expected name:TYPE)")]
    MalformedColumn(String),

    #[error("Expected {expected} values, got {got}")]
    Arity { expected: usize, got: usize },

    #[error("Invalid date '{value}' for column '{column}' (expected YYYY-MM-DD)")]
    InvalidDate { column: String, value: String },
}

/// Column types offered when defining a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Integer,
    Text,
    Real,
    Date,
}

impl ColumnType {
    /// The SQL type keyword.
    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Text => "TEXT",
            ColumnType::Real => "REAL",
            ColumnType::Date => "DATE",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for ColumnType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INTEGER" | "INT" => Ok(ColumnType::Integer),
            "TEXT" => Ok(ColumnType::Text),
            "REAL" => Ok(ColumnType::Real),
            "DATE" => Ok(ColumnType::Date),
            _ => Err(ValidationError::UnknownColumnType(s.trim().to_string())),
        }
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

impl FromStr for ColumnDef {
    type Err = ValidationError;

    /// Parse `name:TYPE`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, ty) = s
            .rsplit_once(':')
            .ok_or_else(|| ValidationError::MalformedColumn(s.to_string()))?;
        Ok(ColumnDef::new(name.trim(), ty.parse()?))
    }
}

/// A validated table definition. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    name: String,
    columns: Vec<ColumnDef>,
}

impl TableDescriptor {
    /// Validate and build a table definition.
    ///
    /// Names are trimmed. The table name and every column name must be
    /// non-empty, and there must be 1 to [`MAX_COLUMNS`] columns.
    pub fn new(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = ColumnDef>,
    ) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyTableName);
        }

        let columns: Vec<ColumnDef> = columns
            .into_iter()
            .map(|c| ColumnDef::new(c.name.trim(), c.data_type))
            .collect();
        if columns.is_empty() || columns.len() > MAX_COLUMNS {
            return Err(ValidationError::ColumnCount {
                got: columns.len(),
                max: MAX_COLUMNS,
            });
        }
        if let Some(index) = columns.iter().position(|c| c.name.is_empty()) {
            return Err(ValidationError::EmptyColumnName { index: index + 1 });
        }

        Ok(Self { name, columns })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// `CREATE TABLE "name" ("col" TYPE, ...)`
    pub fn create_sql(&self) -> String {
        let cols: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} {}", quote_identifier(&c.name), c.data_type))
            .collect();
        format!(
            "CREATE TABLE {} ({})",
            quote_identifier(&self.name),
            cols.join(", ")
        )
    }

    /// `INSERT INTO "name" VALUES (?, ?, ...)` with one placeholder per column.
    pub fn insert_sql(&self) -> String {
        let placeholders = vec!["?"; self.columns.len()].join(", ");
        format!(
            "INSERT INTO {} VALUES ({})",
            quote_identifier(&self.name),
            placeholders
        )
    }

    /// `SELECT * FROM "name"`
    pub fn select_all_sql(&self) -> String {
        format!("SELECT * FROM {}", quote_identifier(&self.name))
    }
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
