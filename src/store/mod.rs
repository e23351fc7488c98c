//! SQLite-backed data store.
//!
//! One [`Store`] wraps one `rusqlite` connection for the whole session. The
//! connection stays in autocommit mode, so every successful statement is
//! committed immediately and a failed statement leaves nothing behind.
//!
//! # Operations
//!
//! - [`Store::create_table`]: validated table definitions → `CREATE TABLE`
//! - [`Store::insert_row`]: typed values → parameterized `INSERT`
//! - [`Store::execute`]: arbitrary SQL text, run verbatim

pub mod result;
pub mod row;
pub mod schema;

pub use result::QueryResult;
pub use row::FieldValue;
pub use schema::{ColumnDef, ColumnType, TableDescriptor, ValidationError};

use std::path::{Path, PathBuf};

use rusqlite::{params_from_iter, Connection};
use tracing::{debug, info};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Single-connection handle to the user database.
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Open or create the database file.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened store");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    /// Backing file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create a table from a validated definition.
    pub fn create_table(&self, table: &TableDescriptor) -> StoreResult<()> {
        let sql = table.create_sql();
        debug!(sql = %sql, "creating table");
        self.conn.execute(&sql, [])?;
        info!(table = table.name(), columns = table.columns().len(), "table created");
        Ok(())
    }

    /// Append one row. `values` must line up with the table's columns.
    pub fn insert_row(&self, table: &TableDescriptor, values: &[FieldValue]) -> StoreResult<()> {
        if values.len() != table.columns().len() {
            return Err(ValidationError::Arity {
                expected: table.columns().len(),
                got: values.len(),
            }
            .into());
        }

        let sql = table.insert_sql();
        self.conn.execute(&sql, params_from_iter(values.iter()))?;
        debug!(table = table.name(), "row inserted");
        Ok(())
    }

    /// Current contents of a table.
    pub fn select_all(&self, table: &TableDescriptor) -> StoreResult<QueryResult> {
        self.execute(&table.select_all_sql())
    }

    /// Run SQL text verbatim.
    ///
    /// Statements that produce columns return their rows; others return an
    /// empty result carrying the number of changed rows.
    pub fn execute(&self, sql: &str) -> StoreResult<QueryResult> {
        debug!(sql = %sql, "executing");
        let mut stmt = self.conn.prepare(sql)?;

        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        if columns.is_empty() {
            let changed = stmt.execute([])?;
            return Ok(QueryResult {
                columns,
                rows: Vec::new(),
                rows_affected: Some(changed),
            });
        }

        let width = columns.len();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, rusqlite::types::Value>(i))
                    .collect::<Result<Vec<_>, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QueryResult {
            columns,
            rows,
            rows_affected: None,
        })
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("path", &self.path).finish()
    }
}
