//! Per-session context and page state machine.
//!
//! ```text
//!            switch_page                        create_table
//! Generator ◄──────────► Workbench[no table] ──────────────► Workbench[table]
//!                                                             │    ▲
//!                                                             └────┘ create_table / insert / ask
//! ```
//!
//! A [`Session`] owns everything one user interacts with: the current page,
//! the table created on the workbench, the store connection, and the
//! translator. Nothing is global, so several sessions can coexist.

pub mod command;
pub mod repl;
pub mod translate;

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::inference::{GenerationError, SqlGenerator};
use crate::store::row::parse_row;
use crate::store::{
    ColumnDef, QueryResult, Store, StoreError, StoreResult, TableDescriptor,
    ValidationError,
};

pub use translate::{Translation, Translator};

/// The two pages of the interactive surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Page {
    /// Prompt → SQL, never executed.
    #[default]
    Generator,
    /// Table creation, row insertion, prompt → SQL → results.
    Workbench,
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::Generator => write!(f, "SQL Generator"),
            Page::Workbench => write!(f, "SQL Workbench"),
        }
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "generator" | "gen" => Ok(Page::Generator),
            "workbench" | "wb" => Ok(Page::Workbench),
            other => Err(format!("unknown page: {} (expected generator or workbench)", other)),
        }
    }
}

/// Errors for a single session action. None of them end the session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Please enter a prompt first")]
    EmptyPrompt,

    #[error("{action} is only available on the {expected} page (current page: {current})")]
    WrongPage {
        action: &'static str,
        expected: Page,
        current: Page,
    },

    #[error("Create a table first")]
    NoTable,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Model generation error: {0}")]
    Generation(#[from] GenerationError),
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(v) => SessionError::Validation(v),
            other => SessionError::Store(other),
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Result of a workbench question.
///
/// The translation is always available for display, even when executing
/// the SQL failed.
#[derive(Debug)]
pub struct AskOutcome {
    pub translation: Translation,
    pub result: StoreResult<QueryResult>,
}

/// Interactive session state.
pub struct Session<G> {
    page: Page,
    table: Option<TableDescriptor>,
    store: Store,
    translator: Translator<G>,
}

impl<G: SqlGenerator> Session<G> {
    pub fn new(store: Store, translator: Translator<G>) -> Self {
        Self {
            page: Page::default(),
            table: None,
            store,
            translator,
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn switch_page(&mut self, page: Page) {
        if self.page != page {
            info!(from = %self.page, to = %page, "switching page");
            self.page = page;
        }
    }

    /// Table created on the workbench, if any.
    pub fn table(&self) -> Option<&TableDescriptor> {
        self.table.as_ref()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn translator(&self) -> &Translator<G> {
        &self.translator
    }

    fn require_page(&self, action: &'static str, expected: Page) -> SessionResult<()> {
        if self.page != expected {
            return Err(SessionError::WrongPage {
                action,
                expected,
                current: self.page,
            });
        }
        Ok(())
    }

    fn require_table(&self) -> SessionResult<&TableDescriptor> {
        self.table.as_ref().ok_or(SessionError::NoTable)
    }

    /// Generator page: raw prompt → SQL. Nothing is executed.
    pub fn generate(&mut self, prompt: &str) -> SessionResult<String> {
        self.require_page("Generate SQL", Page::Generator)?;
        if prompt.trim().is_empty() {
            return Err(SessionError::EmptyPrompt);
        }
        Ok(self.translator.generate_raw(prompt)?)
    }

    /// Workbench: define and create a table.
    ///
    /// On success the new table becomes the session's table.
    pub fn create_table(
        &mut self,
        name: &str,
        columns: impl IntoIterator<Item = ColumnDef>,
    ) -> SessionResult<&TableDescriptor> {
        self.require_page("Create Table", Page::Workbench)?;
        let table = TableDescriptor::new(name, columns)?;
        self.store.create_table(&table)?;
        Ok(self.table.insert(table))
    }

    /// Workbench: insert a row from raw text inputs, one per column.
    pub fn insert_row<S: AsRef<str>>(&mut self, raw: &[S]) -> SessionResult<()> {
        self.require_page("Insert Row", Page::Workbench)?;
        let table = self.require_table()?;
        let values = parse_row(table, raw)?;
        self.store.insert_row(table, &values)?;
        Ok(())
    }

    /// Workbench: current contents of the session's table.
    pub fn current_rows(&self) -> SessionResult<QueryResult> {
        self.require_page("Current Table Data", Page::Workbench)?;
        let table = self.require_table()?;
        Ok(self.store.select_all(table)?)
    }

    /// Workbench: prompt → normalized → SQL → denormalized → executed.
    ///
    /// Generation failures abort the action; execution failures are
    /// returned inside the outcome next to the SQL that caused them.
    pub fn ask(&mut self, prompt: &str) -> SessionResult<AskOutcome> {
        self.require_page("Generate SQL and Execute", Page::Workbench)?;
        self.require_table()?;
        if prompt.trim().is_empty() {
            return Err(SessionError::EmptyPrompt);
        }

        let translation = self.translator.translate(prompt)?;
        let result = self.store.execute(&translation.sql);
        Ok(AskOutcome {
            translation,
            result,
        })
    }
}

impl<G> fmt::Debug for Session<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("page", &self.page)
            .field("table", &self.table)
            .field("store", &self.store)
            .finish()
    }
}
