//! # nl2sql
//!
//! Translate natural-language prompts into SQL with a pretrained seq2seq
//! model, and run the result against a local SQLite database.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    User prompt                           │
//! │          "get all emp with age > 25"                     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [alias::normalize_prompt]
//! ┌─────────────────────────────────────────────────────────┐
//! │      Normalized prompt (schema nouns the model knows)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [inference::SqlGenerator]
//! ┌─────────────────────────────────────────────────────────┐
//! │      Generated SQL (tokenize → beam search → decode)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [alias::denormalize_sql]
//! ┌─────────────────────────────────────────────────────────┐
//! │      SQL in the user's vocabulary                        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [store::Store::execute]
//! ┌─────────────────────────────────────────────────────────┐
//! │      QueryResult or store error                          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! [`session::Session`] ties these together with the table-definition and
//! row-insertion operations of the workbench.

pub mod alias;
pub mod config;
pub mod inference;
pub mod logging;
pub mod session;
pub mod store;

pub use alias::{denormalize_sql, normalize_prompt, AliasTable, MatchMode};
pub use inference::{GenerationError, GenerationOptions, SqlGenerator};
pub use session::{Page, Session, SessionError, Translation, Translator};
pub use store::{ColumnDef, ColumnType, FieldValue, QueryResult, Store, TableDescriptor};
