//! Parsing of interactive input lines.
//!
//! Lines starting with `:` are commands; any other non-empty line is a
//! prompt for the current page.
//!
//! ```text
//! :page workbench
//! :create employees name:TEXT age:INTEGER hired:DATE
//! :insert "Ann Lee" 31 2024-03-09
//! get all emp with age > 25
//! ```

use crate::store::{ColumnDef, ValidationError};

use super::Page;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Blank line.
    Empty,
    Page(Page),
    Create {
        table: String,
        columns: Vec<ColumnDef>,
    },
    Insert(Vec<String>),
    Show,
    Status,
    Aliases,
    Help,
    Quit,
    /// Natural-language prompt.
    Prompt(String),
}

/// Errors for malformed command lines.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command ':{0}' (try :help)")]
    Unknown(String),

    #[error("missing {0}")]
    MissingArgument(&'static str),

    #[error("unterminated quote")]
    UnterminatedQuote,

    #[error("{0}")]
    InvalidPage(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub const HELP: &str = "\
Commands:
  :page generator|workbench          switch page
  :create <table> <col>:<TYPE> ...   create a table (TYPE: INTEGER, TEXT, REAL, DATE)
  :insert <value> ...                insert a row into the table (quote values with spaces)
  :show                              show the table's current rows
  :status                            show session state
  :aliases                           show the alias table and its conflicts
  :help                              show this help
  :quit                              leave
Anything else is a natural-language prompt for the current page.";

/// Parse one input line.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }

    let Some(rest) = line.strip_prefix(':') else {
        return Ok(Command::Prompt(line.to_string()));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    match name.to_lowercase().as_str() {
        "page" => {
            if args.is_empty() {
                return Err(CommandError::MissingArgument("page name"));
            }
            args.parse()
                .map(Command::Page)
                .map_err(CommandError::InvalidPage)
        }
        "create" => {
            let mut words = split_args(args)?.into_iter();
            let table = words
                .next()
                .ok_or(CommandError::MissingArgument("table name"))?;
            let columns = words
                .map(|w| w.parse::<ColumnDef>())
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Command::Create { table, columns })
        }
        "insert" => Ok(Command::Insert(split_args(args)?)),
        "show" => Ok(Command::Show),
        "status" => Ok(Command::Status),
        "aliases" => Ok(Command::Aliases),
        "help" | "h" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

/// Split on whitespace, keeping double-quoted runs together.
///
/// `""` yields an empty argument.
pub fn split_args(s: &str) -> Result<Vec<String>, CommandError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in s.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if in_quotes {
        return Err(CommandError::UnterminatedQuote);
    }
    if has_token {
        args.push(current);
    }
    Ok(args)
}
