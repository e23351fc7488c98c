//! Line-oriented interactive loop over a [`Session`].

use std::io::{self, BufRead, Write};

use crate::inference::SqlGenerator;

use super::command::{self, Command, HELP};
use super::{Page, Session};

/// Whether the loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Read commands from `input` until `:quit` or end of input.
///
/// Every action's outcome, including errors, is written to `out`; the
/// session stays usable after a failed action.
pub fn run<G, R, W>(session: &mut Session<G>, input: R, out: &mut W) -> io::Result<()>
where
    G: SqlGenerator,
    R: BufRead,
    W: Write,
{
    writeln!(out, "nl2sql interactive session. Type :help for commands.")?;
    write_prompt(session, out)?;

    for line in input.lines() {
        let line = line?;
        if handle_line(session, &line, out)? == Flow::Quit {
            break;
        }
        write_prompt(session, out)?;
    }
    Ok(())
}

fn write_prompt<G: SqlGenerator, W: Write>(session: &Session<G>, out: &mut W) -> io::Result<()> {
    let page = match session.page() {
        Page::Generator => "generator",
        Page::Workbench => "workbench",
    };
    write!(out, "nl2sql[{}]> ", page)?;
    out.flush()
}

/// Execute one input line.
pub fn handle_line<G, W>(session: &mut Session<G>, line: &str, out: &mut W) -> io::Result<Flow>
where
    G: SqlGenerator,
    W: Write,
{
    let command = match command::parse(line) {
        Ok(command) => command,
        Err(e) => {
            writeln!(out, "error: {}", e)?;
            return Ok(Flow::Continue);
        }
    };

    match command {
        Command::Empty => {}
        Command::Quit => return Ok(Flow::Quit),
        Command::Help => writeln!(out, "{}", HELP)?,
        Command::Page(page) => {
            session.switch_page(page);
            writeln!(out, "Now on the {} page.", page)?;
        }
        Command::Create { table, columns } => match session.create_table(&table, columns) {
            Ok(created) => writeln!(out, "Table '{}' created.", created.name())?,
            Err(e) => writeln!(out, "error: {}", e)?,
        },
        Command::Insert(values) => match session.insert_row(&values) {
            Ok(()) => {
                writeln!(out, "Row inserted successfully.")?;
                show_rows(session, out)?;
            }
            Err(e) => writeln!(out, "error: {}", e)?,
        },
        Command::Show => show_rows(session, out)?,
        Command::Status => write_status(session, out)?,
        Command::Aliases => write_aliases(session, out)?,
        Command::Prompt(prompt) => match session.page() {
            Page::Generator => match session.generate(&prompt) {
                Ok(sql) => writeln!(out, "{}", sql)?,
                Err(e) => writeln!(out, "error: {}", e)?,
            },
            Page::Workbench => match session.ask(&prompt) {
                Ok(outcome) => {
                    writeln!(out, "Generated SQL: {}", outcome.translation.sql)?;
                    match outcome.result {
                        Ok(result) => writeln!(out, "{}", result.render())?,
                        Err(e) => writeln!(out, "error executing query: {}", e)?,
                    }
                }
                Err(e) => writeln!(out, "error: {}", e)?,
            },
        },
    }

    Ok(Flow::Continue)
}

fn show_rows<G: SqlGenerator, W: Write>(session: &Session<G>, out: &mut W) -> io::Result<()> {
    match session.current_rows() {
        Ok(result) => writeln!(out, "{}", result.render()),
        Err(e) => writeln!(out, "error: {}", e),
    }
}

fn write_status<G: SqlGenerator, W: Write>(session: &Session<G>, out: &mut W) -> io::Result<()> {
    writeln!(out, "page:  {}", session.page())?;
    match session.table() {
        Some(table) => {
            let cols: Vec<String> = table
                .columns()
                .iter()
                .map(|c| format!("{} {}", c.name, c.data_type))
                .collect();
            writeln!(out, "table: {} ({})", table.name(), cols.join(", "))?;
        }
        None => writeln!(out, "table: (none)")?,
    }
    match session.store().path() {
        Some(path) => writeln!(out, "store: {}", path.display())?,
        None => writeln!(out, "store: (in memory)")?,
    }
    writeln!(out, "model: {}", session.translator().generator().name())?;
    writeln!(out, "alias matching: {}", session.translator().mode())
}

fn write_aliases<G: SqlGenerator, W: Write>(session: &Session<G>, out: &mut W) -> io::Result<()> {
    let aliases = session.translator().aliases();
    for entry in aliases.iter() {
        writeln!(out, "{} -> {}", entry.alias, entry.canonical)?;
    }
    let conflicts = aliases.conflicts();
    if !conflicts.is_empty() {
        writeln!(out, "conflicts:")?;
        for conflict in conflicts {
            writeln!(out, "  {}", conflict)?;
        }
    }
    Ok(())
}
