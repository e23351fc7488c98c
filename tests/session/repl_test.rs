use std::io::Cursor;

use nl2sql::alias::{AliasTable, MatchMode};
use nl2sql::inference::{GenerationResult, SqlGenerator};
use nl2sql::session::repl::{self, Flow};
use nl2sql::session::{Page, Session, Translator};
use nl2sql::store::Store;

/// Always answers with the same SQL.
struct Fixed(&'static str);

impl SqlGenerator for Fixed {
    fn generate(&mut self, _text: &str) -> GenerationResult<String> {
        Ok(self.0.to_string())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

fn session(sql: &'static str) -> Session<Fixed> {
    let aliases = AliasTable::from_pairs([("emp", "employees")]);
    let translator = Translator::new(Fixed(sql), aliases, MatchMode::Substring);
    Session::new(Store::open_in_memory().unwrap(), translator)
}

fn run_script(session: &mut Session<Fixed>, script: &str) -> String {
    let mut out = Vec::new();
    repl::run(session, Cursor::new(script), &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_workbench_round_trip() {
    let mut session = session("SELECT * FROM employees WHERE age > 25");
    let out = run_script(
        &mut session,
        ":page workbench\n\
         :create emp name:TEXT age:INTEGER\n\
         :insert Ann 31\n\
         :insert \"Bo Li\" 22\n\
         get all emp with age > 25\n\
         :quit\n",
    );

    assert!(out.starts_with("nl2sql interactive session. Type :help for commands."));
    assert!(out.contains("Now on the SQL Workbench page."));
    assert!(out.contains("Table 'emp' created."));
    assert!(out.contains("Row inserted successfully."));
    assert!(out.contains("Bo Li | 22"));
    assert!(out.contains("Generated SQL: SELECT * FROM emp WHERE age > 25"));
    assert!(out.trim_end().ends_with("(1 row)\nnl2sql[workbench]>"));
    assert_eq!(session.page(), Page::Workbench);
}

#[test]
fn test_generator_page_prints_sql_only() {
    let mut session = session("SELECT * FROM employees");
    let out = run_script(&mut session, "list all emp\n");

    assert!(out.contains("nl2sql[generator]> SELECT * FROM employees\n"));
    assert!(!out.contains("Generated SQL"));
}

#[test]
fn test_errors_are_reported_and_loop_continues() {
    let mut session = session("SELECT 1");
    let out = run_script(
        &mut session,
        ":bogus\n\
         :page workbench\n\
         count things\n\
         :create t\n\
         :create t a:BLOB\n\
         :insert \"unterminated\n\
         :status\n",
    );

    assert!(out.contains("error: unknown command ':bogus' (try :help)"));
    assert!(out.contains("error: Create a table first"));
    assert!(out.contains("error: A table needs between 1 and 10 columns, got 0"));
    assert!(out.contains("error: Unknown column type 'BLOB'"));
    assert!(out.contains("error: unterminated quote"));
    assert!(out.contains("table: (none)"));
    assert!(out.contains("store: (in memory)"));
    assert!(out.contains("model: fixed"));
}

#[test]
fn test_execution_error_keeps_generated_sql() {
    let mut session = session("SELECT * FROM missing");
    let out = run_script(
        &mut session,
        ":page wb\n:create emp name:TEXT\nshow missing\n",
    );

    assert!(out.contains("Generated SQL: SELECT * FROM missing"));
    assert!(out.contains("error executing query: SQLite error: no such table: missing"));
}

#[test]
fn test_quit_stops_reading() {
    let mut session = session("SELECT 1");
    let out = run_script(&mut session, ":quit\n:page workbench\n");

    assert_eq!(session.page(), Page::Generator);
    assert!(!out.contains("Now on"));
}

#[test]
fn test_handle_line_flow() {
    let mut session = session("SELECT 1");
    let mut out = Vec::new();

    assert_eq!(
        repl::handle_line(&mut session, "", &mut out).unwrap(),
        Flow::Continue
    );
    assert_eq!(
        repl::handle_line(&mut session, ":help", &mut out).unwrap(),
        Flow::Continue
    );
    assert_eq!(
        repl::handle_line(&mut session, ":q", &mut out).unwrap(),
        Flow::Quit
    );

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains(":create <table>"));
}

#[test]
fn test_aliases_command_lists_entries() {
    let mut session = session("SELECT 1");
    let out = run_script(&mut session, ":aliases\n");

    assert!(out.contains("emp -> employees"));
    assert!(!out.contains("conflicts:"));
}
