use std::cell::RefCell;
use std::rc::Rc;

use nl2sql::alias::{AliasTable, MatchMode};
use nl2sql::inference::{GenerationError, GenerationResult, SqlGenerator};
use nl2sql::session::{Page, Session, SessionError, Translator};
use nl2sql::store::{ColumnDef, ColumnType, Store, StoreError, ValidationError};
use rusqlite::types::Value;

type Reply = Box<dyn FnMut(&str) -> GenerationResult<String>>;

/// Records every text it receives and answers through `reply`.
struct ScriptedGenerator {
    seen: Rc<RefCell<Vec<String>>>,
    reply: Reply,
}

impl SqlGenerator for ScriptedGenerator {
    fn generate(&mut self, text: &str) -> GenerationResult<String> {
        self.seen.borrow_mut().push(text.to_string());
        (self.reply)(text)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn session_with(
    aliases: AliasTable,
    reply: impl FnMut(&str) -> GenerationResult<String> + 'static,
) -> (Session<ScriptedGenerator>, Rc<RefCell<Vec<String>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let generator = ScriptedGenerator {
        seen: seen.clone(),
        reply: Box::new(reply),
    };
    let translator = Translator::new(generator, aliases, MatchMode::Substring);
    let session = Session::new(Store::open_in_memory().unwrap(), translator);
    (session, seen)
}

fn emp_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("name", ColumnType::Text),
        ColumnDef::new("age", ColumnType::Integer),
    ]
}

/// A workbench session with table `emp` holding two rows.
fn seeded_workbench(
    reply: impl FnMut(&str) -> GenerationResult<String> + 'static,
) -> (Session<ScriptedGenerator>, Rc<RefCell<Vec<String>>>) {
    let aliases = AliasTable::from_pairs([("emp", "employees")]);
    let (mut session, seen) = session_with(aliases, reply);
    session.switch_page(Page::Workbench);
    session.create_table("emp", emp_columns()).unwrap();
    session.insert_row(&["Ann", "31"]).unwrap();
    session.insert_row(&["Bo", "22"]).unwrap();
    (session, seen)
}

#[test]
fn test_new_session_starts_on_generator_without_table() {
    let (session, _) = session_with(AliasTable::new(), |_| Ok(String::new()));
    assert_eq!(session.page(), Page::Generator);
    assert!(session.table().is_none());
}

#[test]
fn test_generate_sends_raw_prompt() {
    let aliases = AliasTable::from_pairs([("emp", "employees")]);
    let (mut session, seen) =
        session_with(aliases, |_| Ok("SELECT * FROM employees".to_string()));

    let sql = session.generate("Show all EMP").unwrap();

    assert_eq!(sql, "SELECT * FROM employees");
    assert_eq!(*seen.borrow(), vec!["Show all EMP".to_string()]);
}

#[test]
fn test_empty_prompt_never_reaches_the_model() {
    let (mut session, seen) = seeded_workbench(|_| Ok("SELECT 1".to_string()));

    assert!(matches!(session.ask("   "), Err(SessionError::EmptyPrompt)));
    session.switch_page(Page::Generator);
    assert!(matches!(session.generate(""), Err(SessionError::EmptyPrompt)));
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_page_gating() {
    let (mut session, _) = session_with(AliasTable::new(), |_| Ok("SELECT 1".to_string()));

    let err = session.create_table("t", emp_columns()).unwrap_err();
    assert!(matches!(
        err,
        SessionError::WrongPage {
            expected: Page::Workbench,
            current: Page::Generator,
            ..
        }
    ));
    assert!(matches!(
        session.ask("anything"),
        Err(SessionError::WrongPage { .. })
    ));

    session.switch_page(Page::Workbench);
    assert!(matches!(
        session.generate("anything"),
        Err(SessionError::WrongPage {
            expected: Page::Generator,
            ..
        })
    ));
}

#[test]
fn test_workbench_actions_need_a_table() {
    let (mut session, seen) = session_with(AliasTable::new(), |_| Ok("SELECT 1".to_string()));
    session.switch_page(Page::Workbench);

    assert!(matches!(session.insert_row(&["x"]), Err(SessionError::NoTable)));
    assert!(matches!(session.current_rows(), Err(SessionError::NoTable)));
    assert!(matches!(session.ask("count rows"), Err(SessionError::NoTable)));
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_invalid_table_leaves_session_without_table() {
    let (mut session, _) = session_with(AliasTable::new(), |_| Ok(String::new()));
    session.switch_page(Page::Workbench);

    let err = session.create_table("", emp_columns()).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::EmptyTableName)
    ));
    assert!(session.table().is_none());

    let err = session.create_table("t", Vec::<ColumnDef>::new()).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::ColumnCount { got: 0, .. })
    ));
    assert!(session.table().is_none());
}

#[test]
fn test_insert_shows_in_current_rows() {
    let (session, _) = seeded_workbench(|_| Ok(String::new()));

    let rows = session.current_rows().unwrap();
    assert_eq!(rows.columns, vec!["name", "age"]);
    assert_eq!(rows.row_count(), 2);
    assert_eq!(rows.get(1, "name"), Some(&Value::Text("Bo".to_string())));
}

#[test]
fn test_insert_arity_mismatch() {
    let (mut session, _) = seeded_workbench(|_| Ok(String::new()));

    let err = session.insert_row(&["Cy"]).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::Arity { expected: 2, got: 1 })
    ));
    assert_eq!(session.current_rows().unwrap().row_count(), 2);
}

#[test]
fn test_ask_normalizes_then_denormalizes() {
    let (mut session, seen) = seeded_workbench(|text| {
        assert_eq!(text, "get all employees with age > 25");
        Ok("SELECT * FROM employees WHERE age > 25".to_string())
    });

    let outcome = session.ask("Get all EMP with age > 25").unwrap();

    assert_eq!(*seen.borrow(), vec!["get all employees with age > 25".to_string()]);
    assert_eq!(outcome.translation.prompt, "get all emp with age > 25");
    assert_eq!(
        outcome.translation.generated,
        "SELECT * FROM employees WHERE age > 25"
    );
    assert_eq!(outcome.translation.sql, "SELECT * FROM emp WHERE age > 25");

    let result = outcome.result.unwrap();
    assert_eq!(
        result.rows,
        vec![vec![Value::Text("Ann".to_string()), Value::Integer(31)]]
    );
}

#[test]
fn test_execution_error_is_reported_with_sql() {
    let (mut session, _) = seeded_workbench(|_| Ok("SELECT * FROM payroll".to_string()));

    let outcome = session.ask("show payroll").unwrap();

    assert_eq!(outcome.translation.sql, "SELECT * FROM payroll");
    let err = outcome.result.unwrap_err();
    assert!(matches!(err, StoreError::Sqlite(_)));
    assert!(err.to_string().contains("no such table"));
}

#[test]
fn test_generation_error_aborts_ask() {
    let (mut session, _) = seeded_workbench(|_| {
        Err(GenerationError::Other("model weights are corrupt".to_string()))
    });

    let err = session.ask("list everyone").unwrap_err();
    assert!(matches!(err, SessionError::Generation(_)));
    assert_eq!(
        err.to_string(),
        "Model generation error: model weights are corrupt"
    );
}

#[test]
fn test_session_usable_after_errors() {
    let mut calls = 0;
    let (mut session, _) = seeded_workbench(move |_| {
        calls += 1;
        if calls == 1 {
            Ok("DROP TABLE nothing_here".to_string())
        } else {
            Ok("SELECT COUNT(*) AS n FROM emp".to_string())
        }
    });

    assert!(session.ask("remove stuff").unwrap().result.is_err());
    assert!(session.insert_row(&["too", "many", "values"]).is_err());

    let result = session.ask("how many emp").unwrap().result.unwrap();
    assert_eq!(result.get(0, "n"), Some(&Value::Integer(2)));
}

#[test]
fn test_recreate_replaces_active_table() {
    let (mut session, _) = seeded_workbench(|_| Ok(String::new()));

    let created = session
        .create_table("projects", [ColumnDef::new("title", ColumnType::Text)])
        .unwrap();
    assert_eq!(created.name(), "projects");

    session.insert_row(&["Apollo"]).unwrap();
    let rows = session.current_rows().unwrap();
    assert_eq!(rows.columns, vec!["title"]);
    assert_eq!(rows.row_count(), 1);

    // The old table still exists in the store.
    let old = session.store().execute("SELECT COUNT(*) AS n FROM emp").unwrap();
    assert_eq!(old.get(0, "n"), Some(&Value::Integer(2)));
}

#[test]
fn test_duplicate_table_keeps_previous_table_active() {
    let (mut session, _) = seeded_workbench(|_| Ok(String::new()));

    let err = session.create_table("emp", emp_columns()).unwrap_err();
    assert!(matches!(err, SessionError::Store(StoreError::Sqlite(_))));
    assert_eq!(session.table().map(|t| t.name()), Some("emp"));
    assert_eq!(session.current_rows().unwrap().row_count(), 2);
}
