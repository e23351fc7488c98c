use nl2sql::alias::{denormalize_sql, normalize_prompt, AliasTable, MatchMode};

#[test]
fn test_emp_example_normalizes() {
    let table = AliasTable::from_pairs([("emp", "employees")]);
    let prompt = "Get all emp with age > 25".to_lowercase();

    assert_eq!(
        normalize_prompt(&prompt, &table, MatchMode::Substring),
        "get all employees with age > 25"
    );
}

#[test]
fn test_every_alias_is_replaced_by_its_canonical() {
    for entry in AliasTable::builtin().iter() {
        let single = AliasTable::from_pairs([(entry.alias.as_str(), entry.canonical.as_str())]);
        let prompt = format!("show every {} please", entry.alias);

        let out = normalize_prompt(&prompt, &single, MatchMode::Substring);
        assert_eq!(out, format!("show every {} please", entry.canonical));
    }
}

#[test]
fn test_builtin_substring_mode_cascades() {
    // emp -> employees -> employeess (via "employee") -> employeesss (via "employees")
    let out = normalize_prompt(
        "get all emp with age > 25",
        &AliasTable::builtin(),
        MatchMode::Substring,
    );
    assert_eq!(out, "get all employeesss with age > 25");
}

#[test]
fn test_builtin_word_mode_does_not_cascade() {
    let table = AliasTable::builtin();

    assert_eq!(
        normalize_prompt("get all emp with age > 25", &table, MatchMode::WordBoundary),
        "get all employees with age > 25"
    );
    assert_eq!(
        normalize_prompt("every pupil in the library", &table, MatchMode::WordBoundary),
        "every students in the libraries"
    );
    assert_eq!(
        normalize_prompt("temporary items", &table, MatchMode::WordBoundary),
        "temporary items"
    );
}

#[test]
fn test_denormalize_with_builtin_table() {
    let table = AliasTable::builtin();

    assert_eq!(
        denormalize_sql(
            "SELECT * FROM employees WHERE age > 25",
            "get all emp with age > 25",
            &table,
            MatchMode::Substring,
        ),
        "SELECT * FROM emp WHERE age > 25"
    );
    assert_eq!(
        denormalize_sql(
            "SELECT * FROM employees",
            "list staff",
            &table,
            MatchMode::Substring,
        ),
        "SELECT * FROM staff"
    );
}

#[test]
fn test_denormalize_leaves_unrelated_sql_alone() {
    let table = AliasTable::builtin();
    let sql = "SELECT name FROM products WHERE price > 10";

    assert_eq!(
        denormalize_sql(sql, "show everything cheap", &table, MatchMode::Substring),
        sql
    );
    assert_eq!(
        denormalize_sql(sql, "show everything cheap", &table, MatchMode::WordBoundary),
        sql
    );
}

#[test]
fn test_denormalize_substring_hits_longer_words() {
    let table = AliasTable::from_pairs([("emp", "employees")]);

    assert_eq!(
        denormalize_sql(
            "SELECT employees_count FROM stats",
            "emp count",
            &table,
            MatchMode::Substring,
        ),
        "SELECT emp_count FROM stats"
    );
    assert_eq!(
        denormalize_sql(
            "SELECT employees_count FROM stats",
            "emp count",
            &table,
            MatchMode::WordBoundary,
        ),
        "SELECT employees_count FROM stats"
    );
}

#[test]
fn test_denormalize_word_mode_first_alias_wins() {
    let table = AliasTable::builtin();

    assert_eq!(
        denormalize_sql(
            "SELECT * FROM employees",
            "list every employee",
            &table,
            MatchMode::WordBoundary,
        ),
        "SELECT * FROM employee"
    );
    assert_eq!(
        denormalize_sql(
            "SELECT * FROM employees",
            "staff and emp",
            &table,
            MatchMode::WordBoundary,
        ),
        "SELECT * FROM emp"
    );
}

#[test]
fn test_round_trip_for_clean_table() {
    let table = AliasTable::from_pairs([("item", "products"), ("purchase", "orders")]);
    let prompt = "count purchase per item";

    let normalized = normalize_prompt(prompt, &table, MatchMode::Substring);
    assert_eq!(normalized, "count orders per products");

    let sql = "SELECT products, COUNT(*) FROM orders GROUP BY products";
    assert_eq!(
        denormalize_sql(sql, prompt, &table, MatchMode::Substring),
        "SELECT item, COUNT(*) FROM purchase GROUP BY item"
    );
}
