use nl2sql::alias::{AliasConflict, AliasEntry, AliasTable};

#[test]
fn test_builtin_reports_duplicate_keys() {
    let conflicts = AliasTable::builtin().conflicts();

    assert!(conflicts.contains(&AliasConflict::DuplicateAlias {
        alias: "students".to_string(),
        overwritten: "student".to_string(),
        kept: "studentss".to_string(),
    }));
}

#[test]
fn test_builtin_reports_ambiguous_reverse_mapping() {
    let conflicts = AliasTable::builtin().conflicts();

    assert!(conflicts.contains(&AliasConflict::AmbiguousCanonical {
        canonical: "employees".to_string(),
        aliases: vec!["emp".to_string(), "employee".to_string(), "staff".to_string()],
    }));
    assert!(conflicts.contains(&AliasConflict::AmbiguousCanonical {
        canonical: "libraries".to_string(),
        aliases: vec!["lib".to_string(), "library".to_string()],
    }));
}

#[test]
fn test_builtin_reports_chains() {
    let conflicts = AliasTable::builtin().conflicts();

    // "pupil" -> "students", and "students" is itself an alias.
    assert!(conflicts.contains(&AliasConflict::Chained {
        alias: "pupil".to_string(),
        canonical: "students".to_string(),
        next: "studentss".to_string(),
    }));
    assert!(conflicts.contains(&AliasConflict::Chained {
        alias: "emp".to_string(),
        canonical: "employees".to_string(),
        next: "employeess".to_string(),
    }));
}

#[test]
fn test_clean_table_has_no_conflicts() {
    let table = AliasTable::from_pairs([("item", "products"), ("purchase", "orders")]);
    assert!(table.conflicts().is_empty());
}

#[test]
fn test_overwrite_keeps_position() {
    let mut table = AliasTable::from_pairs([("a", "x"), ("b", "y")]);
    table.insert("a", "z");

    let entries: Vec<(&str, &str)> = table
        .iter()
        .map(|e| (e.alias.as_str(), e.canonical.as_str()))
        .collect();
    assert_eq!(entries, vec![("a", "z"), ("b", "y")]);
}

#[test]
fn test_collect_from_entries() {
    let table: AliasTable = vec![
        AliasEntry::new("dept", "departments"),
        AliasEntry::new("division", "departments"),
    ]
    .into_iter()
    .collect();

    assert_eq!(table.len(), 2);
    assert_eq!(table.reverse_lookup("departments"), Some("dept"));
    assert_eq!(table.conflicts().len(), 1);
}

#[test]
fn test_conflict_messages_name_the_terms() {
    for conflict in AliasTable::builtin().conflicts() {
        let message = conflict.to_string();
        assert!(!message.is_empty());
        match conflict {
            AliasConflict::DuplicateAlias { alias, .. } => assert!(message.contains(&alias)),
            AliasConflict::AmbiguousCanonical { canonical, .. } => {
                assert!(message.contains(&canonical))
            }
            AliasConflict::Chained { alias, next, .. } => {
                assert!(message.contains(&alias));
                assert!(message.contains(&next));
            }
        }
    }
}
