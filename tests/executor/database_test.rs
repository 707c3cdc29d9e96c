use std::{fs, sync::Arc, thread};

use lajur::{
    Database, QueryOutput,
    planner::error::PlannerError,
    storage::RowStore,
    types::{error::DatabaseError, row::Row, value::Value},
    utils::mock::TempDatabase,
};

fn row(id: u64, name: &str) -> Row {
    Row::new(vec![Value::Int(id), Value::varchar(name)])
}

fn rows(db: &Database, sql: &str) -> Vec<Row> {
    match db.execute(sql).unwrap() {
        QueryOutput::Rows(rows) => rows,
        QueryOutput::Done => panic!("{} returned no rows", sql),
    }
}

fn setup_people(temp: &TempDatabase) {
    temp.database
        .execute("CREATE TABLE people (id INT, name VARCHAR(5))")
        .unwrap();
}

#[test]
fn test_select_by_key_after_insert() {
    let temp = TempDatabase::with_prefix("scenario_a").unwrap();
    setup_people(&temp);
    let db = &temp.database;

    assert_eq!(db.execute("INSERT INTO people VALUES (1, 'Alice')").unwrap(), QueryOutput::Done);
    db.execute("INSERT INTO people VALUES (2, 'Bob')").unwrap();

    assert_eq!(rows(db, "SELECT * FROM people WHERE id = 1"), vec![row(1, "Alice")]);
}

#[test]
fn test_overlong_value_is_truncated() {
    let temp = TempDatabase::with_prefix("scenario_b").unwrap();
    setup_people(&temp);
    let db = &temp.database;

    db.execute("INSERT INTO people VALUES (3, 'LongerThanFive')").unwrap();

    assert_eq!(rows(db, "SELECT * FROM people WHERE id = 3"), vec![row(3, "Longe")]);
}

#[test]
fn test_delete_keeps_relative_order() {
    let temp = TempDatabase::with_prefix("scenario_c").unwrap();
    setup_people(&temp);
    let db = &temp.database;
    db.execute("INSERT INTO people VALUES (1, 'Alice')").unwrap();
    db.execute("INSERT INTO people VALUES (2, 'Bob')").unwrap();
    db.execute("INSERT INTO people VALUES (3, 'Carol')").unwrap();

    assert_eq!(db.execute("DELETE FROM people WHERE id = 2").unwrap(), QueryOutput::Done);

    assert_eq!(rows(db, "SELECT * FROM people"), vec![row(1, "Alice"), row(3, "Carol")]);
    assert!(rows(db, "SELECT * FROM people WHERE id = 2").is_empty());
    assert_eq!(rows(db, "SELECT * FROM people WHERE id = 3"), vec![row(3, "Carol")]);
}

#[test]
fn test_duplicate_create_fails_and_keeps_data() {
    let temp = TempDatabase::with_prefix("scenario_d").unwrap();
    setup_people(&temp);
    let db = &temp.database;
    db.execute("INSERT INTO people VALUES (1, 'Alice')").unwrap();

    let result = db.execute("CREATE TABLE people (other INT)");
    match result {
        Err(DatabaseError::TableAlreadyExists { name }) => assert_eq!(name, "people"),
        other => panic!("Expected TableAlreadyExists, got {:?}", other),
    }

    assert_eq!(rows(db, "SELECT * FROM people"), vec![row(1, "Alice")]);
    assert_eq!(db.schema("people").unwrap().column_names(), vec!["id", "name"]);
    assert!(!temp.path().join("people_other.idx").exists());
}

#[test]
fn test_projection_and_where_on_varchar() {
    let temp = TempDatabase::new().unwrap();
    setup_people(&temp);
    let db = &temp.database;
    db.execute("INSERT INTO people VALUES (1, 'Alice')").unwrap();
    db.execute("INSERT INTO people VALUES (2, \"Bob\")").unwrap();

    assert_eq!(
        rows(db, "SELECT name FROM people"),
        vec![
            Row::new(vec![Value::varchar("Alice")]),
            Row::new(vec![Value::varchar("Bob")]),
        ]
    );
    assert_eq!(
        rows(db, "SELECT id FROM people WHERE name = 'Bob'"),
        vec![Row::new(vec![Value::Int(2)])]
    );
}

#[test]
fn test_delete_all_rows() {
    let temp = TempDatabase::new().unwrap();
    setup_people(&temp);
    let db = &temp.database;
    db.execute("INSERT INTO people VALUES (1, 'Alice')").unwrap();
    db.execute("INSERT INTO people VALUES (2, 'Bob')").unwrap();

    db.execute("DELETE FROM people").unwrap();

    assert!(rows(db, "SELECT * FROM people").is_empty());
    db.execute("INSERT INTO people VALUES (3, 'Carol')").unwrap();
    assert_eq!(rows(db, "SELECT * FROM people WHERE id = 3"), vec![row(3, "Carol")]);
}

#[test]
fn test_structural_errors() {
    let temp = TempDatabase::new().unwrap();
    setup_people(&temp);
    let db = &temp.database;
    let data_path = temp.path().join("people.dat");

    assert!(matches!(
        db.execute("INSERT INTO people VALUES (1)"),
        Err(DatabaseError::ColumnCountMismatch { .. })
    ));
    assert!(matches!(
        db.execute("INSERT INTO people VALUES ('one', 'Alice')"),
        Err(DatabaseError::TypeMismatch { .. })
    ));
    assert_eq!(fs::metadata(&data_path).unwrap().len(), 0);

    assert!(matches!(
        db.execute("SELECT age FROM people"),
        Err(DatabaseError::UnknownColumn { .. })
    ));
    assert!(matches!(
        db.execute("DELETE FROM people WHERE age = 3"),
        Err(DatabaseError::UnknownColumn { .. })
    ));
    for sql in [
        "INSERT INTO ghosts VALUES (1)",
        "SELECT * FROM ghosts",
        "DELETE FROM ghosts",
    ] {
        assert!(
            matches!(db.execute(sql), Err(DatabaseError::TableNotFound { .. })),
            "{} should fail with TableNotFound",
            sql
        );
    }
}

#[test]
fn test_syntax_errors_create_nothing() {
    let temp = TempDatabase::new().unwrap();
    let db = &temp.database;

    assert!(matches!(
        db.execute("CREATE TABLE broken (id INT, name VARCHAR)"),
        Err(DatabaseError::Planner(PlannerError::MalformedCreateTable(_)))
    ));
    assert!(matches!(
        db.execute("UPSERT INTO t VALUES (1)"),
        Err(DatabaseError::Planner(PlannerError::UnknownStatement(_)))
    ));
    assert!(!db.table_exists("broken"));
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn test_invalid_schema_is_rejected() {
    let temp = TempDatabase::new().unwrap();
    let result = temp.database.execute("CREATE TABLE t (id INT, id INT)");
    assert!(matches!(result, Err(DatabaseError::InvalidSchema { .. })));
    assert!(!temp.database.table_exists("t"));
}

#[test]
fn test_tables_survive_reopen() {
    let temp = TempDatabase::with_prefix("reopen").unwrap();
    setup_people(&temp);
    temp.database.execute("CREATE TABLE courses (id INT, type_id INT)").unwrap();
    temp.database.execute("INSERT INTO people VALUES (1, 'Alice')").unwrap();
    temp.database.execute("INSERT INTO people VALUES (2, 'Bob')").unwrap();

    let temp = temp.reopen().unwrap();
    let db = &temp.database;

    assert_eq!(db.table_names(), vec!["courses".to_string(), "people".to_string()]);
    assert_eq!(rows(db, "SELECT * FROM people WHERE id = 2"), vec![row(2, "Bob")]);
    assert!(matches!(
        db.execute("CREATE TABLE people (id INT)"),
        Err(DatabaseError::TableAlreadyExists { .. })
    ));
}

#[test]
fn test_concurrent_inserts_are_serialized() {
    let temp = TempDatabase::with_prefix("concurrent").unwrap();
    setup_people(&temp);
    let db = Arc::new(temp.database);

    thread::scope(|scope| {
        for worker in 0..4u64 {
            let db = Arc::clone(&db);
            scope.spawn(move || {
                for i in 0..25u64 {
                    let id = worker * 100 + i;
                    db.execute(&format!("INSERT INTO people VALUES ({}, 'w{}')", id, worker))
                        .unwrap();
                }
            });
        }
    });

    let all = rows(&db, "SELECT * FROM people");
    assert_eq!(all.len(), 100);
    for worker in 0..4u64 {
        for i in 0..25u64 {
            let id = worker * 100 + i;
            assert_eq!(
                rows(&db, &format!("SELECT * FROM people WHERE id = {}", id)),
                vec![row(id, &format!("w{}", worker))]
            );
        }
    }

    let table = db.table("people").unwrap();
    let table = table.lock();
    assert_eq!(table.row_count().unwrap(), 100);
    assert_eq!(table.index_file("id").unwrap().entries().unwrap().len(), 100);
}

#[test]
fn test_create_refuses_index_file_of_another_table() {
    let temp = TempDatabase::with_prefix("index_clash").unwrap();
    let db = &temp.database;
    db.execute("CREATE TABLE a (b_c INT)").unwrap();
    db.execute("INSERT INTO a VALUES (7)").unwrap();

    match db.execute("CREATE TABLE a_b (c INT)") {
        Err(DatabaseError::IndexFileConflict { table, column, owner, .. }) => {
            assert_eq!((table.as_str(), column.as_str(), owner.as_str()), ("a_b", "c", "a"));
        }
        other => panic!("Expected IndexFileConflict, got {:?}", other),
    }

    assert!(!db.table_exists("a_b"));
    assert!(!temp.path().join("a_b.schema.json").exists());
    assert_eq!(
        rows(db, "SELECT * FROM a WHERE b_c = 7"),
        vec![Row::new(vec![Value::Int(7)])]
    );

    // Only INT columns own index files, so a VARCHAR column is fine
    db.execute("CREATE TABLE a_b (c VARCHAR(3))").unwrap();
    assert!(db.table_exists("a_b"));
}

#[test]
fn test_unreadable_schema_file_is_skipped_on_open() {
    let temp = TempDatabase::with_prefix("broken_schema").unwrap();
    setup_people(&temp);
    temp.database.execute("CREATE TABLE broken (id INT)").unwrap();
    temp.database.execute("INSERT INTO people VALUES (1, 'Alice')").unwrap();
    fs::write(temp.path().join("broken.schema.json"), "not json").unwrap();

    let temp = temp.reopen().unwrap();
    let db = &temp.database;

    assert_eq!(db.table_names(), vec!["people".to_string()]);
    assert_eq!(rows(db, "SELECT * FROM people WHERE id = 1"), vec![row(1, "Alice")]);
    assert!(matches!(
        db.execute("SELECT * FROM broken"),
        Err(DatabaseError::TableNotFound { .. })
    ));
    // The files still claim the name
    assert!(matches!(
        db.execute("CREATE TABLE broken (id INT)"),
        Err(DatabaseError::TableAlreadyExists { .. })
    ));
}
