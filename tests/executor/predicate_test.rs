use lajur::{
    executor::predicate::{Predicate, Projection},
    planner::logical_plan::Literal,
    storage::schema::{ColumnSchema, TableSchema},
    types::{error::DatabaseError, row::Row, value::Value},
};

fn schema() -> TableSchema {
    TableSchema::new(
        "t",
        vec![
            ColumnSchema::int("id"),
            ColumnSchema::varchar("name", 5),
            ColumnSchema::varchar("code", 3),
        ],
    )
    .unwrap()
}

#[test]
fn test_projection_resolution() {
    let schema = schema();
    assert_eq!(Projection::All.resolve(&schema).unwrap(), vec![0, 1, 2]);
    assert_eq!(
        Projection::columns(["code", "id"]).resolve(&schema).unwrap(),
        vec![2, 0]
    );
    assert!(matches!(
        Projection::columns(["id", "nope"]).resolve(&schema),
        Err(DatabaseError::UnknownColumn { .. })
    ));
}

#[test]
fn test_bind_marks_indexed_columns() {
    let schema = schema();

    let on_id = Predicate::eq("id", 5u64).bind(&schema).unwrap();
    assert_eq!(on_id.column_index, 0);
    assert_eq!(on_id.index_key(), Some(5));

    let on_name = Predicate::eq("name", "Bob").bind(&schema).unwrap();
    assert_eq!(on_name.value, Value::varchar("Bob"));
    assert_eq!(on_name.index_key(), None);
}

#[test]
fn test_number_literal_on_varchar_column_is_text() {
    let bound = Predicate::eq("code", 7u64).bind(&schema()).unwrap();
    assert_eq!(bound.value, Value::varchar("7"));
    assert!(bound.matches(&Row::new(vec![
        Value::Int(1),
        Value::varchar("x"),
        Value::varchar("7"),
    ])));
}

#[test]
fn test_matches_compares_stored_value_exactly() {
    let bound = Predicate::eq("name", "LongerThanFive").bind(&schema()).unwrap();
    let stored = Row::new(vec![Value::Int(1), Value::varchar("Longe"), Value::varchar("")]);
    assert!(!bound.matches(&stored));
}

#[test]
fn test_literal_casts() {
    let id = ColumnSchema::int("id");
    assert_eq!(Literal::from(9u64).to_value(&id).unwrap(), Value::Int(9));
    assert_eq!(Literal::from("9").to_value(&id).unwrap(), Value::Int(9));
    assert!(matches!(
        Literal::from("-1").to_value(&id),
        Err(DatabaseError::TypeMismatch { .. })
    ));
    assert!(matches!(
        Literal::Number("1.5".to_string()).to_value(&id),
        Err(DatabaseError::TypeMismatch { .. })
    ));
}

#[test]
fn test_literal_list_count_is_checked_first() {
    let schema = schema();
    let result = Literal::to_values(&[Literal::from("oops")], &schema);
    assert!(matches!(result, Err(DatabaseError::ColumnCountMismatch { .. })));

    let values = Literal::to_values(
        &[Literal::from(1u64), Literal::from("Al"), Literal::from(42u64)],
        &schema,
    )
    .unwrap();
    assert_eq!(values, vec![Value::Int(1), Value::varchar("Al"), Value::varchar("42")]);
}
