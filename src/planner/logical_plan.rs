use crate::{
    executor::predicate::{Predicate, Projection},
    storage::schema::{ColumnSchema, TableSchema},
    types::{
        error::DatabaseError,
        value::{DataType, Value},
    },
};

/// A parsed statement, ready to run against a `Database`
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    CreateTable(CreateTablePlan),
    Insert(InsertPlan),
    Select(SelectPlan),
    Delete(DeletePlan),
}

impl LogicalPlan {
    pub fn table_name(&self) -> &str {
        match self {
            LogicalPlan::CreateTable(plan) => &plan.table_name,
            LogicalPlan::Insert(plan) => &plan.table_name,
            LogicalPlan::Select(plan) => &plan.table_name,
            LogicalPlan::Delete(plan) => &plan.table_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTablePlan {
    pub table_name: String,
    pub columns: Vec<ColumnSchema>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertPlan {
    pub table_name: String,
    pub values: Vec<Literal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectPlan {
    pub table_name: String,
    pub projection: Projection,
    pub predicate: Option<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeletePlan {
    pub table_name: String,
    pub predicate: Option<Predicate>,
}

/// An untyped constant from the query text.
///
/// Literals only get a type once they meet a column: `'7'` is a valid INT and
/// `42` is a valid VARCHAR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Number(String),
    Text(String),
}

impl Literal {
    pub fn as_str(&self) -> &str {
        match self {
            Literal::Number(s) | Literal::Text(s) => s,
        }
    }

    /// Cast to the column's declared type
    pub fn to_value(&self, column: &ColumnSchema) -> Result<Value, DatabaseError> {
        match column.data_type {
            DataType::Int => self
                .as_str()
                .parse::<u64>()
                .map(Value::Int)
                .map_err(|_| DatabaseError::TypeMismatch {
                    column: column.name.clone(),
                    expected: DataType::Int.to_string(),
                    actual: format!("{:?}", self.as_str()),
                }),
            DataType::Varchar => Ok(Value::Varchar(self.as_str().to_string())),
        }
    }

    /// Cast a full VALUES list against a schema, checking the count first
    pub fn to_values(literals: &[Literal], schema: &TableSchema) -> Result<Vec<Value>, DatabaseError> {
        if literals.len() != schema.columns.len() {
            return Err(DatabaseError::ColumnCountMismatch {
                table: schema.table_name.clone(),
                expected: schema.columns.len(),
                actual: literals.len(),
            });
        }
        schema
            .columns
            .iter()
            .zip(literals)
            .map(|(column, literal)| literal.to_value(column))
            .collect()
    }
}

impl From<u64> for Literal {
    fn from(value: u64) -> Self {
        Literal::Number(value.to_string())
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Text(value)
    }
}
