use crate::{
    planner::logical_plan::Literal,
    storage::schema::TableSchema,
    types::{error::DatabaseError, row::Row, value::Value},
};

/// Which columns a SELECT returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    All,
    Columns(Vec<String>),
}

impl Projection {
    pub fn columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Columns(names.into_iter().map(Into::into).collect())
    }

    /// Column positions to emit, in output order
    pub fn resolve(&self, schema: &TableSchema) -> Result<Vec<usize>, DatabaseError> {
        match self {
            Projection::All => Ok((0..schema.columns.len()).collect()),
            Projection::Columns(names) => names
                .iter()
                .map(|name| schema.require_column_index(name))
                .collect(),
        }
    }
}

/// Single equality test `column = value`, the only predicate the engine knows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub column_name: String,
    pub value: Literal,
}

impl Predicate {
    /// Create an equality predicate
    pub fn eq(column_name: impl Into<String>, value: impl Into<Literal>) -> Self {
        Self {
            column_name: column_name.into(),
            value: value.into(),
        }
    }

    /// Resolve the column and cast the literal to its type
    pub fn bind(&self, schema: &TableSchema) -> Result<BoundPredicate, DatabaseError> {
        let column_index = schema.require_column_index(&self.column_name)?;
        let value = self.value.to_value(&schema.columns[column_index])?;
        Ok(BoundPredicate {
            column_index,
            value,
            indexed: schema.columns[column_index].is_indexed(),
        })
    }
}

/// A predicate checked against a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundPredicate {
    pub column_index: usize,
    pub value: Value,
    /// Whether the column has an equality index
    pub indexed: bool,
}

impl BoundPredicate {
    pub fn matches(&self, row: &Row) -> bool {
        row.get_value(self.column_index) == Some(&self.value)
    }

    /// Key to probe the index with, if the column is indexed
    pub fn index_key(&self) -> Option<u64> {
        if self.indexed { self.value.as_int() } else { None }
    }
}
