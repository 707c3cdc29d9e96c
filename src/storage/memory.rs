use crate::{
    executor::predicate::{Predicate, Projection},
    storage::{RowStore, schema::TableSchema},
    types::{
        error::DatabaseError,
        row::Row,
        value::{Value, fit_varchar},
    },
};

/// In-memory table with the same semantics as the file-backed store.
///
/// VARCHAR values are truncated on insert exactly as the row codec would, so
/// results match `TableStore` row for row.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    schema: TableSchema,
    rows: Vec<Row>,
}

impl MemoryTable {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }
}

impl RowStore for MemoryTable {
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn insert(&mut self, values: Vec<Value>) -> Result<(), DatabaseError> {
        // Same count and type checks as the codec
        Row::new(values.clone()).to_bytes(&self.schema)?;

        let values = self
            .schema
            .columns
            .iter()
            .zip(values)
            .map(|(column, value)| match value {
                Value::Varchar(s) => Value::Varchar(fit_varchar(&s, column.length).to_string()),
                other => other,
            })
            .collect();
        self.rows.push(Row::new(values));
        Ok(())
    }

    fn select(
        &self,
        projection: &Projection,
        predicate: Option<&Predicate>,
    ) -> Result<Vec<Row>, DatabaseError> {
        let indices = projection.resolve(&self.schema)?;
        let bound = predicate.map(|p| p.bind(&self.schema)).transpose()?;
        Ok(self
            .rows
            .iter()
            .filter(|row| bound.as_ref().is_none_or(|p| p.matches(row)))
            .map(|row| row.project(&indices))
            .collect())
    }

    fn delete(&mut self, predicate: Option<&Predicate>) -> Result<usize, DatabaseError> {
        let before = self.rows.len();
        match predicate {
            Some(predicate) => {
                let bound = predicate.bind(&self.schema)?;
                self.rows.retain(|row| !bound.matches(row));
            }
            None => self.rows.clear(),
        }
        Ok(before - self.rows.len())
    }

    fn row_count(&self) -> Result<usize, DatabaseError> {
        Ok(self.rows.len())
    }
}
