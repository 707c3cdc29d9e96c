use std::path::{Path, PathBuf};

use crate::{
    executor::predicate::{Predicate, Projection},
    storage::schema::TableSchema,
    types::{error::DatabaseError, row::Row, value::Value},
};

pub mod index;
pub mod memory;
pub mod schema;
pub mod table;

pub const SCHEMA_FILE_SUFFIX: &str = ".schema.json";
pub const DATA_FILE_SUFFIX: &str = ".dat";
pub const INDEX_FILE_SUFFIX: &str = ".idx";

pub fn schema_file_path(dir: &Path, table_name: &str) -> PathBuf {
    dir.join(format!("{}{}", table_name, SCHEMA_FILE_SUFFIX))
}

pub fn data_file_path(dir: &Path, table_name: &str) -> PathBuf {
    dir.join(format!("{}{}", table_name, DATA_FILE_SUFFIX))
}

pub fn index_file_path(dir: &Path, table_name: &str, column_name: &str) -> PathBuf {
    dir.join(format!("{}_{}{}", table_name, column_name, INDEX_FILE_SUFFIX))
}

/// Operations every table backend supports
pub trait RowStore {
    fn schema(&self) -> &TableSchema;

    /// Append one row; `values` must line up with the schema's columns
    fn insert(&mut self, values: Vec<Value>) -> Result<(), DatabaseError>;

    /// Matching rows, shaped by `projection`
    fn select(
        &self,
        projection: &Projection,
        predicate: Option<&Predicate>,
    ) -> Result<Vec<Row>, DatabaseError>;

    /// Remove matching rows (all rows without a predicate), returning how many went
    fn delete(&mut self, predicate: Option<&Predicate>) -> Result<usize, DatabaseError>;

    fn row_count(&self) -> Result<usize, DatabaseError>;
}
