use thiserror::Error;

use crate::planner::error::PlannerError;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema file error: {0}")]
    Schema(#[from] serde_json::Error),

    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error("Table '{table}' expects {expected} values, got {actual}")]
    ColumnCountMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("Column '{name}' not found in table '{table}'")]
    UnknownColumn { name: String, table: String },

    #[error("Table '{name}' not found")]
    TableNotFound { name: String },

    #[error("Table '{name}' already exists")]
    TableAlreadyExists { name: String },

    #[error("Type mismatch in column '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("Index file '{path}' for column '{column}' of table '{table}' is already used by table '{owner}'")]
    IndexFileConflict {
        path: String,
        table: String,
        column: String,
        owner: String,
    },

    #[error("Invalid schema: {details}")]
    InvalidSchema { details: String },

    #[error("Decode error: {details}")]
    DecodeError { details: String },
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
