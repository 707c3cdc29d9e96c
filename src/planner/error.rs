#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("Unknown statement: {0}")]
    UnknownStatement(String),
    #[error("Malformed CREATE TABLE: {0}")]
    MalformedCreateTable(String),
    #[error("Malformed INSERT: {0}")]
    MalformedInsert(String),
    #[error("Malformed SELECT: {0}")]
    MalformedSelect(String),
    #[error("Malformed DELETE: {0}")]
    MalformedDelete(String),
}
