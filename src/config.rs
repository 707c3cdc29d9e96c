use std::path::PathBuf;

/// Where a database keeps its files and how hard it tries to persist them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Directory holding every table's schema, data and index files
    pub dir: PathBuf,
    /// `sync_data()` every file after it is written
    pub sync_writes: bool,
}

impl DatabaseConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sync_writes: false,
        }
    }

    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
