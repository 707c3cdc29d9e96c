use std::path::Path;

use tempfile::TempDir;

use crate::{config::DatabaseConfig, database::Database, types::error::DatabaseError};

/// A database living in its own temporary directory, removed on drop
pub struct TempDatabase {
    pub dir: TempDir,
    pub database: Database,
}

impl TempDatabase {
    pub fn new() -> Result<Self, DatabaseError> {
        Self::with_prefix("lajur_test")
    }

    pub fn with_prefix(prefix: &str) -> Result<Self, DatabaseError> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        let database = Database::open(DatabaseConfig::new(dir.path()))?;
        Ok(Self { dir, database })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.dir.path())
    }

    /// Drop the open database and open the same directory again
    pub fn reopen(self) -> Result<Self, DatabaseError> {
        let Self { dir, database } = self;
        drop(database);
        let database = Database::open(DatabaseConfig::new(dir.path()))?;
        Ok(Self { dir, database })
    }
}
