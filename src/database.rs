use std::{collections::HashMap, fs, sync::Arc};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::{
    config::DatabaseConfig,
    planner::{
        logical_plan::{Literal, LogicalPlan},
        parser::SqlParser,
    },
    storage::{
        RowStore, SCHEMA_FILE_SUFFIX, index_file_path, schema_file_path,
        schema::{ColumnSchema, TableSchema},
        table::TableStore,
    },
    types::{error::DatabaseError, row::Row},
};

/// Shared handle to one table; the mutex serializes every operation on it
pub type TableHandle = Arc<Mutex<TableStore>>;

/// What a statement hands back to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutput {
    /// CREATE TABLE, INSERT and DELETE
    Done,
    /// SELECT results in output order
    Rows(Vec<Row>),
}

impl QueryOutput {
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            QueryOutput::Rows(rows) => rows,
            QueryOutput::Done => Vec::new(),
        }
    }
}

/// A directory of tables plus the statement dispatcher that runs against them.
///
/// `execute` takes `&self`; the table map sits behind a read-write lock and
/// each table behind its own mutex, so a `Database` can be shared between
/// threads and statements on the same table run one at a time.
pub struct Database {
    config: DatabaseConfig,
    parser: SqlParser,
    tables: RwLock<HashMap<String, TableHandle>>,
}

impl Database {
    /// Open the database in `config.dir`, creating the directory if needed and
    /// loading every table whose schema file is found there. A table that
    /// fails to load is logged and left out.
    pub fn open(config: DatabaseConfig) -> Result<Self, DatabaseError> {
        fs::create_dir_all(&config.dir)?;

        let mut tables = HashMap::new();
        for entry in fs::read_dir(&config.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(table_name) = file_name
                .to_str()
                .and_then(|name| name.strip_suffix(SCHEMA_FILE_SUFFIX))
            else {
                continue;
            };
            match TableStore::open(&config, table_name) {
                Ok(store) => {
                    tables.insert(table_name.to_string(), Arc::new(Mutex::new(store)));
                }
                Err(e) => warn!(table = %table_name, error = %e, "skipping table that failed to load"),
            }
        }

        info!(dir = %config.dir.display(), tables = tables.len(), "database opened");
        Ok(Self {
            config,
            parser: SqlParser::new(),
            tables: RwLock::new(tables),
        })
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Parse one statement and run it
    pub fn execute(&self, sql: &str) -> Result<QueryOutput, DatabaseError> {
        let plan = self.parser.parse_sql(sql)?;
        self.run(plan)
    }

    /// Route a parsed statement to the table it names
    pub fn run(&self, plan: LogicalPlan) -> Result<QueryOutput, DatabaseError> {
        debug!(table = plan.table_name(), ?plan, "running statement");
        match plan {
            LogicalPlan::CreateTable(plan) => {
                self.create_table(&plan.table_name, plan.columns)?;
                Ok(QueryOutput::Done)
            }
            LogicalPlan::Insert(plan) => {
                let table = self.table(&plan.table_name)?;
                let mut table = table.lock();
                let values = Literal::to_values(&plan.values, table.schema())?;
                table.insert(values)?;
                Ok(QueryOutput::Done)
            }
            LogicalPlan::Select(plan) => {
                let table = self.table(&plan.table_name)?;
                let rows = table.lock().select(&plan.projection, plan.predicate.as_ref())?;
                Ok(QueryOutput::Rows(rows))
            }
            LogicalPlan::Delete(plan) => {
                let table = self.table(&plan.table_name)?;
                table.lock().delete(plan.predicate.as_ref())?;
                Ok(QueryOutput::Done)
            }
        }
    }

    /// Create a table; an existing name is an error and leaves that table untouched
    pub fn create_table(&self, table_name: &str, columns: Vec<ColumnSchema>) -> Result<TableHandle, DatabaseError> {
        let mut tables = self.tables.write();
        // A schema file on disk also claims the name, even if it failed to load
        if tables.contains_key(table_name) || schema_file_path(&self.config.dir, table_name).exists() {
            return Err(DatabaseError::TableAlreadyExists {
                name: table_name.to_string(),
            });
        }

        let schema = TableSchema::new(table_name, columns)?;
        self.check_index_files(&tables, &schema)?;
        let store = TableStore::create(&self.config, schema)?;
        let handle = Arc::new(Mutex::new(store));
        tables.insert(table_name.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    /// `<table>_<column>.idx` is ambiguous (`a` + `b_c` and `a_b` + `c`), so
    /// refuse a table whose index file would land on another table's
    fn check_index_files(
        &self,
        tables: &HashMap<String, TableHandle>,
        schema: &TableSchema,
    ) -> Result<(), DatabaseError> {
        for (_, column) in schema.indexed_columns() {
            let path = index_file_path(&self.config.dir, &schema.table_name, &column.name);
            let owner = tables
                .iter()
                .find_map(|(name, handle)| {
                    let store = handle.lock();
                    store
                        .schema()
                        .indexed_columns()
                        .any(|(_, other)| index_file_path(&self.config.dir, name, &other.name) == path)
                        .then(|| name.clone())
                })
                // Files of a table that failed to load still count
                .or_else(|| path.exists().then(|| "<unknown>".to_string()));
            if let Some(owner) = owner {
                warn!(table = %schema.table_name, column = %column.name, %owner, "index file name already taken");
                return Err(DatabaseError::IndexFileConflict {
                    path: path.display().to_string(),
                    table: schema.table_name.clone(),
                    column: column.name.clone(),
                    owner,
                });
            }
        }
        Ok(())
    }

    pub fn table(&self, table_name: &str) -> Result<TableHandle, DatabaseError> {
        self.tables
            .read()
            .get(table_name)
            .cloned()
            .ok_or_else(|| DatabaseError::TableNotFound {
                name: table_name.to_string(),
            })
    }

    pub fn table_exists(&self, table_name: &str) -> bool {
        self.tables.read().contains_key(table_name)
    }

    /// Sorted table names
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn schema(&self, table_name: &str) -> Result<TableSchema, DatabaseError> {
        Ok(self.table(table_name)?.lock().schema().clone())
    }
}
