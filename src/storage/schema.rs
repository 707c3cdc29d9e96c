use std::{collections::HashSet, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::types::{
    INT_WIDTH, VARCHAR_UNIT_WIDTH,
    error::DatabaseError,
    value::DataType,
};

/// Represents a column definition in a table schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    /// Declared character capacity for VARCHAR, 0 for INT
    pub length: usize,
}

impl ColumnSchema {
    pub fn int(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Int,
            length: 0,
        }
    }

    pub fn varchar(name: impl Into<String>, length: usize) -> Self {
        Self {
            name: name.into(),
            data_type: DataType::Varchar,
            length,
        }
    }

    /// Bytes this column occupies in a row slot
    pub fn width(&self) -> usize {
        match self.data_type {
            DataType::Int => INT_WIDTH,
            DataType::Varchar => self.length * VARCHAR_UNIT_WIDTH,
        }
    }

    /// Only INT columns carry an equality index
    pub fn is_indexed(&self) -> bool {
        self.data_type == DataType::Int
    }
}

/// Represents a complete table schema with all column definitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(skip)]
    pub table_name: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    /// Build a schema, rejecting empty column lists, duplicate names and
    /// zero-length VARCHAR columns.
    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnSchema>) -> Result<Self, DatabaseError> {
        let schema = Self {
            table_name: table_name.into(),
            columns,
        };
        schema.validate()?;
        Ok(schema)
    }

    fn validate(&self) -> Result<(), DatabaseError> {
        if self.columns.is_empty() {
            return Err(DatabaseError::InvalidSchema {
                details: format!("table '{}' must have at least one column", self.table_name),
            });
        }

        let mut column_names = HashSet::new();
        for column in &self.columns {
            if !column_names.insert(column.name.as_str()) {
                return Err(DatabaseError::InvalidSchema {
                    details: format!("duplicate column name: {}", column.name),
                });
            }
            if column.data_type == DataType::Varchar && column.length == 0 {
                return Err(DatabaseError::InvalidSchema {
                    details: format!("VARCHAR column '{}' needs a non-zero length", column.name),
                });
            }
        }

        Ok(())
    }

    pub fn row_size(&self) -> usize {
        self.columns.iter().map(ColumnSchema::width).sum()
    }

    /// Get column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|col| col.name == name)
    }

    /// Get column index by name
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col.name == name)
    }

    /// Like `get_column_index`, but an unknown name is an error
    pub fn require_column_index(&self, name: &str) -> Result<usize, DatabaseError> {
        self.get_column_index(name)
            .ok_or_else(|| DatabaseError::UnknownColumn {
                name: name.to_string(),
                table: self.table_name.clone(),
            })
    }

    /// Get all column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|col| col.name.as_str()).collect()
    }

    /// Positions and schemas of every indexed column
    pub fn indexed_columns(&self) -> impl Iterator<Item = (usize, &ColumnSchema)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, col)| col.is_indexed())
    }

    /// Render as the CREATE TABLE statement that would produce this schema
    pub fn to_sql(&self) -> String {
        let column_defs: Vec<String> = self
            .columns
            .iter()
            .map(|col| match col.data_type {
                DataType::Int => format!("{} INT", col.name),
                DataType::Varchar => format!("{} VARCHAR({})", col.name, col.length),
            })
            .collect();
        format!("CREATE TABLE {} ({})", self.table_name, column_defs.join(", "))
    }

    pub fn save(&self, path: &Path) -> Result<(), DatabaseError> {
        let json = serde_json::to_vec(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path, table_name: impl Into<String>) -> Result<Self, DatabaseError> {
        let bytes = fs::read(path)?;
        let mut schema: TableSchema = serde_json::from_slice(&bytes)?;
        schema.table_name = table_name.into();
        schema.validate()?;
        Ok(schema)
    }
}
