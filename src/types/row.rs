use tracing::warn;

use crate::{
    storage::schema::TableSchema,
    types::{
        INT_WIDTH, VARCHAR_UNIT_WIDTH,
        error::DatabaseError,
        value::{DataType, Value, fit_varchar},
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn get_value(&self, column_index: usize) -> Option<&Value> {
        self.values.get(column_index)
    }

    /// Keep only the columns at `indices`, in that order
    pub fn project(&self, indices: &[usize]) -> Row {
        Row::new(
            indices
                .iter()
                .filter_map(|&i| self.values.get(i).cloned())
                .collect(),
        )
    }

    /// Encode the row into exactly `schema.row_size()` bytes.
    ///
    /// INT values take 8 little-endian bytes. VARCHAR values take `length`
    /// UTF-16 code units, zero padded; longer strings are silently truncated.
    pub fn to_bytes(&self, schema: &TableSchema) -> Result<Vec<u8>, DatabaseError> {
        if self.values.len() != schema.columns.len() {
            return Err(DatabaseError::ColumnCountMismatch {
                table: schema.table_name.clone(),
                expected: schema.columns.len(),
                actual: self.values.len(),
            });
        }

        let mut buffer = Vec::with_capacity(schema.row_size());
        for (column, value) in schema.columns.iter().zip(&self.values) {
            match (column.data_type, value) {
                (DataType::Int, Value::Int(i)) => {
                    buffer.extend_from_slice(&i.to_le_bytes());
                }
                (DataType::Varchar, Value::Varchar(s)) => {
                    let width = column.length * VARCHAR_UNIT_WIDTH;
                    let start = buffer.len();
                    for unit in fit_varchar(s, column.length).encode_utf16() {
                        buffer.extend_from_slice(&unit.to_le_bytes());
                    }
                    buffer.resize(start + width, 0);
                }
                (expected, value) => {
                    return Err(DatabaseError::TypeMismatch {
                        column: column.name.clone(),
                        expected: expected.to_string(),
                        actual: value.data_type().to_string(),
                    });
                }
            }
        }

        Ok(buffer)
    }

    /// Decode one row slot.
    ///
    /// A VARCHAR field that is not valid UTF-16 decodes as an empty string
    /// and is reported through a warning; only a slot of the wrong size fails.
    pub fn from_bytes(bytes: &[u8], schema: &TableSchema) -> Result<Self, DatabaseError> {
        if bytes.len() != schema.row_size() {
            return Err(DatabaseError::DecodeError {
                details: format!(
                    "row slot for table '{}' is {} bytes, expected {}",
                    schema.table_name,
                    bytes.len(),
                    schema.row_size()
                ),
            });
        }

        let mut cursor = 0;
        let mut values = Vec::with_capacity(schema.columns.len());
        for column in &schema.columns {
            match column.data_type {
                DataType::Int => {
                    let mut raw = [0u8; INT_WIDTH];
                    raw.copy_from_slice(&bytes[cursor..cursor + INT_WIDTH]);
                    values.push(Value::Int(u64::from_le_bytes(raw)));
                    cursor += INT_WIDTH;
                }
                DataType::Varchar => {
                    let width = column.length * VARCHAR_UNIT_WIDTH;
                    let field = &bytes[cursor..cursor + width];
                    values.push(Value::Varchar(Self::decode_varchar(field, &column.name)));
                    cursor += width;
                }
            }
        }

        Ok(Row { values })
    }

    fn decode_varchar(field: &[u8], column_name: &str) -> String {
        let mut units: Vec<u16> = field
            .chunks_exact(VARCHAR_UNIT_WIDTH)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        // Strip padding
        while units.last() == Some(&0) {
            units.pop();
        }

        match String::from_utf16(&units) {
            Ok(s) => s,
            Err(e) => {
                warn!(column = column_name, error = %e, "undecodable VARCHAR value, using empty string");
                String::new()
            }
        }
    }
}
