use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "INT")]
    Int,
    #[serde(rename = "VARCHAR")]
    Varchar,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "INT"),
            DataType::Varchar => write!(f, "VARCHAR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Int(u64),
    Varchar(String),
}

impl Value {
    pub fn varchar(s: impl Into<String>) -> Self {
        Value::Varchar(s.into())
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Varchar(_) => DataType::Varchar,
        }
    }

    pub fn as_int(&self) -> Option<u64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Varchar(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Varchar(s) => Some(s),
            Value::Int(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Varchar(s) => write!(f, "'{}'", s),
        }
    }
}

/// Longest prefix of `s` that fits in `length` UTF-16 code units.
///
/// A character needing a surrogate pair is dropped whole when only one unit
/// is left.
pub fn fit_varchar(s: &str, length: usize) -> &str {
    let mut units = 0;
    for (byte_index, ch) in s.char_indices() {
        units += ch.len_utf16();
        if units > length {
            return &s[..byte_index];
        }
    }
    s
}
