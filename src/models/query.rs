//! Query-related data models.
//!
//! This module defines the scalar value type produced by the driver and the
//! row/result types built from it.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A single column value read from the driver.
///
/// Closed set of scalar kinds; anything else the driver produces (dates,
/// decimals, GUIDs, binary) is carried as `String`.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl ScalarValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the type name of this value for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Boolean(_) => "boolean",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Float(_))
    }
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::String(s) => serializer.serialize_str(s),
            Self::Integer(i) => serializer.serialize_i64(*i),
            // NaN and infinities have no JSON form
            Self::Float(f) if !f.is_finite() => serializer.serialize_str(&f.to_string()),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::String(s) => write!(f, "{}", s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

/// One result row: column name to value.
pub type ResultRow = BTreeMap<String, ScalarValue>;

/// Build a row from column names and decoded values.
///
/// A column name appearing twice keeps the later value.
pub fn build_row<I>(pairs: I) -> ResultRow
where
    I: IntoIterator<Item = (String, ScalarValue)>,
{
    let mut row = ResultRow::new();
    for (name, value) in pairs {
        row.insert(name, value);
    }
    row
}

/// Fully materialized result of a read statement.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    /// Column names in cursor order (duplicates preserved).
    pub columns: Vec<String>,
    pub rows: Vec<ResultRow>,
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Get the number of rows in the result.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecuteResult {
    /// Zero when the driver does not report a count.
    pub rows_affected: u64,
    pub execution_time_ms: u64,
}
