// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Cell values and rows produced by system table scans

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column data type, as reported in table metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Varchar,
    BigInt,
    Timestamp,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Varchar => write!(f, "VARCHAR"),
            ColumnType::BigInt => write!(f, "BIGINT"),
            ColumnType::Timestamp => write!(f, "TIMESTAMP"),
        }
    }
}

/// One cell of a system table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Text(String),
    Integer(i64),
    Timestamp(DateTime<Utc>),
    /// The cell could not be rendered; the rest of the row is still valid
    Error(String),
    Null,
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn optional_text(value: Option<impl Into<String>>) -> Self {
        value.map_or(Value::Null, |v| Value::Text(v.into()))
    }

    /// Extract as string if possible
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Extract as integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Value::Error(e) => write!(f, "<error: {}>", e),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

/// Positional row; values line up with the table's columns
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Get a value by position
    pub fn get(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether any cell failed to render
    pub fn has_errors(&self) -> bool {
        self.values.iter().any(Value::is_error)
    }
}

/// Result of scanning one system table
///
/// All rows come from a single registry snapshot, identified by
/// `snapshot_version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableScan {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub snapshot_version: u64,
}

impl TableScan {
    /// Position of `column`, if the table has it
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Value of `column` in every row, in row order
    pub fn column_values(&self, column: &str) -> Vec<&Value> {
        match self.column_index(column) {
            Some(index) => self.rows.iter().filter_map(|r| r.get(index)).collect(),
            None => Vec::new(),
        }
    }

    /// First row whose first column equals `key`
    pub fn find_row(&self, key: &str) -> Option<&Row> {
        self.rows
            .iter()
            .find(|r| r.get(0).and_then(Value::as_text) == Some(key))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
