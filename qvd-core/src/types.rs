//! # Core Types
//!
//! Field kinds and the column-oriented table produced by a decode.
//!
//! A [`Table`] is built once per decode call and handed to the caller; it
//! is never mutated afterwards. All columns share the table's row count.

use std::collections::HashMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::value::{Symbol, Value};

/// Declared value kind of a field, resolved once while parsing the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, Deserialize)]
pub enum FieldKind {
    Integer,
    Real,
    String,
    Dual,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Real => "real",
            FieldKind::String => "string",
            FieldKind::Dual => "dual",
        }
    }

    /// Whether a decoded symbol is consistent with this kind.
    ///
    /// Integers are admitted by real fields; dual symbols are admitted by
    /// the numeric kind of their canonical value.
    pub fn admits(self, symbol: &Symbol) -> bool {
        match (self, symbol) {
            (FieldKind::Integer, Symbol::Integer(_) | Symbol::DualInteger(..)) => true,
            (
                FieldKind::Real,
                Symbol::Integer(_) | Symbol::Real(_) | Symbol::DualInteger(..) | Symbol::DualReal(..),
            ) => true,
            (FieldKind::String, Symbol::Text(_)) => true,
            (FieldKind::Dual, Symbol::DualInteger(..) | Symbol::DualReal(..)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named column holding one value per record
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: FieldKind,
    values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: FieldKind, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of cells holding the empty marker
    pub fn empty_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_empty()).count()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Ordered mapping from column name to column
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    num_rows: usize,
    columns: Vec<Column>,
    index: HashMap<String, usize>,
}

impl Table {
    /// Build a table, checking that every column has `num_rows` values and
    /// that column names are unique.
    pub fn from_columns(num_rows: usize, columns: Vec<Column>) -> Result<Self> {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            if column.len() != num_rows {
                return Err(Error::Internal {
                    message: format!(
                        "column `{}` has {} values, table has {} rows",
                        column.name,
                        column.len(),
                        num_rows
                    ),
                });
            }
            if index.insert(column.name.clone(), i).is_some() {
                return Err(Error::Internal {
                    message: format!("column `{}` appears twice", column.name),
                });
            }
        }

        Ok(Self {
            num_rows,
            columns,
            index,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name())
    }

    /// Values of one record, in column order
    pub fn row(&self, row: usize) -> Option<Vec<&Value>> {
        if row >= self.num_rows {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[row]).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        (0..self.num_rows).map(move |r| self.columns.iter().map(|c| &c.values[r]).collect())
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }
}

impl Serialize for Column {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

/// Serializes as `{ "<column>": [values...], ... }` in column order
impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in &self.columns {
            map.serialize_entry(column.name(), column)?;
        }
        map.end()
    }
}
