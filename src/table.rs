//! In-memory tabular data
//!
//! A `Table` is an ordered set of typed columns, one string index label per row,
//! and one `Value` per cell. It is the shape both datasets take once loaded.

use crate::schema::{ColumnType, Schema};
use serde::Serialize;
use std::fmt;

/// A single typed cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for Value {
    /// Renders the cell the way it is stored in CSV artifacts
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Str(s) => f.write_str(s),
            Value::Int(v) => write!(f, "{v}"),
            // Debug keeps the shortest round-trip form and always shows a fraction
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
        }
    }
}

/// Column label plus declared type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Row-major table with a string index
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    index: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given columns
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            index: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Create an empty table with one column per schema entry
    pub fn from_schema(schema: &Schema) -> Self {
        Self::new(
            schema
                .iter()
                .map(|(name, kind)| Column::new(name, kind))
                .collect(),
        )
    }

    /// Append a row. Missing trailing cells are filled with `Value::Null`.
    pub fn push_row(&mut self, index: impl Into<String>, mut values: Vec<Value>) {
        debug_assert!(
            values.len() <= self.columns.len(),
            "row has {} cells for {} columns",
            values.len(),
            self.columns.len()
        );
        values.resize(self.columns.len(), Value::Null);
        self.index.push(index.into());
        self.rows.push(values);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row(&self, position: usize) -> Option<&[Value]> {
        self.rows.get(position).map(Vec::as_slice)
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Cell at `row` in the column called `column`
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let position = self.column_position(column)?;
        self.rows.get(row)?.get(position)
    }

    /// Return the table with every column label passed through `rename`
    pub fn rename_columns(mut self, rename: impl Fn(&str) -> String) -> Self {
        for column in &mut self.columns {
            column.name = rename(&column.name);
        }
        self
    }

    /// Move the index into a leading string column called `name` and replace it
    /// with a fresh `0..n` range index
    pub fn reset_index(self, name: &str) -> Self {
        let Table {
            columns,
            index,
            rows,
        } = self;

        let mut new_columns = Vec::with_capacity(columns.len() + 1);
        new_columns.push(Column::new(name, ColumnType::Str));
        new_columns.extend(columns);

        let new_rows = index
            .into_iter()
            .zip(rows)
            .map(|(label, row)| {
                let mut new_row = Vec::with_capacity(row.len() + 1);
                new_row.push(Value::Str(label));
                new_row.extend(row);
                new_row
            })
            .collect::<Vec<_>>();

        Self {
            columns: new_columns,
            index: range_index(new_rows.len()),
            rows: new_rows,
        }
    }
}

/// Index labels `"0"`, `"1"`, ... for `len` rows
pub fn range_index(len: usize) -> Vec<String> {
    (0..len).map(|i| i.to_string()).collect()
}
