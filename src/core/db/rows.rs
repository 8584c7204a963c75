/// Row and Outcome Module
///
/// Row containers handed back to callers, and the buffered outcome of one
/// statement that can be read row by row.

use super::flags::SqlFailure;
use super::mode::RowShape;
use super::value::Value;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

/// A row addressed by column name.
///
/// Column order is preserved. When a result carries the same column name
/// twice, the name keeps its first position and takes the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssocRow {
    entries: Vec<(String, Value)>,
}

impl AssocRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: &[String], values: Vec<Value>) -> Self {
        let mut row = AssocRow::new();
        for (name, value) in columns.iter().zip(values) {
            row.insert(name.clone(), value);
        }
        row
    }

    pub fn insert(&mut self, name: String, value: Value) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl Serialize for AssocRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Rows keyed by the rendered value of one of their columns.
///
/// Keys keep the order in which they were first seen. Inserting a row under
/// an existing key replaces the earlier row in place; no uniqueness check is
/// made.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedRows<R> {
    entries: Vec<(String, R)>,
    index: HashMap<String, usize>,
}

impl<R> Default for KeyedRows<R> {
    fn default() -> Self {
        KeyedRows {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<R> KeyedRows<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row, returning the row it replaced.
    pub fn insert(&mut self, key: String, row: R) -> Option<R> {
        match self.index.get(&key) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, row)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, row));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&R> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &R)> {
        self.entries.iter().map(|(k, r)| (k.as_str(), r))
    }

    pub fn into_values(self) -> impl Iterator<Item = R> {
        self.entries.into_iter().map(|(_, r)| r)
    }
}

impl<R: Serialize> Serialize for KeyedRows<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, row) in &self.entries {
            map.serialize_entry(key, row)?;
        }
        map.end()
    }
}

/// A row pulled from an outcome by `QueryOutcome::next_row`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FetchedRow {
    Positional(Vec<Value>),
    Assoc(AssocRow),
}

/// The buffered outcome of one executed statement.
///
/// Rows are fetched from the backend before the outcome is handed out, so
/// reading it never touches the connection again. An outcome produced for a
/// suppressed error has no rows and remembers the error it stands in for.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
    num_rows: usize,
    affected_rows: usize,
    ignored_error: Option<SqlFailure>,
}

impl QueryOutcome {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Vec<Value>>, affected_rows: usize) -> Self {
        QueryOutcome {
            columns,
            num_rows: rows.len(),
            rows: rows.into(),
            affected_rows,
            ignored_error: None,
        }
    }

    pub(crate) fn ignored(failure: SqlFailure) -> Self {
        QueryOutcome {
            columns: Vec::new(),
            rows: VecDeque::new(),
            num_rows: 0,
            affected_rows: 0,
            ignored_error: Some(failure),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows the statement produced, read or not.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Rows not yet pulled from the outcome.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    /// Rows changed by an INSERT, UPDATE or DELETE.
    pub fn affected_rows(&self) -> usize {
        self.affected_rows
    }

    /// The suppressed error this outcome stands in for, if any.
    pub fn ignored_error(&self) -> Option<&SqlFailure> {
        self.ignored_error.as_ref()
    }

    /// Pull the next row in the requested shape; `None` once all rows are read.
    pub fn next_row(&mut self, shape: RowShape) -> Option<FetchedRow> {
        match shape {
            RowShape::Positional => self.next_positional().map(FetchedRow::Positional),
            RowShape::Assoc => self.next_assoc().map(FetchedRow::Assoc),
        }
    }

    pub fn next_positional(&mut self) -> Option<Vec<Value>> {
        self.rows.pop_front()
    }

    pub fn next_assoc(&mut self) -> Option<AssocRow> {
        let values = self.rows.pop_front()?;
        Some(AssocRow::from_columns(&self.columns, values))
    }
}

impl Iterator for QueryOutcome {
    type Item = Vec<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_positional()
    }
}
