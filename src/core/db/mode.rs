/// Return Mode Module
///
/// A return mode tells the executor what to do with a statement and fixes
/// the shape of what comes back.

use crate::core::{DbError, Result};
use std::fmt;
use std::str::FromStr;

/// Selector for the shape of an executor call's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnMode {
    /// The shared connection handle
    Connection,
    /// The argument escaped for inline use in a string literal
    Quoted,
    /// The outcome handle itself, for row-by-row reading
    Raw,
    /// First row, positional
    Row,
    /// All rows, positional
    Rows,
    /// First row, by column name
    Assoc,
    /// All rows, by column name
    Assocs,
    /// First column of the first row
    Value,
    /// Number of rows in the outcome
    RowCount,
    /// Id generated by the last insert on the connection
    NewId,
    /// Error message of the statement, or nothing if it succeeded
    Error,
}

impl ReturnMode {
    pub const ALL: [ReturnMode; 11] = [
        ReturnMode::Connection,
        ReturnMode::Quoted,
        ReturnMode::Raw,
        ReturnMode::Row,
        ReturnMode::Rows,
        ReturnMode::Assoc,
        ReturnMode::Assocs,
        ReturnMode::Value,
        ReturnMode::RowCount,
        ReturnMode::NewId,
        ReturnMode::Error,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ReturnMode::Connection => "connection",
            ReturnMode::Quoted => "quoted",
            ReturnMode::Raw => "raw",
            ReturnMode::Row => "row",
            ReturnMode::Rows => "rows",
            ReturnMode::Assoc => "assoc",
            ReturnMode::Assocs => "assocs",
            ReturnMode::Value => "value",
            ReturnMode::RowCount => "row-count",
            ReturnMode::NewId => "new-id",
            ReturnMode::Error => "error",
        }
    }

    /// Modes that run a statement against the connection.
    pub fn requires_statement(self) -> bool {
        !matches!(self, ReturnMode::Connection | ReturnMode::Quoted)
    }

    /// Only the "all rows" modes accept a key selector.
    pub fn accepts_key(self) -> bool {
        matches!(self, ReturnMode::Rows | ReturnMode::Assocs)
    }
}

impl fmt::Display for ReturnMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReturnMode {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        ReturnMode::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| DbError::Internal(format!("illegal return type '{}' specified", s)))
    }
}

/// Shape of a row pulled from an outcome one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    Positional,
    Assoc,
}

impl TryFrom<ReturnMode> for RowShape {
    type Error = DbError;

    fn try_from(mode: ReturnMode) -> Result<Self> {
        match mode {
            ReturnMode::Row => Ok(RowShape::Positional),
            ReturnMode::Assoc => Ok(RowShape::Assoc),
            other => Err(DbError::Internal(format!(
                "illegal row type '{}' used for fetching a row",
                other
            ))),
        }
    }
}

/// Column used to key an "all rows" result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySelector {
    Index(usize),
    Column(String),
}

impl KeySelector {
    /// Resolve to a column position within the given column list.
    pub fn resolve(&self, columns: &[String]) -> Result<usize> {
        match self {
            KeySelector::Index(i) if *i < columns.len() => Ok(*i),
            KeySelector::Index(i) => Err(DbError::Internal(format!(
                "key column index {} out of range for {} columns",
                i,
                columns.len()
            ))),
            KeySelector::Column(name) => columns
                .iter()
                .rposition(|c| c == name)
                .ok_or_else(|| DbError::Internal(format!("key column '{}' not in result", name))),
        }
    }
}

impl From<usize> for KeySelector {
    fn from(i: usize) -> Self {
        KeySelector::Index(i)
    }
}

impl From<&str> for KeySelector {
    fn from(name: &str) -> Self {
        KeySelector::Column(name.to_string())
    }
}

impl FromStr for KeySelector {
    type Err = std::convert::Infallible;

    /// Digits select a column by position, anything else by name.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.parse::<usize>() {
            Ok(i) => KeySelector::Index(i),
            Err(_) => KeySelector::Column(s.to_string()),
        })
    }
}
