//! sqlgate: a single-entry SQL access layer.
//!
//! Every interaction with the database goes through `Database::interact`:
//! one lazily opened connection, one call contract, and a return mode that
//! picks the shape of the result.

// Core infrastructure modules
pub mod core;

pub mod cli;
pub mod config;

#[cfg(test)]
pub mod test_utils;

pub use crate::config::{Config, DatabaseConfig};
pub use crate::core::db::{
    AssocRow, Database, DbResult, ErrorClass, FetchedRow, Flag, Flags, KeySelector, KeyedRows,
    QueryOutcome, ReturnMode, RowShape, SharedConnection, Value,
};
pub use crate::core::{DbError, Result};
