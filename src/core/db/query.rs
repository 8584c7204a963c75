/// Query Execution Module
///
/// Runs SQL against a connection and buffers the outcome. Error
/// classification happens here; deciding what to do with a classified error
/// is left to the caller.

use super::flags::SqlFailure;
use super::rows::QueryOutcome;
use super::value::Value;
use crate::core::{DbError, Result};
use rusqlite::{Batch, Connection, Statement};

fn fail(e: rusqlite::Error) -> SqlFailure {
    SqlFailure::from_rusqlite(&e)
}

/// Query execution service that operates on a database connection
pub struct QueryExecutor<'a> {
    connection: &'a Connection,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new QueryExecutor for the given connection
    pub fn new(connection: &'a Connection) -> Self {
        QueryExecutor { connection }
    }

    /// Sends a statement to the backend, then fetches its complete outcome.
    ///
    /// Each statement in `sql` is compiled, then its rows are stepped
    /// through and buffered. Statements run in order and the outcome of the
    /// last one is returned; the first failure stops the rest. Returns only
    /// once the outcome is known.
    ///
    /// # Errors
    ///
    /// Returns the classified `SqlFailure` if compiling or stepping fails.
    pub fn execute(&self, sql: &str) -> std::result::Result<QueryOutcome, SqlFailure> {
        let mut batch = Batch::new(self.connection, sql);
        let mut outcome = QueryOutcome::new(Vec::new(), Vec::new(), 0);
        while let Some(mut stmt) = batch.next().map_err(fail)? {
            outcome = self.run(&mut stmt)?;
        }
        Ok(outcome)
    }

    fn run(&self, stmt: &mut Statement<'_>) -> std::result::Result<QueryOutcome, SqlFailure> {
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = columns.len();
        let writes = !stmt.readonly();
        let changes_before = if writes { self.total_changes().map_err(fail)? } else { 0 };

        let mut buffered = Vec::new();
        {
            let mut rows = stmt.query([]).map_err(fail)?;
            while let Some(row) = rows.next().map_err(fail)? {
                let mut values = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    values.push(Value::from(row.get_ref(i).map_err(fail)?));
                }
                buffered.push(values);
            }
        }

        // changes() keeps the last DML count across DDL statements
        let affected_rows = if writes && self.total_changes().map_err(fail)? != changes_before {
            self.connection.changes() as usize
        } else {
            0
        };

        Ok(QueryOutcome::new(columns, buffered, affected_rows))
    }

    fn total_changes(&self) -> rusqlite::Result<i64> {
        self.connection
            .query_row("SELECT total_changes()", [], |row| row.get(0))
    }

    /// Asks the backend for the row id generated by the most recent insert.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NewId` if the follow-up query fails.
    pub fn last_insert_id(&self) -> Result<i64> {
        self.connection
            .query_row("SELECT last_insert_rowid()", [], |row| row.get(0))
            .map_err(DbError::NewId)
    }
}
