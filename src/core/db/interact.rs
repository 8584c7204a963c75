/// Database Interaction Module
///
/// `Database::interact` is the single entry point through which the rest of
/// an application reaches storage. The return mode decides what the call
/// does and which `DbResult` variant comes back; the typed methods on
/// `Database` wrap it for callers that know the shape they want.

use super::connection::{ConnectionManager, SharedConnection};
use super::escape::escape_string;
use super::flags::{ErrorClass, Flag, Flags};
use super::mode::{KeySelector, ReturnMode};
use super::query::QueryExecutor;
use super::rows::{AssocRow, KeyedRows, QueryOutcome};
use super::value::Value;
use crate::config::DatabaseConfig;
use crate::core::{DbError, Result};
use once_cell::sync::OnceCell;
use tracing::{debug, error, warn};

static GLOBAL: OnceCell<Database> = OnceCell::new();

/// The shaped result of one `Database::interact` call.
#[derive(Debug)]
pub enum DbResult {
    Connection(SharedConnection),
    /// Connecting failed and the caller passed `Flag::NoConnectOk`
    NoConnection,
    Quoted(String),
    /// `None` after a suppressed duplicate-key-value error
    Raw(Option<QueryOutcome>),
    Row(Option<Vec<Value>>),
    Rows(Vec<Vec<Value>>),
    KeyedRows(KeyedRows<Vec<Value>>),
    Assoc(Option<AssocRow>),
    Assocs(Vec<AssocRow>),
    KeyedAssocs(KeyedRows<AssocRow>),
    Value(Option<Value>),
    RowCount(usize),
    NewId(i64),
    Error(Option<String>),
}

impl DbResult {
    pub fn kind(&self) -> &'static str {
        match self {
            DbResult::Connection(_) => "connection",
            DbResult::NoConnection => "no connection",
            DbResult::Quoted(_) => "quoted",
            DbResult::Raw(_) => "raw",
            DbResult::Row(_) => "row",
            DbResult::Rows(_) => "rows",
            DbResult::KeyedRows(_) => "keyed rows",
            DbResult::Assoc(_) => "assoc",
            DbResult::Assocs(_) => "assocs",
            DbResult::KeyedAssocs(_) => "keyed assocs",
            DbResult::Value(_) => "value",
            DbResult::RowCount(_) => "row count",
            DbResult::NewId(_) => "new id",
            DbResult::Error(_) => "error",
        }
    }
}

fn unexpected(mode: ReturnMode, result: DbResult) -> DbError {
    DbError::Internal(format!("{} call produced a {} result", mode, result.kind()))
}

/// Owner of the connection and the entry point for every statement.
#[derive(Debug)]
pub struct Database {
    manager: ConnectionManager,
}

impl Database {
    /// Creates a database handle; the connection opens on first use.
    pub fn new(config: DatabaseConfig) -> Self {
        Database {
            manager: ConnectionManager::new(config),
        }
    }

    /// Installs the process-wide database. Only the first call succeeds.
    pub fn install(config: DatabaseConfig) -> Result<&'static Database> {
        GLOBAL
            .set(Database::new(config))
            .map_err(|_| DbError::Internal("process database already installed".to_string()))?;
        Database::global()
    }

    /// The process-wide database installed by `Database::install`.
    pub fn global() -> Result<&'static Database> {
        GLOBAL
            .get()
            .ok_or_else(|| DbError::Internal("no process database installed".to_string()))
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Runs one interaction with the database.
    ///
    /// # Arguments
    ///
    /// * `mode` - what to do and which `DbResult` variant to return
    /// * `statement` - the SQL to run, or the value to escape for `Quoted`
    /// * `key` - column to key the result by; only for `Rows` and `Assocs`
    /// * `flags` - error classes to ignore, and `NoConnectOk`
    ///
    /// # Errors
    ///
    /// Every fatal condition is logged and returned: connect failures,
    /// unsuppressed SQL errors, new-id failures, and programmer errors.
    pub fn interact(
        &self,
        mode: ReturnMode,
        statement: Option<&str>,
        key: Option<&KeySelector>,
        flags: Flags,
    ) -> Result<DbResult> {
        let tolerate_failure = flags.contains(Flag::NoConnectOk);

        if !mode.requires_statement() {
            return Ok(match mode {
                ReturnMode::Quoted => DbResult::Quoted(escape_string(statement.unwrap_or_default())),
                _ => match self.manager.acquire(tolerate_failure)? {
                    Some(conn) => DbResult::Connection(conn),
                    None => DbResult::NoConnection,
                },
            });
        }

        let sql = statement
            .filter(|s| !s.trim().is_empty())
            .ok_or(DbError::MissingStatement)
            .inspect_err(|e| error!("{}", e))?;

        if key.is_some() && !mode.accepts_key() {
            let err = DbError::Internal(format!("key selector used with {} mode", mode));
            error!("{}", err);
            return Err(err);
        }

        let Some(conn) = self.manager.acquire(tolerate_failure)? else {
            return Ok(DbResult::NoConnection);
        };
        let guard = conn
            .lock()
            .map_err(|_| DbError::Internal("database connection lock poisoned".to_string()))?;
        let executor = QueryExecutor::new(&guard);

        debug!(mode = %mode, statement = sql, "executing statement");
        let outcome = match executor.execute(sql) {
            Ok(outcome) => Some(outcome),
            Err(failure) => match failure.class.filter(|class| class.suppressed_by(flags)) {
                Some(ErrorClass::DuplicateKeyValue) => {
                    warn!(code = failure.code, statement = sql, "ignored {}", ErrorClass::DuplicateKeyValue);
                    None
                }
                Some(class) => {
                    warn!(code = failure.code, statement = sql, "ignored {}", class);
                    Some(QueryOutcome::ignored(failure))
                }
                None if mode == ReturnMode::Error => {
                    return Ok(DbResult::Error(Some(failure.message)));
                }
                None => {
                    let err = failure.into_error(sql);
                    error!("{}", err);
                    return Err(err);
                }
            },
        };

        let result = match mode {
            ReturnMode::Error => DbResult::Error(None),
            ReturnMode::Raw => DbResult::Raw(outcome),
            ReturnMode::RowCount => DbResult::RowCount(outcome.map_or(0, |o| o.num_rows())),
            ReturnMode::Row => DbResult::Row(outcome.and_then(|mut o| o.next_positional())),
            ReturnMode::Rows => match key {
                Some(key) => DbResult::KeyedRows(keyed(outcome, key, |_, row| row)?),
                None => DbResult::Rows(outcome.map(|o| o.collect()).unwrap_or_default()),
            },
            ReturnMode::Assoc => DbResult::Assoc(outcome.and_then(|mut o| o.next_assoc())),
            ReturnMode::Assocs => match key {
                Some(key) => DbResult::KeyedAssocs(keyed(outcome, key, AssocRow::from_columns)?),
                None => DbResult::Assocs(
                    outcome
                        .map(|mut o| std::iter::from_fn(|| o.next_assoc()).collect())
                        .unwrap_or_default(),
                ),
            },
            ReturnMode::Value => DbResult::Value(
                outcome
                    .and_then(|mut o| o.next_positional())
                    .and_then(|row| row.into_iter().next()),
            ),
            ReturnMode::NewId => {
                DbResult::NewId(executor.last_insert_id().inspect_err(|e| error!("{}", e))?)
            }
            ReturnMode::Connection | ReturnMode::Quoted => {
                return Err(DbError::Internal(format!("illegal return type {} specified", mode)));
            }
        };
        Ok(result)
    }

    /// The shared connection; failure to connect is fatal.
    pub fn connection(&self) -> Result<SharedConnection> {
        match self.interact(ReturnMode::Connection, None, None, Flags::empty())? {
            DbResult::Connection(conn) => Ok(conn),
            other => Err(unexpected(ReturnMode::Connection, other)),
        }
    }

    /// The shared connection, or `None` if the database cannot be opened.
    pub fn try_connection(&self) -> Result<Option<SharedConnection>> {
        match self.interact(ReturnMode::Connection, None, None, Flag::NoConnectOk.into())? {
            DbResult::Connection(conn) => Ok(Some(conn)),
            DbResult::NoConnection => Ok(None),
            other => Err(unexpected(ReturnMode::Connection, other)),
        }
    }

    /// Escapes a value for inline use inside a single-quoted literal.
    pub fn quote(&self, value: &str) -> String {
        escape_string(value)
    }

    pub fn raw(&self, sql: &str) -> Result<Option<QueryOutcome>> {
        self.raw_with(sql, Flags::empty())
    }

    pub fn raw_with(&self, sql: &str, flags: Flags) -> Result<Option<QueryOutcome>> {
        match self.typed(ReturnMode::Raw, sql, None, flags)? {
            DbResult::Raw(outcome) => Ok(outcome),
            other => Err(unexpected(ReturnMode::Raw, other)),
        }
    }

    /// Runs a statement for its side effects, returning the affected row count.
    pub fn execute(&self, sql: &str) -> Result<usize> {
        self.execute_with(sql, Flags::empty())
    }

    pub fn execute_with(&self, sql: &str, flags: Flags) -> Result<usize> {
        Ok(self.raw_with(sql, flags)?.map_or(0, |o| o.affected_rows()))
    }

    pub fn row(&self, sql: &str) -> Result<Option<Vec<Value>>> {
        match self.typed(ReturnMode::Row, sql, None, Flags::empty())? {
            DbResult::Row(row) => Ok(row),
            other => Err(unexpected(ReturnMode::Row, other)),
        }
    }

    pub fn rows(&self, sql: &str) -> Result<Vec<Vec<Value>>> {
        self.rows_with(sql, Flags::empty())
    }

    pub fn rows_with(&self, sql: &str, flags: Flags) -> Result<Vec<Vec<Value>>> {
        match self.typed(ReturnMode::Rows, sql, None, flags)? {
            DbResult::Rows(rows) => Ok(rows),
            other => Err(unexpected(ReturnMode::Rows, other)),
        }
    }

    pub fn rows_keyed(
        &self,
        sql: &str,
        key: impl Into<KeySelector>,
    ) -> Result<KeyedRows<Vec<Value>>> {
        match self.typed(ReturnMode::Rows, sql, Some(&key.into()), Flags::empty())? {
            DbResult::KeyedRows(rows) => Ok(rows),
            other => Err(unexpected(ReturnMode::Rows, other)),
        }
    }

    pub fn assoc(&self, sql: &str) -> Result<Option<AssocRow>> {
        match self.typed(ReturnMode::Assoc, sql, None, Flags::empty())? {
            DbResult::Assoc(row) => Ok(row),
            other => Err(unexpected(ReturnMode::Assoc, other)),
        }
    }

    pub fn assocs(&self, sql: &str) -> Result<Vec<AssocRow>> {
        self.assocs_with(sql, Flags::empty())
    }

    pub fn assocs_with(&self, sql: &str, flags: Flags) -> Result<Vec<AssocRow>> {
        match self.typed(ReturnMode::Assocs, sql, None, flags)? {
            DbResult::Assocs(rows) => Ok(rows),
            other => Err(unexpected(ReturnMode::Assocs, other)),
        }
    }

    pub fn assocs_keyed(&self, sql: &str, key: impl Into<KeySelector>) -> Result<KeyedRows<AssocRow>> {
        match self.typed(ReturnMode::Assocs, sql, Some(&key.into()), Flags::empty())? {
            DbResult::KeyedAssocs(rows) => Ok(rows),
            other => Err(unexpected(ReturnMode::Assocs, other)),
        }
    }

    pub fn value(&self, sql: &str) -> Result<Option<Value>> {
        self.value_with(sql, Flags::empty())
    }

    pub fn value_with(&self, sql: &str, flags: Flags) -> Result<Option<Value>> {
        match self.typed(ReturnMode::Value, sql, None, flags)? {
            DbResult::Value(value) => Ok(value),
            other => Err(unexpected(ReturnMode::Value, other)),
        }
    }

    pub fn row_count(&self, sql: &str) -> Result<usize> {
        self.row_count_with(sql, Flags::empty())
    }

    pub fn row_count_with(&self, sql: &str, flags: Flags) -> Result<usize> {
        match self.typed(ReturnMode::RowCount, sql, None, flags)? {
            DbResult::RowCount(count) => Ok(count),
            other => Err(unexpected(ReturnMode::RowCount, other)),
        }
    }

    /// Runs an insert, then returns the id it generated.
    pub fn new_id(&self, sql: &str) -> Result<i64> {
        self.new_id_with(sql, Flags::empty())
    }

    /// Like `new_id`; the flags apply to the insert, never to the id lookup.
    pub fn new_id_with(&self, sql: &str, flags: Flags) -> Result<i64> {
        match self.typed(ReturnMode::NewId, sql, None, flags)? {
            DbResult::NewId(id) => Ok(id),
            other => Err(unexpected(ReturnMode::NewId, other)),
        }
    }

    /// The statement's error message, or `None` if it ran cleanly.
    pub fn error_message(&self, sql: &str) -> Result<Option<String>> {
        match self.typed(ReturnMode::Error, sql, None, Flags::empty())? {
            DbResult::Error(message) => Ok(message),
            other => Err(unexpected(ReturnMode::Error, other)),
        }
    }

    // Typed calls always treat a connect failure as fatal.
    fn typed(
        &self,
        mode: ReturnMode,
        sql: &str,
        key: Option<&KeySelector>,
        flags: Flags,
    ) -> Result<DbResult> {
        self.interact(mode, Some(sql), key, flags.without(Flag::NoConnectOk))
    }
}

/// Drains an outcome into rows keyed by one column. A later row with the
/// same key replaces the earlier one.
fn keyed<R>(
    outcome: Option<QueryOutcome>,
    key: &KeySelector,
    shape: impl Fn(&[String], Vec<Value>) -> R,
) -> Result<KeyedRows<R>> {
    let mut keyed = KeyedRows::new();
    let Some(outcome) = outcome.filter(|o| o.ignored_error().is_none()) else {
        return Ok(keyed);
    };

    let columns = outcome.columns().to_vec();
    let index = key.resolve(&columns).inspect_err(|e| error!("{}", e))?;
    for row in outcome {
        keyed.insert(row[index].to_key(), shape(&columns, row));
    }
    Ok(keyed)
}
