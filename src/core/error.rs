/// sqlgate Error Module
///
/// Every fatal condition the access layer can signal is a variant of
/// `DbError`. Suppressed SQL errors never become a `DbError`; they are folded
/// into the query outcome instead.
use crate::core::db::ErrorClass;
use thiserror::Error;

/// Error type for the database access layer.
///
/// The variants follow the error taxonomy of the layer:
/// - connection failures
/// - SQL execution failures (classified by backend code)
/// - failures to read back a generated row id
/// - programmer errors (missing statement, illegal mode or row shape)
/// - configuration and I/O problems of the surrounding tooling
#[derive(Error, Debug)]
pub enum DbError {
    /// The database could not be opened or initialized
    #[error("Failed to connect to the database '{database}': {source}")]
    Connect {
        database: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A statement-requiring mode was called without a statement
    #[error("Internal error: missing sql query statement")]
    MissingStatement,

    /// A SQL statement failed and no suppression flag matched
    #[error("{message} ({code}): {statement}")]
    Sql {
        /// Extended SQLite result code
        code: i32,
        class: Option<ErrorClass>,
        message: String,
        statement: String,
    },

    /// The id of the last inserted row could not be retrieved
    #[error("Failed to get a last_insert_rowid() result: {0}")]
    NewId(#[source] rusqlite::Error),

    /// Illegal use of the access layer by the calling code
    #[error("Internal error: {0}")]
    Internal(String),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DbError {
    /// True for errors caused by the calling code rather than the database.
    pub fn is_programmer_error(&self) -> bool {
        matches!(self, DbError::MissingStatement | DbError::Internal(_))
    }

    /// Backend error code of a failed statement, if this is one.
    pub fn sql_code(&self) -> Option<i32> {
        match self {
            DbError::Sql { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The statement that caused the error, if any.
    pub fn statement(&self) -> Option<&str> {
        match self {
            DbError::Sql { statement, .. } => Some(statement),
            _ => None,
        }
    }
}

/// Type alias for Result with `DbError` as the error type.
pub type Result<T> = std::result::Result<T, DbError>;
