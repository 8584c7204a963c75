/// Database Module
///
/// The database access layer of sqlgate, organized into focused submodules.
///
/// ## Architecture
///
/// - **Connection Management** (`connection.rs`): one lazily opened connection per `Database`
/// - **Query Execution** (`query.rs`): send a statement, fetch and buffer its outcome
/// - **Error Classification** (`flags.rs`): suppressible error classes and per-call flags
/// - **Result Shaping** (`interact.rs`): the `interact` entry point and its typed wrappers
/// - **Rows and Values** (`rows.rs`, `value.rs`): what callers get back
///
/// ## Error Handling
///
/// Fatal conditions are logged through `tracing` and returned as `DbError`.
/// Suppressed SQL errors never surface as errors.
pub mod connection;
pub mod escape;
pub mod flags;
pub mod interact;
pub mod mode;
pub mod query;
pub mod rows;
pub mod value;

pub use connection::{ConnectionManager, SharedConnection};
pub use escape::{escape_string, quote_literal};
pub use flags::{classify, ErrorClass, Flag, Flags, SqlFailure};
pub use interact::{Database, DbResult};
pub use mode::{KeySelector, ReturnMode, RowShape};
pub use query::QueryExecutor;
pub use rows::{AssocRow, FetchedRow, KeyedRows, QueryOutcome};
pub use value::Value;
