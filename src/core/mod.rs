/// Core Module for sqlgate
///
/// Holds the database access layer and the error type shared by every
/// part of the crate.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{DbError, Result};
