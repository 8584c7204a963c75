/// Connection Management Module
///
/// One database connection per manager, opened on first use and kept until
/// the manager is dropped. A failed open leaves the manager empty so a later
/// call can try again.

use super::escape::quote_literal;
use crate::config::DatabaseConfig;
use crate::core::{DbError, Result};
use once_cell::sync::OnceCell;
use rusqlite::{Connection, OpenFlags};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// Handle to the open connection. Clones share the same connection.
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Lazily opened, reused database connection.
#[derive(Debug)]
pub struct ConnectionManager {
    config: DatabaseConfig,
    connection: OnceCell<SharedConnection>,
}

impl ConnectionManager {
    /// Creates a manager; nothing is opened until `acquire` is called.
    pub fn new(config: DatabaseConfig) -> Self {
        ConnectionManager {
            config,
            connection: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Checks if the connection has been established
    pub fn is_connected(&self) -> bool {
        self.connection.get().is_some()
    }

    /// Returns the connection, opening it on the first call.
    ///
    /// # Arguments
    ///
    /// * `tolerate_failure` - return `Ok(None)` instead of an error when the
    ///   database cannot be opened
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connect` if opening fails and failure is not tolerated.
    pub fn acquire(&self, tolerate_failure: bool) -> Result<Option<SharedConnection>> {
        match self.connection.get_or_try_init(|| self.open()) {
            Ok(conn) => Ok(Some(Arc::clone(conn))),
            Err(e) if tolerate_failure => {
                warn!(database = %self.config.name, "connect failure tolerated: {}", e);
                Ok(None)
            }
            Err(e) => {
                error!(database = %self.config.name, "{}", e);
                Err(e)
            }
        }
    }

    fn open(&self) -> Result<SharedConnection> {
        let name = &self.config.name;
        let mut flags = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if self.config.read_only {
            flags |= OpenFlags::SQLITE_OPEN_READ_ONLY;
        } else {
            flags |= OpenFlags::SQLITE_OPEN_READ_WRITE;
            if self.config.create {
                flags |= OpenFlags::SQLITE_OPEN_CREATE;
            }
        }

        let conn = Connection::open_with_flags(name, flags).map_err(|source| DbError::Connect {
            database: name.clone(),
            source,
        })?;

        // Must run before any other statement touches the database.
        if let Some(charset) = self.config.charset.as_deref().filter(|c| !c.is_empty()) {
            conn.execute_batch(&format!("PRAGMA encoding = {}", quote_literal(charset)))
                .map_err(|source| DbError::Connect {
                    database: name.clone(),
                    source,
                })?;
        }

        info!(database = %name, read_only = self.config.read_only, "connected to database");
        Ok(Arc::new(Mutex::new(conn)))
    }
}
