/// # Test Utilities Module
///
/// Fixtures and assertion helpers shared by the unit tests.
///
/// This module provides:
/// - In-memory database fixtures with a small forum schema
/// - DbError-specific assertion helpers

use crate::config::DatabaseConfig;
use crate::core::db::Database;
use crate::core::Result;

/// Isolated database test fixture
///
/// Every fixture owns its own in-memory database, so tests never share
/// connection state.
pub struct DatabaseFixture {
    pub db: Database,
}

impl DatabaseFixture {
    /// Create a fixture with an empty database
    pub fn new() -> Self {
        DatabaseFixture {
            db: Database::new(DatabaseConfig::in_memory()),
        }
    }

    /// Create fixture with sample data schema
    pub fn with_sample_data() -> Result<Self> {
        let fixture = Self::new();
        fixture.setup_standard_schema()?;
        fixture.populate_sample_data()?;
        Ok(fixture)
    }

    /// Set up standard test schema
    pub fn setup_standard_schema(&self) -> Result<()> {
        for sql in [
            "CREATE TABLE users (
                user_id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1
            )",
            "CREATE TABLE messages (
                message_id INTEGER PRIMARY KEY AUTOINCREMENT,
                forum_id INTEGER NOT NULL,
                user_id INTEGER,
                author TEXT NOT NULL,
                subject TEXT NOT NULL,
                status INTEGER NOT NULL DEFAULT 2
            )",
            "CREATE INDEX idx_messages_forum ON messages (forum_id)",
        ] {
            self.db.execute(sql)?;
        }
        Ok(())
    }

    /// Populate with realistic sample data
    pub fn populate_sample_data(&self) -> Result<()> {
        let users = [
            ("alice", "alice@example.com", 1),
            ("bob", "bob@example.com", 1),
            ("charlie", "charlie@example.com", 0),
        ];
        for (username, email, active) in users {
            self.db.execute(&format!(
                "INSERT INTO users (username, email, active) VALUES ('{}', '{}', {})",
                self.db.quote(username),
                self.db.quote(email),
                active
            ))?;
        }

        let messages = [
            (1, 1, "alice", "Welcome", 2),
            (1, 2, "bob", "Re: Welcome", 2),
            (2, 2, "bob", "Waiting for approval", -1),
            (2, 3, "charlie", "Bob's question", -1),
        ];
        for (forum_id, user_id, author, subject, status) in messages {
            self.db.execute(&format!(
                "INSERT INTO messages (forum_id, user_id, author, subject, status)
                 VALUES ({}, {}, '{}', '{}', {})",
                forum_id,
                user_id,
                self.db.quote(author),
                self.db.quote(subject),
                status
            ))?;
        }
        Ok(())
    }
}

/// Error testing utilities specific to DbError patterns
pub mod error_testing {
    use crate::core::db::ErrorClass;
    use crate::core::DbError;

    /// Assert that a call failed with an unsuppressed SQL error of the given class.
    pub fn assert_sql_error<T: std::fmt::Debug>(
        result: &std::result::Result<T, DbError>,
        expected_class: Option<ErrorClass>,
        statement_fragment: &str,
    ) {
        match result {
            Err(DbError::Sql {
                class, statement, ..
            }) => {
                assert_eq!(*class, expected_class, "wrong error class");
                assert!(
                    statement.contains(statement_fragment),
                    "Expected '{}' in reported statement '{}'",
                    statement_fragment,
                    statement
                );
            }
            other => panic!("Expected Sql error but got {:?}", other),
        }
    }

    /// Assert that a call failed because of a programmer error.
    pub fn assert_programmer_error<T: std::fmt::Debug>(result: &std::result::Result<T, DbError>) {
        match result {
            Err(e) if e.is_programmer_error() => {}
            other => panic!("Expected programmer error but got {:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_data_fixture() {
        let fixture = DatabaseFixture::with_sample_data().unwrap();
        let count = fixture
            .db
            .value("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'messages')")
            .unwrap()
            .and_then(|v| v.as_i64());
        assert_eq!(count, Some(2));
    }

    #[test]
    fn test_fixtures_are_isolated() {
        let first = DatabaseFixture::with_sample_data().unwrap();
        let second = DatabaseFixture::new();
        assert_eq!(first.db.row_count("SELECT * FROM users").unwrap(), 3);
        assert!(second.db.row_count("SELECT * FROM users").is_err());
    }
}
