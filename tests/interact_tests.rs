//! End-to-end tests of the process-wide database against a file on disk

use sqlgate::{Database, DatabaseConfig, DbError, DbResult, Flag, Flags, KeySelector, ReturnMode, Value};
use std::sync::Arc;
use tempfile::TempDir;

fn setup_forum(db: &Database) {
    db.execute_with(
        "CREATE TABLE forums (forum_id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)",
        Flag::TableExistsOk.into(),
    )
    .unwrap();
    db.execute_with(
        "INSERT INTO forums (forum_id, name) VALUES (1, 'General'), (2, 'Help')",
        Flag::DupKeyOk.into(),
    )
    .unwrap();
}

#[test]
fn test_global_database_lifecycle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("forum.db");
    let config = DatabaseConfig::new(path.to_string_lossy());

    let db = Database::install(config.clone()).unwrap();
    assert!(Arc::ptr_eq(
        &Database::global().unwrap().connection().unwrap(),
        &db.connection().unwrap()
    ));
    assert!(matches!(Database::install(config), Err(DbError::Internal(_))));

    // Running the setup twice is harmless with the right flags
    setup_forum(db);
    setup_forum(db);
    assert_eq!(db.row_count("SELECT * FROM forums").unwrap(), 2);
    assert!(path.is_file());

    let result = db
        .interact(
            ReturnMode::Assocs,
            Some("SELECT forum_id, name FROM forums"),
            Some(&KeySelector::from("forum_id")),
            Flags::empty(),
        )
        .unwrap();
    match result {
        DbResult::KeyedAssocs(forums) => {
            assert_eq!(forums.get("2").unwrap().get("name"), Some(&Value::from("Help")));
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_separate_handles_share_a_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shared.db");
    let writer = Database::new(DatabaseConfig::new(path.to_string_lossy()));
    setup_forum(&writer);

    let reader = Database::new(DatabaseConfig {
        read_only: true,
        ..DatabaseConfig::new(path.to_string_lossy())
    });
    assert_eq!(reader.value("SELECT name FROM forums WHERE forum_id = 1").unwrap(), Some(Value::from("General")));
    assert!(matches!(reader.execute("DELETE FROM forums"), Err(DbError::Sql { .. })));
    assert!(matches!(
        reader.interact(ReturnMode::Error, Some("DELETE FROM forums"), None, Flags::empty()),
        Ok(DbResult::Error(Some(_)))
    ));
}
