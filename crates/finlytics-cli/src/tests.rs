//! CLI command tests

use tempfile::TempDir;

use crate::commands;

#[test]
fn test_cmd_init_creates_database() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("finlytics.db");

    let result = commands::cmd_init(&db_path, true);
    assert!(result.is_ok());
    assert!(db_path.exists());
}

#[test]
fn test_cmd_init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("finlytics.db");

    commands::cmd_init(&db_path, true).unwrap();
    let result = commands::cmd_init(&db_path, true);
    assert!(result.is_ok());
}

#[test]
fn test_cmd_status_reports_counts() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("finlytics.db");

    let db = commands::open_db(&db_path, true).unwrap();
    db.sign_up("Ana Souza", "ana@example.com", "segredo123")
        .unwrap();
    drop(db);

    let result = commands::cmd_status(&db_path, true);
    assert!(result.is_ok());
}

#[test]
fn test_open_db_encrypted_requires_key() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("finlytics.db");

    // Without FINLYTICS_DB_KEY in the environment, an encrypted open fails
    // with guidance rather than creating a plaintext database.
    if std::env::var(finlytics_core::db::DB_KEY_ENV).is_err() {
        let result = commands::open_db(&db_path, false);
        assert!(result.is_err());
        assert!(!db_path.exists());
    }
}
