use std::path::PathBuf;

use sqldb::error::ConfigError;
use sqldb::prelude::*;

use crate::common::SCHEMA;

#[test]
fn opens_from_a_config_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("schema.sql"), SCHEMA).unwrap();
    let db_path = dir.path().join("app.db");
    let config_path = dir.path().join("sqldb.toml");
    std::fs::write(
        &config_path,
        format!(
            "path = {:?}\nschema_file = \"schema.sql\"\ntransaction_type = \"deferred\"\n",
            db_path.display().to_string()
        ),
    )
    .unwrap();

    let config = DatabaseConfig::from_file(&config_path).unwrap();
    assert_eq!(config.schema_file, Some(dir.path().join("schema.sql")));
    assert_eq!(config.transaction_type, SQLiteTransactionType::Deferred);

    let db = SQLiteDatabase::from_config(config).unwrap();
    assert_eq!(db.transaction_type(), SQLiteTransactionType::Deferred);
    assert_eq!(db.id_field(), "id");
    db.create("project", fields! { "name" => "alpha" }).unwrap();
    assert!(db_path.exists());
}

#[test]
fn foreign_keys_can_be_disabled() {
    let config = DatabaseConfig {
        foreign_keys: false,
        ..DatabaseConfig::default()
    };
    let db = SQLiteDatabase::from_config(config).unwrap();
    db.initialise(SCHEMA).unwrap();
    db.create("user", fields! { "name" => "ann", "project_id" => 42 })
        .unwrap();
}

#[test]
fn missing_config_file() {
    let err = DatabaseConfig::from_file("/definitely/not/here.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(ref path, _) if path == &PathBuf::from("/definitely/not/here.toml")));
}
