//! Database configuration loaded from TOML.
//!
//! ```toml
//! path = "app.db"
//! schema_file = "schema.sql"
//! id_field = "id"
//! foreign_keys = true
//! transaction_type = "immediate"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sqldb_sqlite::SQLiteTransactionType;

/// Path that opens a private in-memory database
pub const MEMORY_PATH: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file, or `:memory:`
    pub path: PathBuf,
    /// Script run only when the database file did not exist before opening
    pub schema_file: Option<PathBuf>,
    /// Identifier column present on every table
    pub id_field: String,
    /// Issue `PRAGMA foreign_keys = ON` after opening
    pub foreign_keys: bool,
    /// Begin mode for transaction scopes
    pub transaction_type: SQLiteTransactionType,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(MEMORY_PATH),
            schema_file: None,
            id_field: "id".to_string(),
            foreign_keys: true,
            transaction_type: SQLiteTransactionType::Immediate,
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Load from a TOML file. A relative `schema_file` is resolved against
    /// the config file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.into(), e))?;
        let mut config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(Some(path.into()), e))?;

        if let (Some(schema), Some(dir)) = (&config.schema_file, path.parent())
            && schema.is_relative()
        {
            config.schema_file = Some(dir.join(schema));
        }
        Ok(config)
    }

    /// Parse from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(None, e))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(ConfigError::Serialize)
    }

    pub fn is_memory(&self) -> bool {
        self.path.as_os_str() == MEMORY_PATH
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse {}: {}", .0.as_deref().map_or("config".into(), |p| p.display().to_string()), .1)]
    Parse(Option<PathBuf>, #[source] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[source] toml::ser::Error),
}
