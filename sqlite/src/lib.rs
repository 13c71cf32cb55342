//! SQLite implementation for sqldb
//!
//! This crate provides the SQLite value type, the pragmas the database wrapper
//! issues, and the schema catalog backed by a live connection.

pub mod catalog;
pub mod connection;
pub mod pragma;
pub mod values;

pub use catalog::{CatalogObserver, SchemaCache};
#[cfg(feature = "rusqlite")]
pub use catalog::ConnectionCatalog;
pub use connection::SQLiteTransactionType;
pub use values::SQLiteValue;

/// SQL fragment over SQLite values
pub type SQLiteSQL = sqldb_core::SQL<SQLiteValue>;

/// Reconstructed record over SQLite values
pub type SQLiteRecord = sqldb_core::Record<SQLiteValue>;
