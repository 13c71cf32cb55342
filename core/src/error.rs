use thiserror::Error;

/// Identifier validation failures raised by the schema catalog.
///
/// These are always raised before any statement text is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The table does not exist, or is not part of the current request
    #[error("Invalid table: {table}")]
    UnknownTable { table: String },

    /// One or more fields are not columns of the table
    #[error("Invalid field(s) for {table}: {}", fields.join(", "))]
    UnknownFields { table: String, fields: Vec<String> },
}

impl SchemaError {
    pub fn unknown_table(table: impl Into<String>) -> Self {
        Self::UnknownTable {
            table: table.into(),
        }
    }

    /// Builds an `UnknownFields` error with the offending names sorted and deduplicated.
    pub fn unknown_fields<I, S>(table: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        fields.sort();
        fields.dedup();
        Self::UnknownFields {
            table: table.into(),
            fields,
        }
    }
}

#[derive(Debug, Error)]
pub enum SqlDbError {
    /// Unknown table or field
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Uniqueness, foreign-key or type constraint violated by the engine
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// A result row did not line up with the field plan that produced it
    #[error("Structural error: {0}")]
    Structural(String),

    /// Malformed request data, rejected before the engine is touched
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Error with transaction
    #[error("Transaction error: {0}")]
    TransactionError(String),

    /// Error reading a schema script
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rusqlite specific errors
    #[cfg(feature = "rusqlite")]
    #[error("Rusqlite error: {0}")]
    Rusqlite(rusqlite::Error),
}

#[cfg(feature = "rusqlite")]
impl From<rusqlite::Error> for SqlDbError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => Self::Constraint(err.to_string()),
            _ => Self::Rusqlite(err),
        }
    }
}

/// Result type for database operations
pub type Result<T> = std::result::Result<T, SqlDbError>;
