//! Tracing macros for statement and transaction events.
//!
//! The `#[cfg(feature = "tracing")]` inside each expansion is evaluated in the
//! calling crate, so callers need their own `tracing` feature and dependency.
//! Without it the macros expand to nothing.

/// Emit a debug-level event with the statement text and bound parameter count.
///
/// ```ignore
/// sqldb_trace_query!(&sql, params.len());
/// ```
#[macro_export]
macro_rules! sqldb_trace_query {
    ($sql:expr, $param_count:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(sql = %$sql, params = $param_count, "sqldb.query");
    };
}

/// Emit an info-level event for a transaction lifecycle step.
///
/// ```ignore
/// sqldb_trace_tx!("begin", "sqlite.rusqlite");
/// sqldb_trace_tx!("savepoint", "sqlite.rusqlite");
/// ```
#[macro_export]
macro_rules! sqldb_trace_tx {
    ($event:literal, $driver:literal) => {
        #[cfg(feature = "tracing")]
        tracing::info!(event = $event, driver = $driver, "sqldb.transaction");
    };
}

/// Emit a debug-level event when table metadata is loaded into the schema cache.
#[macro_export]
macro_rules! sqldb_trace_schema {
    ($table:expr, $columns:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(table = %$table, columns = $columns, "sqldb.schema");
    };
}
