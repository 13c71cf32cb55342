//! The SQLite connection wrapper and its builder.

use std::cell::Cell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use compact_str::CompactString;
use rusqlite::{Connection, ToSql, params_from_iter};
use sqldb_core::{Placeholder, SQL, SchemaCatalog, SqlDbError, TableSchema, ToSQL};
use sqldb_sqlite::pragma::Pragma;
use sqldb_sqlite::values::row_values;
use sqldb_sqlite::{ConnectionCatalog, SQLiteTransactionType, SQLiteValue, SchemaCache};

use crate::Result;
use crate::config::DatabaseConfig;
use crate::transaction::TxState;

/// Observer called with the statement text and bound values of every execution
pub type StatementHook = Box<dyn Fn(&str, &[SQLiteValue]) + Send>;

/// A single SQLite connection with a schema catalog and transaction scopes.
///
/// ```no_run
/// # use sqldb::prelude::*;
/// # fn main() -> sqldb::Result<()> {
/// let db = SQLiteDatabase::builder("app.db")
///     .schema_file("schema.sql")
///     .open()?;
/// let id = db.create("project", fields! { "name" => "alpha" })?;
/// let project = db.get_one(&Select::new("project").filter(FilterGroup::new().eq("id", id)))?;
/// # Ok(()) }
/// ```
pub struct SQLiteDatabase {
    pub(crate) conn: Connection,
    schema: SchemaCache,
    id_field: CompactString,
    tx_type: SQLiteTransactionType,
    pub(crate) state: Cell<TxState>,
    pub(crate) savepoint_depth: Cell<u32>,
    on_statement: Option<StatementHook>,
}

impl fmt::Debug for SQLiteDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SQLiteDatabase")
            .field("conn", &self.conn)
            .field("id_field", &self.id_field)
            .field("tx_type", &self.tx_type)
            .field("state", &self.state.get())
            .field("on_statement", &self.on_statement.is_some())
            .finish_non_exhaustive()
    }
}

impl SQLiteDatabase {
    /// Opens `path` with default settings
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(path).open()
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        DatabaseBuilder::new(DatabaseConfig::default()).open()
    }

    pub fn from_config(config: DatabaseConfig) -> Result<Self> {
        DatabaseBuilder::new(config).open()
    }

    pub fn builder(path: impl Into<PathBuf>) -> DatabaseBuilder {
        DatabaseBuilder::new(DatabaseConfig::new(path))
    }

    /// Wraps an already opened connection. No pragma or bootstrap script is run.
    pub fn with_connection(conn: Connection, id_field: impl Into<CompactString>) -> Self {
        Self {
            conn,
            schema: SchemaCache::new(),
            id_field: id_field.into(),
            tx_type: SQLiteTransactionType::default(),
            state: Cell::new(TxState::Idle),
            savepoint_depth: Cell::new(0),
            on_statement: None,
        }
    }

    /// Gets a reference to the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Consumes the wrapper, returning the connection
    pub fn into_inner(self) -> Connection {
        self.conn
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn transaction_type(&self) -> SQLiteTransactionType {
        self.tx_type
    }

    /// The live catalog used to validate every identifier.
    ///
    /// Its metadata lookups are reported to the statement hook.
    pub fn catalog(&self) -> ConnectionCatalog<'_> {
        let catalog = ConnectionCatalog::new(&self.conn, &self.schema);
        match &self.on_statement {
            Some(hook) => catalog.with_observer(&**hook),
            None => catalog,
        }
    }

    /// Column metadata for `table`, cached after the first lookup
    pub fn schema(&self, table: &str) -> Result<Arc<TableSchema>> {
        self.catalog().schema(table)
    }

    /// Names of every ordinary table
    pub fn tables(&self) -> Result<Vec<String>> {
        self.catalog().tables()
    }

    /// Runs a schema script in one transaction and forgets any cached table
    /// metadata. A failing script leaves no part of itself behind.
    pub fn initialise(&self, script: &str) -> Result<()> {
        let outcome = self.transaction(|db| {
            db.trace(script, &[]);
            db.conn.execute_batch(script)?;
            Ok(())
        });
        self.schema.clear();
        outcome
    }

    /// Forgets cached table metadata so it is re-read on next use
    pub fn reload_schema(&self) {
        self.schema.clear();
    }

    pub(crate) fn trace(&self, sql: &str, params: &[&SQLiteValue]) {
        sqldb_core::sqldb_trace_query!(sql, params.len());
        if let Some(hook) = &self.on_statement {
            let values: Vec<SQLiteValue> = params.iter().map(|v| (*v).clone()).collect();
            hook(sql, &values);
        }
    }

    /// Executes a statement, returning the number of changed rows
    pub(crate) fn execute_sql(&self, sql: &SQL<SQLiteValue>) -> Result<usize> {
        let text = sql.sql();
        let params = sql.params();
        self.trace(&text, &params);
        let mut stmt = self.conn.prepare_cached(&text)?;
        Ok(stmt.execute(params_from_iter(params))?)
    }

    /// Executes a statement with named placeholders, binding `values` in placeholder order
    pub(crate) fn execute_named(
        &self,
        sql: &SQL<SQLiteValue>,
        values: &[&SQLiteValue],
    ) -> Result<usize> {
        let text = sql.sql();
        let keys: Vec<CompactString> = sql.placeholders().filter_map(Placeholder::bind_key).collect();
        if keys.len() != values.len() {
            return Err(SqlDbError::InvalidQuery(format!(
                "statement has {} named placeholders, got {} values",
                keys.len(),
                values.len()
            )));
        }
        self.trace(&text, values);
        let named: Vec<(&str, &dyn ToSql)> = keys
            .iter()
            .zip(values)
            .map(|(key, value)| (key.as_str(), *value as &dyn ToSql))
            .collect();
        let mut stmt = self.conn.prepare_cached(&text)?;
        Ok(stmt.execute(named.as_slice())?)
    }

    /// Runs a query whose rows must be exactly `width` columns wide
    pub(crate) fn query_rows(
        &self,
        sql: &SQL<SQLiteValue>,
        width: usize,
    ) -> Result<Vec<Vec<SQLiteValue>>> {
        let text = sql.sql();
        let params = sql.params();
        self.trace(&text, &params);
        let mut stmt = self.conn.prepare_cached(&text)?;
        if stmt.column_count() != width {
            return Err(SqlDbError::Structural(format!(
                "statement returns {} columns, expected {width}",
                stmt.column_count()
            )));
        }
        let rows = stmt
            .query_map(params_from_iter(params), |row| row_values(row, width))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Runs a query returning a single integer
    pub(crate) fn query_count(&self, sql: &SQL<SQLiteValue>) -> Result<u64> {
        let text = sql.sql();
        let params = sql.params();
        self.trace(&text, &params);
        let mut stmt = self.conn.prepare_cached(&text)?;
        let count: i64 = stmt.query_row(params_from_iter(params), |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    pub(crate) fn execute_pragma(&self, pragma: Pragma<'_>) -> Result<()> {
        let sql = pragma.to_sql();
        let text = sql.sql();
        self.trace(&text, &[]);
        self.conn.execute_batch(&text)?;
        Ok(())
    }
}

/// Builder for [`SQLiteDatabase`]
pub struct DatabaseBuilder {
    config: DatabaseConfig,
    schema_sql: Option<String>,
    on_statement: Option<StatementHook>,
}

impl fmt::Debug for DatabaseBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseBuilder")
            .field("config", &self.config)
            .field("schema_sql", &self.schema_sql.is_some())
            .field("on_statement", &self.on_statement.is_some())
            .finish()
    }
}

impl DatabaseBuilder {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            schema_sql: None,
            on_statement: None,
        }
    }

    /// Bootstrap script file, run only when the database is created
    pub fn schema_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.schema_file = Some(path.into());
        self
    }

    /// Inline bootstrap script. Takes precedence over [`Self::schema_file`].
    pub fn schema_sql(mut self, script: impl Into<String>) -> Self {
        self.schema_sql = Some(script.into());
        self
    }

    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.config.id_field = field.into();
        self
    }

    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.config.foreign_keys = enabled;
        self
    }

    pub fn transaction_type(mut self, tx_type: SQLiteTransactionType) -> Self {
        self.config.transaction_type = tx_type;
        self
    }

    /// Observe every statement with its bound values
    pub fn on_statement<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &[SQLiteValue]) + Send + 'static,
    {
        self.on_statement = Some(Box::new(hook));
        self
    }

    pub fn open(self) -> Result<SQLiteDatabase> {
        let config = self.config;
        let existed = !config.is_memory() && Path::new(&config.path).exists();
        let conn = if config.is_memory() {
            Connection::open_in_memory()?
        } else {
            Connection::open(&config.path)?
        };

        let db = SQLiteDatabase {
            conn,
            schema: SchemaCache::new(),
            id_field: CompactString::from(config.id_field.as_str()),
            tx_type: config.transaction_type,
            state: Cell::new(TxState::Idle),
            savepoint_depth: Cell::new(0),
            on_statement: self.on_statement,
        };

        db.execute_pragma(Pragma::foreign_keys(config.foreign_keys))?;

        if !existed {
            let script = match (self.schema_sql, &config.schema_file) {
                (Some(script), _) => Some(script),
                (None, Some(path)) => Some(std::fs::read_to_string(path)?),
                (None, None) => None,
            };
            if let Some(script) = script {
                db.initialise(&script)?;
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            path = %config.path.display(),
            created = !existed,
            "sqldb.open"
        );
        Ok(db)
    }
}
