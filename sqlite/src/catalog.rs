//! The live schema catalog: table metadata read from the connection and cached.

use std::cell::RefCell;
use std::sync::Arc;

use compact_str::CompactString;
use hashbrown::HashMap;
use sqldb_core::{ColumnInfo, Result, SchemaCatalog, SchemaError, TableSchema, ToSQL};

use crate::pragma::Pragma;
use crate::values::SQLiteValue;

/// Memoised table metadata for the life of one database handle.
///
/// Only existing tables are cached, so a table created later is still found.
#[derive(Debug, Default)]
pub struct SchemaCache {
    tables: RefCell<HashMap<CompactString, Arc<TableSchema>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, table: &str) -> Option<Arc<TableSchema>> {
        self.tables.borrow().get(table).cloned()
    }

    pub fn insert(&self, schema: TableSchema) -> Arc<TableSchema> {
        let schema = Arc::new(schema);
        self.tables
            .borrow_mut()
            .insert(schema.name.clone(), Arc::clone(&schema));
        schema
    }

    /// Forgets every cached table
    pub fn clear(&self) {
        self.tables.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.tables.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.borrow().is_empty()
    }
}

/// Called with the text and bound values of every metadata statement
pub type CatalogObserver<'a> = &'a (dyn Fn(&str, &[SQLiteValue]) + Send);

/// A [`SchemaCatalog`] backed by a rusqlite connection and a [`SchemaCache`].
#[cfg(feature = "rusqlite")]
#[derive(Clone, Copy)]
pub struct ConnectionCatalog<'a> {
    conn: &'a rusqlite::Connection,
    cache: &'a SchemaCache,
    observer: Option<CatalogObserver<'a>>,
}

#[cfg(feature = "rusqlite")]
impl std::fmt::Debug for ConnectionCatalog<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionCatalog")
            .field("conn", self.conn)
            .field("cache", self.cache)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

#[cfg(feature = "rusqlite")]
impl<'a> ConnectionCatalog<'a> {
    pub fn new(conn: &'a rusqlite::Connection, cache: &'a SchemaCache) -> Self {
        Self {
            conn,
            cache,
            observer: None,
        }
    }

    /// Reports every metadata statement to `observer` before it runs
    pub fn with_observer(mut self, observer: CatalogObserver<'a>) -> Self {
        self.observer = Some(observer);
        self
    }

    fn observe(&self, sql: &str, params: &[&SQLiteValue]) {
        sqldb_core::sqldb_trace_query!(sql, params.len());
        if let Some(observer) = self.observer {
            let values: Vec<SQLiteValue> = params.iter().map(|v| (*v).clone()).collect();
            observer(sql, &values);
        }
    }

    /// Reads `table`'s metadata from the connection, bypassing the cache
    pub fn load(&self, table: &str) -> Result<Option<TableSchema>> {
        if !self.table_exists(table)? {
            return Ok(None);
        }
        let sql = Pragma::table_info(table).to_sql();
        let text = sql.sql();
        let params = sql.params();
        self.observe(&text, &params);
        let mut stmt = self.conn.prepare_cached(&text)?;
        let columns = stmt
            .query_map(rusqlite::params_from_iter(params), |row| {
                Ok(ColumnInfo {
                    name: CompactString::from(row.get::<_, String>(0)?),
                    r#type: CompactString::from(row.get::<_, String>(1)?),
                    not_null: row.get::<_, i64>(2)? != 0,
                    default: row.get::<_, Option<String>>(3)?,
                    primary_key: row.get::<_, i64>(4)? > 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(TableSchema::new(table, columns)))
    }

    /// Names of every ordinary table in the database
    pub fn tables(&self) -> Result<Vec<String>> {
        let text = Pragma::TableList.to_sql().sql();
        self.observe(&text, &[]);
        let mut stmt = self.conn.prepare_cached(&text)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        let sql = Pragma::table_exists(table).to_sql();
        let text = sql.sql();
        let params: Vec<&SQLiteValue> = sql.params();
        self.observe(&text, &params);
        let mut stmt = self.conn.prepare_cached(&text)?;
        Ok(stmt.exists(rusqlite::params_from_iter(params))?)
    }
}

#[cfg(feature = "rusqlite")]
impl SchemaCatalog for ConnectionCatalog<'_> {
    fn schema(&self, table: &str) -> Result<Arc<TableSchema>> {
        if let Some(schema) = self.cache.get(table) {
            return Ok(schema);
        }
        match self.load(table)? {
            Some(schema) => {
                sqldb_core::sqldb_trace_schema!(table, schema.columns.len());
                Ok(self.cache.insert(schema))
            }
            None => Err(SchemaError::unknown_table(table).into()),
        }
    }
}
