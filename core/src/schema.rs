//! Table metadata and the catalog that validates identifiers against it.
//!
//! Identifiers (table and column names) can't be bound as parameters, so the
//! catalog is the only thing standing between caller-supplied names and the
//! statement text. Every name interpolated by the planners has passed through
//! [`SchemaCatalog::validate_table`] or [`SchemaCatalog::validate_fields`].

use std::sync::Arc;

use compact_str::CompactString;
use hashbrown::HashMap;

use crate::error::{Result, SchemaError};
use crate::sql::{SQL, ToSQL};
use crate::traits::SQLParam;

/// Sort direction for ORDER BY clauses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrderBy {
    #[default]
    Asc,
    Desc,
}

impl OrderBy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderBy::Asc => "ASC",
            OrderBy::Desc => "DESC",
        }
    }
}

impl<V: SQLParam> ToSQL<V> for OrderBy {
    fn to_sql(&self) -> SQL<V> {
        SQL::raw(self.as_str())
    }
}

/// One column as reported by `pragma_table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ColumnInfo {
    pub name: CompactString,
    /// Declared type, e.g. `integer` or `text`. May be empty.
    pub r#type: CompactString,
    pub not_null: bool,
    pub default: Option<String>,
    pub primary_key: bool,
}

impl ColumnInfo {
    /// A nullable column with the given declared type
    pub fn new(name: impl Into<CompactString>, r#type: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            r#type: r#type.into(),
            not_null: false,
            default: None,
            primary_key: false,
        }
    }
}

/// Column metadata for one table, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableSchema {
    pub name: CompactString,
    pub columns: Vec<ColumnInfo>,
}

impl TableSchema {
    pub fn new(name: impl Into<CompactString>, columns: impl IntoIterator<Item = ColumnInfo>) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().collect(),
        }
    }

    /// Builds a schema from bare column names with no declared types
    pub fn from_names<I, S>(name: impl Into<CompactString>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        Self::new(name, columns.into_iter().map(|c| ColumnInfo::new(c, "")))
    }

    pub fn contains(&self, field: &str) -> bool {
        self.column(field).is_some()
    }

    pub fn column(&self, field: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == field)
    }

    /// Declared type of `field`
    pub fn column_type(&self, field: &str) -> Option<&str> {
        self.column(field).map(|c| c.r#type.as_str())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Fields of `fields` that are not columns of this table
    pub fn unknown_fields<'f, I, S>(&self, fields: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'f S>,
        S: AsRef<str> + ?Sized + 'f,
    {
        fields
            .into_iter()
            .map(|f: &'f S| -> &'f str { f.as_ref() })
            .filter(|f| !self.contains(f))
            .map(str::to_string)
            .collect()
    }
}

/// Source of table metadata used to validate identifiers.
pub trait SchemaCatalog {
    /// Column metadata for `table`.
    ///
    /// Fails with [`SchemaError::UnknownTable`] if the table does not exist.
    fn schema(&self, table: &str) -> Result<Arc<TableSchema>>;

    /// Fails with [`SchemaError::UnknownTable`] if the table does not exist.
    fn validate_table(&self, table: &str) -> Result<()> {
        self.schema(table).map(|_| ())
    }

    /// Fails with [`SchemaError::UnknownFields`] naming every field that is not
    /// a column of `table`.
    fn validate_fields<'f, I, S>(&self, table: &str, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = &'f S>,
        S: AsRef<str> + ?Sized + 'f,
    {
        let schema = self.schema(table)?;
        let unknown = schema.unknown_fields(fields);
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::unknown_fields(table, unknown).into())
        }
    }
}

impl<C: SchemaCatalog + ?Sized> SchemaCatalog for &C {
    fn schema(&self, table: &str) -> Result<Arc<TableSchema>> {
        (**self).schema(table)
    }

    fn validate_table(&self, table: &str) -> Result<()> {
        (**self).validate_table(table)
    }
}

/// A fixed, in-memory catalog.
///
/// Lets queries be planned and inspected without a connection.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    tables: HashMap<CompactString, Arc<TableSchema>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: TableSchema) -> Self {
        self.insert(table);
        self
    }

    pub fn insert(&mut self, table: TableSchema) {
        self.tables.insert(table.name.clone(), Arc::new(table));
    }
}

impl SchemaCatalog for StaticCatalog {
    fn schema(&self, table: &str) -> Result<Arc<TableSchema>> {
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| SchemaError::unknown_table(table).into())
    }
}
