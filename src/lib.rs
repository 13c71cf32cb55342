//! # sqldb
//!
//! Schema-validated query construction and nested row reconstruction for SQLite.
//!
//! Requests are plain values: filter groups, a join tree, an order and a page.
//! Every table and field is checked against the live schema before any
//! statement text is built, every value is bound as a parameter, and joined
//! rows come back as nested records keyed by table name.
//!
//! ## Quick Start
//!
//! ```rust
//! use sqldb::prelude::*;
//!
//! # fn main() -> sqldb::Result<()> {
//! let db = SQLiteDatabase::builder(":memory:")
//!     .schema_sql(
//!         "CREATE TABLE project (id integer PRIMARY KEY, name text NOT NULL);
//!          CREATE TABLE user (
//!              id integer PRIMARY KEY,
//!              name text NOT NULL,
//!              project_id integer REFERENCES project(id)
//!          );",
//!     )
//!     .open()?;
//!
//! let project = db.create("project", fields! { "name" => "alpha" })?;
//! db.create("user", fields! { "name" => "ann", "project_id" => project })?;
//!
//! let user = db
//!     .get_one(&Select::new("user").join(JoinSpec::new("project")))?
//!     .expect("one user");
//! assert_eq!(user.table(), Some("user"));
//! assert!(!user.contains_key("project_id"));
//! assert_eq!(
//!     user.record("project").and_then(|p| p.value("name")),
//!     Some(&SQLiteValue::from("alpha"))
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Known limitation
//!
//! A join that matches several child rows yields one record per combination,
//! not a list of children under one parent.

mod config;
mod crud;
mod database;
mod macros;
mod select;
mod transaction;

// =============================================================================
// Root-level exports
// =============================================================================

/// Result type for sqldb operations
pub use sqldb_core::error::Result;

/// Error types
pub mod error {
    pub use crate::config::ConfigError;
    pub use sqldb_core::error::{SchemaError, SqlDbError};
}

pub use compact_str::CompactString;

pub use config::{DatabaseConfig, MEMORY_PATH};
pub use crud::Fields;
pub use database::{DatabaseBuilder, SQLiteDatabase, StatementHook};
pub use select::Page;
pub use transaction::TxState;

pub use sqldb_sqlite::{SQLiteRecord, SQLiteSQL, SQLiteTransactionType, SQLiteValue};

// =============================================================================
// Core module - dialect independent planning
// =============================================================================

/// Compilers, planners and record types shared with other backends.
///
/// These work against any [`SchemaCatalog`](sqldb_core::SchemaCatalog), so a
/// request can be planned and inspected without a connection:
///
/// ```rust
/// use sqldb::core::{ColumnInfo, FilterGroup, Select, StaticCatalog, TableSchema, plan_select};
/// use sqldb::SQLiteValue;
///
/// let catalog = StaticCatalog::new().with_table(TableSchema::new(
///     "user",
///     [ColumnInfo::new("id", "integer"), ColumnInfo::new("age", "integer")],
/// ));
/// let select = Select::<SQLiteValue>::new("user").filter(FilterGroup::new().gt("age", 20));
/// let plan = plan_select(&catalog, "id", &select).unwrap();
/// assert_eq!(
///     plan.sql(),
///     r#"SELECT "user"."id", "user"."age", 'user' AS "type" FROM "user" WHERE (("user"."age" > ?))"#
/// );
/// ```
pub mod core {
    pub use sqldb_core::{
        ColumnInfo, Comparison, Condition, DistinctPlan, FieldPlan, FieldSelection, FilterGroup,
        FilterValue, JoinPlan, JoinSpec, NOT_PAGINATED, OrderBy, OrderTerm, Pagination,
        QueryPlan, Record, RecordValue, SQL, SQLChunk, SQLParam, SchemaCatalog, Select,
        StaticCatalog, StripSet, TYPE_FIELD, TablePath, TableSchema, ToSQL, compile_filters,
        compile_order, max_pages, plan_distinct, plan_joins, plan_select, reconstruct,
    };
}

/// SQLite specifics: pragmas and the connection-backed catalog
pub mod sqlite {
    pub use sqldb_sqlite::{ConnectionCatalog, SchemaCache, pragma::Pragma};
}

/// Everything needed to open a database and build requests.
pub mod prelude {
    pub use crate::fields;
    pub use crate::{
        DatabaseBuilder, DatabaseConfig, Fields, Page, SQLiteDatabase, SQLiteRecord,
        SQLiteTransactionType, SQLiteValue,
    };
    pub use sqldb_core::{
        FilterGroup, JoinSpec, NOT_PAGINATED, OrderBy, OrderTerm, RecordValue, Select,
    };
}
