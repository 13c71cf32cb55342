pub mod error;
pub mod filter;
pub mod join;
pub mod order;
pub mod params;
pub mod plan;
pub mod query;
pub mod row;
pub mod schema;
pub mod sql;
pub mod tracing;
pub mod traits;

// Re-export key types and traits
pub use error::{Result, SchemaError, SqlDbError};
pub use filter::{Comparison, Condition, FilterGroup, FilterValue, compile_filters, compile_filters_with};
pub use join::{JoinPlan, JoinSpec, plan_joins};
pub use order::{NOT_PAGINATED, OrderTerm, Pagination, compile_order, compile_order_with, max_pages};
pub use params::{Param, Placeholder, PlaceholderStyle};
pub use plan::{FieldPlan, FieldSelection, Scope, StripSet, TYPE_FIELD, TablePath};
pub use query::{DistinctPlan, QueryPlan, Select, plan_distinct, plan_select};
pub use row::{Record, RecordValue, reconstruct};
pub use schema::{ColumnInfo, OrderBy, SchemaCatalog, StaticCatalog, TableSchema};
pub use sql::{SQL, SQLChunk, ToSQL, quote_literal};
pub use traits::*;
