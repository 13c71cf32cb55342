//! Query Assembler: composes the compilers into executable SELECT statements.

use compact_str::CompactString;

use crate::error::{Result, SqlDbError};
use crate::filter::{FilterGroup, compile_filters_with};
use crate::join::{JoinSpec, plan_joins};
use crate::order::{OrderTerm, Pagination, compile_order_with};
use crate::plan::{FieldPlan, FieldSelection, Scope, StripSet, TablePath};
use crate::row::{Record, reconstruct};
use crate::schema::{OrderBy, SchemaCatalog};
use crate::sql::SQL;
use crate::traits::SQLParam;

/// A structured SELECT request.
///
/// ```ignore
/// let select = Select::new("user")
///     .filter(FilterGroup::new().gt("age", 20))
///     .join(JoinSpec::new("post").fields(["title"]))
///     .order_by("id", OrderBy::Desc)
///     .limit(10)
///     .page(2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Select<V: SQLParam> {
    pub table: CompactString,
    pub filters: Vec<FilterGroup<V>>,
    pub fields: FieldSelection,
    pub joins: Vec<JoinSpec<V>>,
    pub order: Vec<OrderTerm>,
    pub pagination: Pagination,
}

impl<V: SQLParam> Select<V> {
    pub fn new(table: impl Into<CompactString>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            fields: FieldSelection::All,
            joins: Vec::new(),
            order: Vec::new(),
            pagination: Pagination::default(),
        }
    }

    /// Adds a filter group, OR-ed with any others
    pub fn filter(mut self, group: FilterGroup<V>) -> Self {
        self.filters.push(group);
        self
    }

    pub fn filters(mut self, groups: impl IntoIterator<Item = FilterGroup<V>>) -> Self {
        self.filters.extend(groups);
        self
    }

    pub fn fields<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<CompactString>,
    {
        self.fields = FieldSelection::only(fields);
        self
    }

    pub fn all_fields(mut self) -> Self {
        self.fields = FieldSelection::All;
        self
    }

    pub fn join(mut self, join: JoinSpec<V>) -> Self {
        self.joins.push(join);
        self
    }

    pub fn joins(mut self, joins: impl IntoIterator<Item = JoinSpec<V>>) -> Self {
        self.joins.extend(joins);
        self
    }

    pub fn order_by(mut self, field: impl Into<CompactString>, direction: OrderBy) -> Self {
        self.order.push(OrderTerm::new(field, direction));
        self
    }

    /// Page size. Zero disables pagination.
    pub fn limit(mut self, limit: u64) -> Self {
        self.pagination.limit = limit;
        self
    }

    /// Zero-based page index
    pub fn page(mut self, page: u64) -> Self {
        self.pagination.page = page;
        self
    }
}

/// A planned SELECT and the bookkeeping needed to decode its rows
#[derive(Clone, Debug, PartialEq)]
pub struct QueryPlan<V: SQLParam> {
    pub statement: SQL<V>,
    /// `SELECT COUNT(*)` over the same joins and filters, without order or limit
    pub count: SQL<V>,
    pub field_plans: Vec<FieldPlan>,
    pub strip: StripSet,
    pub pagination: Pagination,
}

impl<V: SQLParam> QueryPlan<V> {
    pub fn sql(&self) -> String {
        self.statement.sql()
    }

    pub fn params(&self) -> Vec<&V> {
        self.statement.params()
    }

    /// Number of columns every result row must have
    pub fn width(&self) -> usize {
        self.field_plans.iter().map(FieldPlan::len).sum()
    }

    pub fn reconstruct(&self, row: Vec<V>) -> Result<Record<V>> {
        reconstruct(row, &self.field_plans, &self.strip)
    }

    /// Page count for `count` matching rows, or -1 when not paginated
    pub fn max_pages(&self, count: u64) -> i64 {
        self.pagination.max_pages(count)
    }
}

/// Plans `select` against `catalog`.
///
/// Every table and field is validated before any text is built. Bound values
/// are ordered root filter, join filters, then `LIMIT` and `OFFSET`.
pub fn plan_select<V, C>(catalog: &C, id_field: &str, select: &Select<V>) -> Result<QueryPlan<V>>
where
    V: SQLParam,
    C: SchemaCatalog,
{
    let root = select.table.as_str();
    let scope = Scope::new(catalog, id_field, root, &select.joins);
    let mut path = TablePath::new();
    path.push(select.table.clone());

    let root_plan = scope.field_plan(path.clone(), &select.fields)?;
    let root_filter = compile_filters_with(&select.filters, |field| scope.resolve(root, field))?;
    let joins = plan_joins(&scope, &path, &select.joins)?;
    let order = compile_order_with(&select.order, |field| scope.resolve(root, field))?;

    let filter = SQL::join([root_filter, joins.filter], "AND");
    let where_clause = if filter.is_empty() {
        SQL::empty()
    } else {
        SQL::raw("WHERE").append(filter)
    };
    let from = SQL::raw("FROM")
        .append(SQL::ident(root))
        .append(joins.clauses);

    let mut field_plans = Vec::with_capacity(joins.field_plans.len() + 1);
    field_plans.push(root_plan);
    field_plans.extend(joins.field_plans);

    let count = SQL::raw("SELECT COUNT(*)")
        .append(from.clone())
        .append(where_clause.clone());
    let statement = SQL::raw("SELECT")
        .append(SQL::join(field_plans.iter().map(FieldPlan::select_list), ", "))
        .append(from)
        .append(where_clause)
        .append(order)
        .append(select.pagination.to_sql());

    Ok(QueryPlan {
        statement,
        count,
        field_plans,
        strip: joins.strip,
        pagination: select.pagination,
    })
}

/// A `SELECT DISTINCT` over plain columns of one table
#[derive(Clone, Debug, PartialEq)]
pub struct DistinctPlan<V: SQLParam> {
    pub statement: SQL<V>,
    pub fields: Vec<CompactString>,
}

impl<V: SQLParam> DistinctPlan<V> {
    /// Zips a result row with the selected field names
    pub fn record(&self, row: Vec<V>) -> Result<Record<V>> {
        if row.len() != self.fields.len() {
            return Err(SqlDbError::Structural(format!(
                "expected {} columns, got {}",
                self.fields.len(),
                row.len()
            )));
        }
        Ok(self.fields.iter().cloned().zip(row).collect())
    }
}

/// Plans the distinct combinations of `fields` among rows matching `filters`.
pub fn plan_distinct<V, C>(
    catalog: &C,
    table: &str,
    fields: &[CompactString],
    filters: &[FilterGroup<V>],
    order: &[OrderTerm],
) -> Result<DistinctPlan<V>>
where
    V: SQLParam,
    C: SchemaCatalog,
{
    if fields.is_empty() {
        return Err(SqlDbError::InvalidQuery(format!(
            "no fields given for distinct values of {table}"
        )));
    }
    catalog.validate_fields(table, fields.iter())?;
    let scope = Scope::new::<V>(catalog, "", table, &[]);
    let filter = compile_filters_with(filters, |field| scope.resolve(table, field))?;
    let order = compile_order_with(order, |field| scope.resolve(table, field))?;

    let columns = SQL::join(fields.iter().map(|f| SQL::column(table, f)), ", ");
    let mut statement = SQL::raw("SELECT DISTINCT")
        .append(columns)
        .append_raw("FROM")
        .append(SQL::ident(table));
    if !filter.is_empty() {
        statement.push(SQL::raw("WHERE").append(filter));
    }
    statement.push(order);

    Ok(DistinctPlan {
        statement,
        fields: fields.to_vec(),
    })
}
