//! Join Planner: expands a join tree into JOIN clauses and per-table field plans.
//!
//! Traversal is depth-first, parent before children, siblings in the order
//! given. The row reconstructor relies on the resulting field plan order, so
//! this order is also the column order of the SELECT list.

use compact_str::{CompactString, format_compact};

use crate::error::Result;
use crate::filter::{FilterGroup, compile_filters_with};
use crate::plan::{FieldPlan, FieldSelection, Scope, StripSet, TablePath};
use crate::schema::SchemaCatalog;
use crate::sql::SQL;
use crate::traits::SQLParam;

/// One node of a join tree.
///
/// Joins `table` to its parent with `table.src_field = parent.dst_field`.
/// `src_field` defaults to the id field and `dst_field` to `<table>_id`.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinSpec<V: SQLParam> {
    pub table: CompactString,
    pub src_field: Option<CompactString>,
    pub dst_field: Option<CompactString>,
    /// Filter groups scoped to this table; bare field names resolve here
    pub conditions: Vec<FilterGroup<V>>,
    pub fields: FieldSelection,
    pub joins: Vec<JoinSpec<V>>,
}

impl<V: SQLParam> JoinSpec<V> {
    pub fn new(table: impl Into<CompactString>) -> Self {
        Self {
            table: table.into(),
            src_field: None,
            dst_field: None,
            conditions: Vec::new(),
            fields: FieldSelection::All,
            joins: Vec::new(),
        }
    }

    pub fn src_field(mut self, field: impl Into<CompactString>) -> Self {
        self.src_field = Some(field.into());
        self
    }

    pub fn dst_field(mut self, field: impl Into<CompactString>) -> Self {
        self.dst_field = Some(field.into());
        self
    }

    pub fn condition(mut self, group: FilterGroup<V>) -> Self {
        self.conditions.push(group);
        self
    }

    pub fn conditions(mut self, groups: impl IntoIterator<Item = FilterGroup<V>>) -> Self {
        self.conditions.extend(groups);
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

    pub fn join(mut self, child: JoinSpec<V>) -> Self {
        self.joins.push(child);
        self
    }

    fn parent_field(&self) -> CompactString {
        self.dst_field
            .clone()
            .unwrap_or_else(|| format_compact!("{}_id", self.table))
    }
}

/// Everything a join tree contributes to a statement
#[derive(Clone, Debug, PartialEq)]
pub struct JoinPlan<V: SQLParam> {
    /// `JOIN "t" ON "t"."id" = "parent"."t_id" …`
    pub clauses: SQL<V>,
    /// One plan per joined table, in traversal order
    pub field_plans: Vec<FieldPlan>,
    pub strip: StripSet,
    /// Join conditions, each parenthesised and combined with `AND`
    pub filter: SQL<V>,
}

impl<V: SQLParam> Default for JoinPlan<V> {
    fn default() -> Self {
        Self {
            clauses: SQL::empty(),
            field_plans: Vec::new(),
            strip: StripSet::new(),
            filter: SQL::empty(),
        }
    }
}

/// Plans `joins` nested under the table at `parent`.
pub fn plan_joins<V, C>(
    scope: &Scope<'_, C>,
    parent: &[CompactString],
    joins: &[JoinSpec<V>],
) -> Result<JoinPlan<V>>
where
    V: SQLParam,
    C: SchemaCatalog,
{
    let mut plan = JoinPlan::default();
    plan_into(scope, parent, joins, &mut plan)?;
    Ok(plan)
}

fn plan_into<V, C>(
    scope: &Scope<'_, C>,
    parent: &[CompactString],
    joins: &[JoinSpec<V>],
    plan: &mut JoinPlan<V>,
) -> Result<()>
where
    V: SQLParam,
    C: SchemaCatalog,
{
    let Some(parent_table) = parent.last() else {
        return Ok(());
    };

    for join in joins {
        let table = join.table.as_str();
        let src = join.src_field.as_deref().unwrap_or(scope.id_field());
        let dst = join.parent_field();

        scope.catalog().validate_fields(table, [src])?;
        scope.catalog().validate_fields(parent_table, [dst.as_str()])?;

        plan.clauses.push(
            SQL::raw("JOIN")
                .append(SQL::ident(table))
                .append_raw("ON")
                .append(SQL::column(table, src))
                .append_raw("=")
                .append(SQL::column(parent_table, &dst)),
        );

        let parent_path: TablePath = parent.iter().cloned().collect();
        plan.strip.insert(parent_path, dst);

        let filter = compile_filters_with(&join.conditions, |field| scope.resolve(table, field))?;
        let combined = std::mem::take(&mut plan.filter);
        plan.filter = SQL::join([combined, filter], "AND");

        let mut path: TablePath = parent.iter().cloned().collect();
        path.push(join.table.clone());
        plan.field_plans.push(scope.field_plan(path.clone(), &join.fields)?);

        plan_into(scope, &path, &join.joins, plan)?;
    }
    Ok(())
}
