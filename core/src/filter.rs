//! Filter Compiler: turns filter groups into a parenthesised WHERE fragment.
//!
//! Conditions inside a group are combined with `AND`; groups are combined
//! with `OR` and the whole result is wrapped in parentheses so it can be
//! `AND`-ed with other fragments. Every value is bound as a parameter except
//! NULL, which is always rendered as a keyword.

use compact_str::CompactString;

use crate::error::{Result, SqlDbError};
use crate::sql::SQL;
use crate::traits::SQLParam;

/// Comparison operator of a single filter condition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Comparison {
    Eq,
    Ne,
    In,
    NotIn,
    Like,
    Unlike,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "!=",
            Comparison::In => "IN",
            Comparison::NotIn => "NOT IN",
            Comparison::Like => "LIKE",
            Comparison::Unlike => "NOT LIKE",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }

    /// Whether the operator compares against a set of values
    pub const fn takes_list(&self) -> bool {
        matches!(self, Comparison::In | Comparison::NotIn)
    }
}

/// Right-hand side of a condition
#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue<V: SQLParam> {
    Null,
    Scalar(V),
    List(Vec<V>),
}

impl<V: SQLParam> FilterValue<V> {
    /// Wraps a scalar, mapping the dialect's NULL to [`FilterValue::Null`]
    pub fn scalar(value: impl Into<V>) -> Self {
        let value = value.into();
        if value.is_null() {
            FilterValue::Null
        } else {
            FilterValue::Scalar(value)
        }
    }

    pub fn list<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<V>,
    {
        FilterValue::List(values.into_iter().map(Into::into).collect())
    }

    /// Number of parameters this value binds
    pub fn bound_len(&self) -> usize {
        match self {
            FilterValue::Null => 0,
            FilterValue::Scalar(_) => 1,
            FilterValue::List(values) => values.len(),
        }
    }
}

/// One `field <op> value` comparison
#[derive(Clone, Debug, PartialEq)]
pub struct Condition<V: SQLParam> {
    pub comparison: Comparison,
    /// A bare column name or a qualified `table.column` reference
    pub field: CompactString,
    pub value: FilterValue<V>,
}

impl<V: SQLParam> Condition<V> {
    pub fn new(
        comparison: Comparison,
        field: impl Into<CompactString>,
        value: FilterValue<V>,
    ) -> Self {
        Self {
            comparison,
            field: field.into(),
            value,
        }
    }

    fn to_sql(&self, column: SQL<V>) -> Result<SQL<V>> {
        let op = self.comparison;
        let rhs = match (&self.value, op) {
            (FilterValue::Null, Comparison::Eq) => return Ok(column.append_raw("IS NULL")),
            (FilterValue::Null, Comparison::Ne) => return Ok(column.append_raw("IS NOT NULL")),
            (FilterValue::Null, Comparison::In | Comparison::NotIn) => {
                return Err(SqlDbError::InvalidQuery(format!(
                    "{} on {} expects a list of values",
                    op.as_str(),
                    self.field
                )));
            }
            (FilterValue::Null, _) => SQL::raw("NULL"),
            (FilterValue::List(values), Comparison::In | Comparison::NotIn) => {
                SQL::parameters(values.iter().cloned()).parens()
            }
            (FilterValue::Scalar(_), Comparison::In | Comparison::NotIn) => {
                return Err(SqlDbError::InvalidQuery(format!(
                    "{} on {} expects a list of values",
                    op.as_str(),
                    self.field
                )));
            }
            (FilterValue::List(_), _) => {
                return Err(SqlDbError::InvalidQuery(format!(
                    "{} on {} expects a single value",
                    op.as_str(),
                    self.field
                )));
            }
            (FilterValue::Scalar(value), _) => SQL::parameter(value.clone()),
        };
        Ok(column.append_raw(op.as_str()).append(rhs))
    }
}

/// A set of conditions combined with `AND`.
///
/// ```
/// # use sqldb_core::FilterGroup;
/// # fn demo<V: sqldb_core::SQLParam + From<&'static str>>() {
/// let group = FilterGroup::<V>::new().eq("name", "alpha").is_in("id", [1i64, 2]);
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FilterGroup<V: SQLParam> {
    pub conditions: Vec<Condition<V>>,
}

impl<V: SQLParam> Default for FilterGroup<V> {
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }
}

impl<V: SQLParam> FilterGroup<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an arbitrary condition. Shape mismatches are reported when compiled.
    pub fn condition(
        mut self,
        comparison: Comparison,
        field: impl Into<CompactString>,
        value: FilterValue<V>,
    ) -> Self {
        self.conditions.push(Condition::new(comparison, field, value));
        self
    }

    fn scalar(self, comparison: Comparison, field: impl Into<CompactString>, value: impl Into<V>) -> Self {
        self.condition(comparison, field, FilterValue::scalar(value))
    }

    /// `field = value`, or `field IS NULL` when `value` is NULL
    pub fn eq(self, field: impl Into<CompactString>, value: impl Into<V>) -> Self {
        self.scalar(Comparison::Eq, field, value)
    }

    /// `field != value`, or `field IS NOT NULL` when `value` is NULL
    pub fn ne(self, field: impl Into<CompactString>, value: impl Into<V>) -> Self {
        self.scalar(Comparison::Ne, field, value)
    }

    pub fn is_null(self, field: impl Into<CompactString>) -> Self {
        self.condition(Comparison::Eq, field, FilterValue::Null)
    }

    pub fn is_not_null(self, field: impl Into<CompactString>) -> Self {
        self.condition(Comparison::Ne, field, FilterValue::Null)
    }

    pub fn is_in<I>(self, field: impl Into<CompactString>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<V>,
    {
        self.condition(Comparison::In, field, FilterValue::list(values))
    }

    pub fn not_in<I>(self, field: impl Into<CompactString>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<V>,
    {
        self.condition(Comparison::NotIn, field, FilterValue::list(values))
    }

    pub fn like(self, field: impl Into<CompactString>, pattern: impl Into<V>) -> Self {
        self.scalar(Comparison::Like, field, pattern)
    }

    pub fn unlike(self, field: impl Into<CompactString>, pattern: impl Into<V>) -> Self {
        self.scalar(Comparison::Unlike, field, pattern)
    }

    pub fn lt(self, field: impl Into<CompactString>, value: impl Into<V>) -> Self {
        self.scalar(Comparison::Lt, field, value)
    }

    pub fn le(self, field: impl Into<CompactString>, value: impl Into<V>) -> Self {
        self.scalar(Comparison::Le, field, value)
    }

    pub fn gt(self, field: impl Into<CompactString>, value: impl Into<V>) -> Self {
        self.scalar(Comparison::Gt, field, value)
    }

    pub fn ge(self, field: impl Into<CompactString>, value: impl Into<V>) -> Self {
        self.scalar(Comparison::Ge, field, value)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().map(|c| c.field.as_str())
    }
}

/// Compiles `groups` with every field rendered as a bare quoted identifier.
///
/// Field names are not checked here; see [`compile_filters_with`].
pub fn compile_filters<V: SQLParam>(groups: &[FilterGroup<V>]) -> Result<SQL<V>> {
    compile_filters_with(groups, |field| Ok(SQL::ident(field)))
}

/// Compiles `groups`, resolving each field name to a column fragment with `resolve`.
///
/// Groups with no conditions are skipped. Returns an empty fragment when no
/// group has a condition.
pub fn compile_filters_with<V, F>(groups: &[FilterGroup<V>], mut resolve: F) -> Result<SQL<V>>
where
    V: SQLParam,
    F: FnMut(&str) -> Result<SQL<V>>,
{
    let mut compiled = Vec::with_capacity(groups.len());
    for group in groups.iter().filter(|group| !group.is_empty()) {
        let mut conditions = Vec::with_capacity(group.conditions.len());
        for condition in &group.conditions {
            let column = resolve(&condition.field)?;
            conditions.push(condition.to_sql(column)?);
        }
        compiled.push(SQL::join(conditions, "AND").parens());
    }
    if compiled.is_empty() {
        return Ok(SQL::empty());
    }
    Ok(SQL::join(compiled, "OR").parens())
}
