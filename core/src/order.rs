//! Order and pagination compilers.

use compact_str::CompactString;

use crate::error::Result;
use crate::schema::OrderBy;
use crate::sql::{SQL, ToSQL};
use crate::traits::SQLParam;

/// `max_pages` reported when a query is not paginated.
pub const NOT_PAGINATED: i64 = -1;

/// One `field direction` pair of an ORDER BY clause
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderTerm {
    /// A bare column name or a qualified `table.column` reference
    pub field: CompactString,
    pub direction: OrderBy,
}

impl OrderTerm {
    pub fn new(field: impl Into<CompactString>, direction: OrderBy) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<CompactString>) -> Self {
        Self::new(field, OrderBy::Asc)
    }

    pub fn desc(field: impl Into<CompactString>) -> Self {
        Self::new(field, OrderBy::Desc)
    }
}

/// Compiles `terms` into `ORDER BY a ASC, b DESC` with bare quoted identifiers.
pub fn compile_order<V: SQLParam>(terms: &[OrderTerm]) -> SQL<V> {
    // infallible resolver
    compile_order_with(terms, |field| Ok(SQL::ident(field))).unwrap_or_default()
}

/// Compiles `terms`, resolving each field with `resolve`. Input order is kept;
/// the first term is the primary sort key.
pub fn compile_order_with<V, F>(terms: &[OrderTerm], mut resolve: F) -> Result<SQL<V>>
where
    V: SQLParam,
    F: FnMut(&str) -> Result<SQL<V>>,
{
    if terms.is_empty() {
        return Ok(SQL::empty());
    }
    let mut keys = Vec::with_capacity(terms.len());
    for term in terms {
        keys.push(resolve(&term.field)?.append(term.direction.to_sql()));
    }
    Ok(SQL::raw("ORDER BY").append(SQL::join(keys, ", ")))
}

/// Page window of a paginated query. `limit == 0` disables pagination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u64,
    /// Zero-based page index
    pub page: u64,
}

impl Pagination {
    pub const fn new(limit: u64, page: u64) -> Self {
        Self { limit, page }
    }

    pub const fn is_paginated(&self) -> bool {
        self.limit > 0
    }

    /// Rows skipped before this page
    pub const fn offset(&self) -> u64 {
        self.page.saturating_mul(self.limit)
    }

    /// `LIMIT ? OFFSET ?`, or nothing when not paginated
    pub fn to_sql<V: SQLParam>(&self) -> SQL<V> {
        if !self.is_paginated() {
            return SQL::empty();
        }
        SQL::raw("LIMIT")
            .append(SQL::parameter(clamp(self.limit)))
            .append_raw("OFFSET")
            .append(SQL::parameter(clamp(self.offset())))
    }

    /// Total number of pages for `count` matching rows.
    ///
    /// Returns [`NOT_PAGINATED`] when `limit` is zero.
    pub fn max_pages(&self, count: u64) -> i64 {
        if self.is_paginated() {
            clamp(max_pages(count, self.limit))
        } else {
            NOT_PAGINATED
        }
    }
}

/// `ceil(count / limit)`, with `limit` floored to 1
pub const fn max_pages(count: u64, limit: u64) -> u64 {
    let limit = if limit == 0 { 1 } else { limit };
    count.div_ceil(limit)
}

fn clamp(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
