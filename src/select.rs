//! Reads: nested selects with pagination, distinct values and counts.

use compact_str::CompactString;
use serde::Serialize;
use sqldb_core::{
    FilterGroup, OrderTerm, Pagination, QueryPlan, Select, plan_distinct, plan_select,
};
use sqldb_sqlite::{SQLiteRecord, SQLiteValue};

use crate::Result;
use crate::database::SQLiteDatabase;

/// One page of reconstructed records.
///
/// `max_pages` is -1 when the request was not paginated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub records: Vec<SQLiteRecord>,
    pub max_pages: i64,
}

impl Page {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl IntoIterator for Page {
    type Item = SQLiteRecord;
    type IntoIter = std::vec::IntoIter<SQLiteRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl SQLiteDatabase {
    /// Validates and plans `select` without running it
    pub fn plan(&self, select: &Select<SQLiteValue>) -> Result<QueryPlan<SQLiteValue>> {
        plan_select(&self.catalog(), self.id_field(), select)
    }

    /// Runs `select` and reconstructs every row into a nested record.
    ///
    /// When paginated, the matching rows are counted first to fill in
    /// [`Page::max_pages`]. The count and the fetch are separate statements.
    pub fn get(&self, select: &Select<SQLiteValue>) -> Result<Page> {
        let plan = self.plan(select)?;
        let max_pages = if plan.pagination.is_paginated() {
            let count = self.query_count(&plan.count)?;
            plan.max_pages(count)
        } else {
            sqldb_core::NOT_PAGINATED
        };

        let records = self
            .query_rows(&plan.statement, plan.width())?
            .into_iter()
            .map(|row| plan.reconstruct(row))
            .collect::<Result<Vec<_>>>()?;

        Ok(Page { records, max_pages })
    }

    /// The first record matching `select`, ignoring its pagination
    pub fn get_one(&self, select: &Select<SQLiteValue>) -> Result<Option<SQLiteRecord>> {
        let mut select = select.clone();
        select.pagination = Pagination::new(1, 0);
        let plan = self.plan(&select)?;
        self.query_rows(&plan.statement, plan.width())?
            .into_iter()
            .next()
            .map(|row| plan.reconstruct(row))
            .transpose()
    }

    /// Distinct combinations of `fields` among rows of `table` matching `filters`.
    ///
    /// Records hold exactly the requested fields.
    pub fn get_unique<I>(
        &self,
        table: &str,
        fields: I,
        filters: &[FilterGroup<SQLiteValue>],
        order: &[OrderTerm],
    ) -> Result<Vec<SQLiteRecord>>
    where
        I: IntoIterator,
        I::Item: Into<CompactString>,
    {
        let fields: Vec<CompactString> = fields.into_iter().map(Into::into).collect();
        let plan = plan_distinct(&self.catalog(), table, &fields, filters, order)?;
        self.query_rows(&plan.statement, plan.fields.len())?
            .into_iter()
            .map(|row| plan.record(row))
            .collect()
    }

    /// Number of rows of `table` matching `filters`
    pub fn count(&self, table: &str, filters: &[FilterGroup<SQLiteValue>]) -> Result<u64> {
        let select = Select::new(table).filters(filters.iter().cloned());
        let plan = self.plan(&select)?;
        self.query_count(&plan.count)
    }
}
