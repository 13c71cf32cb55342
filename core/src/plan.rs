//! Per-request bookkeeping shared by the planners and the row reconstructor.

use compact_str::{CompactString, ToCompactString};
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use crate::error::{Result, SchemaError};
use crate::join::JoinSpec;
use crate::schema::SchemaCatalog;
use crate::sql::{SQL, quote_literal};
use crate::traits::SQLParam;

/// Name of the synthetic column carrying a record's table of origin.
pub const TYPE_FIELD: &str = "type";

/// Table names from the root of a request down to one joined table
pub type TablePath = SmallVec<[CompactString; 2]>;

/// Which columns to select from a table
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FieldSelection {
    /// Every column, in declaration order
    #[default]
    All,
    /// The listed columns. The id field is appended if missing.
    Only(Vec<CompactString>),
}

impl FieldSelection {
    /// Builds a selection from a field list. An empty list or a lone `*` selects everything.
    pub fn only<I>(fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<CompactString>,
    {
        let fields: Vec<CompactString> = fields.into_iter().map(Into::into).collect();
        match fields.as_slice() {
            [] => FieldSelection::All,
            [star] if star == "*" => FieldSelection::All,
            _ => FieldSelection::Only(fields),
        }
    }
}

/// The ordered columns selected for one table of a request.
///
/// The last entry of `fields` is always [`TYPE_FIELD`]; its value is the
/// table name, selected as a literal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPlan {
    pub path: TablePath,
    pub fields: Vec<CompactString>,
}

impl FieldPlan {
    pub fn new(path: TablePath, columns: impl IntoIterator<Item = CompactString>) -> Self {
        let mut fields: Vec<CompactString> = columns.into_iter().collect();
        fields.push(CompactString::const_new(TYPE_FIELD));
        Self { path, fields }
    }

    pub fn table(&self) -> &str {
        self.path.last().map_or("", |t| t.as_str())
    }

    /// Number of result columns this plan consumes, including the type column
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Path of the table this one is nested under, `None` for the root
    pub fn parent_path(&self) -> Option<&[CompactString]> {
        match self.path.split_last() {
            Some((_, parent)) if !parent.is_empty() => Some(parent),
            _ => None,
        }
    }

    /// Columns without the trailing type column
    pub fn columns(&self) -> &[CompactString] {
        self.fields
            .split_last()
            .map(|(_, columns)| columns)
            .unwrap_or_default()
    }

    /// `"t"."a", "t"."b", 't' AS "type"`
    pub fn select_list<V: SQLParam>(&self) -> SQL<V> {
        let table = self.table();
        let columns = self.columns().iter().map(|c| SQL::column(table, c));
        let type_column = SQL::raw(quote_literal(table))
            .append_raw("AS")
            .append(SQL::ident(TYPE_FIELD));
        SQL::join(columns.chain(std::iter::once(type_column)), ", ")
    }
}

/// Foreign-key columns to drop from reconstructed records, keyed by table path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StripSet {
    entries: HashMap<TablePath, SmallVec<[CompactString; 2]>>,
}

impl StripSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: TablePath, field: impl Into<CompactString>) {
        let field = field.into();
        let fields = self.entries.entry(path).or_default();
        if !fields.contains(&field) {
            fields.push(field);
        }
    }

    /// Fields stripped from the table at `path`
    pub fn get(&self, path: &[CompactString]) -> &[CompactString] {
        self.entries
            .get(path)
            .map(|fields| fields.as_slice())
            .unwrap_or_default()
    }

    pub fn contains(&self, path: &[CompactString], field: &str) -> bool {
        self.get(path).iter().any(|f| f == field)
    }

    pub fn extend(&mut self, other: StripSet) {
        for (path, fields) in other.entries {
            for field in fields {
                self.insert(path.clone(), field);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves and validates the field names of one request.
///
/// A bare name belongs to the table whose conditions or ordering mention it.
/// A qualified `table.field` may name any table of the request.
pub struct Scope<'a, C> {
    catalog: &'a C,
    id_field: &'a str,
    tables: HashSet<CompactString>,
}

impl<'a, C: SchemaCatalog> Scope<'a, C> {
    pub fn new<V: SQLParam>(
        catalog: &'a C,
        id_field: &'a str,
        root: &str,
        joins: &[JoinSpec<V>],
    ) -> Self {
        let mut tables = HashSet::new();
        tables.insert(root.to_compact_string());
        let mut pending: Vec<&JoinSpec<V>> = joins.iter().collect();
        while let Some(join) = pending.pop() {
            tables.insert(join.table.clone());
            pending.extend(join.joins.iter());
        }
        Self {
            catalog,
            id_field,
            tables,
        }
    }

    pub fn catalog(&self) -> &'a C {
        self.catalog
    }

    pub fn id_field(&self) -> &'a str {
        self.id_field
    }

    /// Whether `table` is the root or any joined table of the request
    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.contains(table)
    }

    /// Validates `field` and renders it as a qualified column.
    pub fn resolve<V: SQLParam>(&self, default_table: &str, field: &str) -> Result<SQL<V>> {
        let (table, column) = match field.split_once('.') {
            Some((table, column)) => {
                if !self.contains_table(table) {
                    return Err(SchemaError::unknown_table(table).into());
                }
                (table, column)
            }
            None => (default_table, field),
        };
        self.catalog.validate_fields(table, [column])?;
        Ok(SQL::column(table, column))
    }

    /// Applies the field-selection rule to the table at `path`.
    pub fn field_plan(&self, path: TablePath, selection: &FieldSelection) -> Result<FieldPlan> {
        let table = path.last().map_or("", |t| t.as_str());
        let columns: Vec<CompactString> = match selection {
            FieldSelection::All => {
                let schema = self.catalog.schema(table)?;
                schema.columns.iter().map(|c| c.name.clone()).collect()
            }
            FieldSelection::Only(fields) => {
                let mut fields = fields.clone();
                if !fields.iter().any(|f| f == self.id_field) {
                    fields.push(self.id_field.to_compact_string());
                }
                self.catalog.validate_fields(table, fields.iter())?;
                fields
            }
        };
        Ok(FieldPlan::new(path, columns))
    }
}
