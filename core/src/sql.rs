use compact_str::{CompactString, ToCompactString};
use smallvec::{SmallVec, smallvec};
use std::fmt::Display;

use crate::{Param, Placeholder, traits::SQLParam};

/// A SQL chunk represents a part of an SQL statement.
///
/// Identifiers only ever enter a statement through [`SQLChunk::Ident`] and
/// [`SQLChunk::Column`], which callers construct from catalog-validated names.
#[derive(Debug, Clone, PartialEq)]
pub enum SQLChunk<V: SQLParam> {
    Text(CompactString),
    Param(Param<V>),
    /// A quoted identifier: `"name"`
    Ident(CompactString),
    /// A qualified column reference: `"table"."column"`
    Column {
        table: CompactString,
        column: CompactString,
    },
}

impl<V: SQLParam> SQLChunk<V> {
    /// Creates a text chunk
    pub fn text(text: impl AsRef<str>) -> Self {
        Self::Text(text.as_ref().to_compact_string())
    }

    /// Creates a positional parameter chunk
    pub const fn param(value: V) -> Self {
        Self::Param(Param::positional(value))
    }

    /// Write chunk to buffer
    pub(crate) fn write_to_buffer(&self, buf: &mut String) {
        match self {
            SQLChunk::Text(text) => buf.push_str(text),
            SQLChunk::Param(Param { placeholder, .. }) => buf.push_str(&placeholder.to_string()),
            SQLChunk::Ident(name) => write_quoted(buf, name),
            SQLChunk::Column { table, column } => {
                write_quoted(buf, table);
                buf.push('.');
                write_quoted(buf, column);
            }
        }
    }

    fn ends_word(&self) -> bool {
        match self {
            SQLChunk::Text(t) => {
                let last = t.chars().last().unwrap_or(' ');
                !last.is_whitespace() && !['(', ',', '.'].contains(&last)
            }
            SQLChunk::Param(_) | SQLChunk::Ident(_) | SQLChunk::Column { .. } => true,
        }
    }

    fn starts_word(&self) -> bool {
        match self {
            SQLChunk::Text(t) => {
                let first = t.chars().next().unwrap_or(' ');
                !first.is_whitespace() && ![',', ')', ';', '.'].contains(&first)
            }
            SQLChunk::Param(_) | SQLChunk::Ident(_) | SQLChunk::Column { .. } => true,
        }
    }
}

/// Writes a double-quoted identifier, doubling any embedded quote.
fn write_quoted(buf: &mut String, ident: &str) {
    buf.push('"');
    for c in ident.chars() {
        if c == '"' {
            buf.push('"');
        }
        buf.push(c);
    }
    buf.push('"');
}

/// Renders a single-quoted string literal, doubling any embedded quote.
pub fn quote_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// A SQL statement or fragment with parameters.
///
/// This type is used to build SQL statements with proper parameter handling.
/// It keeps track of both the SQL text and the parameters to be bound, so the
/// order of [`SQL::params`] always matches the placeholder order of [`SQL::sql`].
#[derive(Debug, Clone, PartialEq)]
pub struct SQL<V: SQLParam> {
    /// The chunks that make up this SQL statement or fragment.
    pub chunks: SmallVec<[SQLChunk<V>; 3]>,
}

impl<V: SQLParam> SQL<V> {
    /// Creates a new empty SQL fragment.
    pub const fn empty() -> Self {
        SQL {
            chunks: SmallVec::new_const(),
        }
    }

    /// Creates a new SQL fragment from a raw string.
    ///
    /// The string is treated as literal SQL text, not a parameter.
    pub fn raw<T: AsRef<str>>(sql: T) -> Self {
        Self {
            chunks: smallvec![SQLChunk::text(sql)],
        }
    }

    /// Creates a new SQL fragment representing a parameter.
    ///
    /// A positional placeholder ('?') is used, and the provided value
    /// is stored for later binding.
    pub fn parameter(value: impl Into<V>) -> Self {
        Self {
            chunks: smallvec![SQLChunk::param(value.into())],
        }
    }

    /// Creates a named placeholder (`:name`) whose value is bound at execution time.
    pub fn placeholder(name: impl Into<CompactString>) -> Self {
        Self {
            chunks: smallvec![SQLChunk::Param(Param::named(name))],
        }
    }

    /// Creates a quoted identifier fragment.
    pub fn ident(name: impl AsRef<str>) -> Self {
        Self {
            chunks: smallvec![SQLChunk::Ident(name.as_ref().to_compact_string())],
        }
    }

    /// Creates a qualified column fragment: `"table"."column"`.
    pub fn column(table: impl AsRef<str>, column: impl AsRef<str>) -> Self {
        Self {
            chunks: smallvec![SQLChunk::Column {
                table: table.as_ref().to_compact_string(),
                column: column.as_ref().to_compact_string(),
            }],
        }
    }

    /// Creates a comma-separated list of parameter placeholders with values: "?, ?, ?"
    pub fn parameters<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<V>,
    {
        Self::join(values.into_iter().map(|v| Self::parameter(v)), ", ")
    }

    /// Appends a raw string to this SQL fragment.
    ///
    /// The string is treated as literal SQL text, not a parameter.
    pub fn append_raw(mut self, sql: impl AsRef<str>) -> Self {
        self.chunks.push(SQLChunk::text(sql));
        self
    }

    /// Appends another SQL fragment to this one.
    ///
    /// Both the SQL text and parameters are merged.
    pub fn append(mut self, other: SQL<V>) -> Self {
        self.chunks.extend(other.chunks);
        self
    }

    /// Appends a fragment in place
    pub fn push(&mut self, other: SQL<V>) {
        self.chunks.extend(other.chunks);
    }

    /// Wraps this fragment in parentheses.
    pub fn parens(self) -> Self {
        SQL::raw("(").append(self).append_raw(")")
    }

    /// Joins multiple SQL fragments with a separator.
    ///
    /// The separator is inserted between each fragment, but not before the first or after the last.
    /// Empty fragments are skipped.
    pub fn join<T>(sqls: T, separator: &'static str) -> SQL<V>
    where
        T: IntoIterator<Item = SQL<V>>,
    {
        let mut out = SQL::empty();
        for sql in sqls.into_iter().filter(|sql| !sql.is_empty()) {
            if !out.is_empty() {
                out.chunks.push(SQLChunk::text(separator));
            }
            out.chunks.extend(sql.chunks);
        }
        out
    }

    /// Whether this fragment renders to nothing
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Returns the SQL string represented by this SQL fragment, using placeholders for parameters.
    pub fn sql(&self) -> String {
        let mut buf = String::with_capacity(self.estimate_capacity());
        for (i, chunk) in self.chunks.iter().enumerate() {
            chunk.write_to_buffer(&mut buf);
            if self.needs_space(i) {
                buf.push(' ');
            }
        }
        buf
    }

    /// Returns references to parameter values from this SQL fragment in the correct order.
    ///
    /// Named placeholders without a value are not included.
    pub fn params(&self) -> Vec<&V> {
        self.chunks
            .iter()
            .filter_map(|chunk| match chunk {
                SQLChunk::Param(Param {
                    value: Some(value), ..
                }) => Some(value),
                _ => None,
            })
            .collect()
    }

    /// Consumes the fragment, returning its parameter values in placeholder order.
    pub fn into_params(self) -> Vec<V> {
        self.chunks
            .into_iter()
            .filter_map(|chunk| match chunk {
                SQLChunk::Param(Param { value, .. }) => value,
                _ => None,
            })
            .collect()
    }

    /// Returns the placeholders of this fragment in order.
    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.chunks.iter().filter_map(|chunk| match chunk {
            SQLChunk::Param(param) => Some(&param.placeholder),
            _ => None,
        })
    }

    fn estimate_capacity(&self) -> usize {
        self.chunks
            .iter()
            .map(|chunk| match chunk {
                SQLChunk::Text(t) => t.len(),
                SQLChunk::Param(_) => 1,
                SQLChunk::Ident(name) => name.len() + 2,
                SQLChunk::Column { table, column } => table.len() + column.len() + 5,
            })
            .sum::<usize>()
            + self.chunks.len()
    }

    fn needs_space(&self, index: usize) -> bool {
        match (self.chunks.get(index), self.chunks.get(index + 1)) {
            (Some(current), Some(next)) => current.ends_word() && next.starts_word(),
            _ => false,
        }
    }
}

impl<V: SQLParam> Default for SQL<V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<V: SQLParam> From<&str> for SQL<V> {
    fn from(s: &str) -> Self {
        SQL::raw(s)
    }
}

impl<V: SQLParam> Display for SQL<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, r#"sql: "{}", params: {:?}"#, self.sql(), self.params())
    }
}

/// Trait for types that render to a SQL fragment
pub trait ToSQL<V: SQLParam> {
    fn to_sql(&self) -> SQL<V>;
}

impl<V: SQLParam> ToSQL<V> for SQL<V> {
    fn to_sql(&self) -> SQL<V> {
        self.clone()
    }
}
