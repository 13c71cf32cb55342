//! Single-table writes: insert, update and delete by id.
//!
//! Every table and column is checked against the catalog before a statement
//! is built, and every value is bound as a parameter.

use compact_str::CompactString;
use sqldb_core::{SQL, SchemaCatalog, SqlDbError};
use sqldb_sqlite::SQLiteValue;

use crate::Result;
use crate::database::SQLiteDatabase;

/// Field name and value pairs for one row, see [`fields!`](crate::fields)
pub type Fields = Vec<(CompactString, SQLiteValue)>;

fn collect_fields<I, K, V>(fields: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<CompactString>,
    V: Into<SQLiteValue>,
{
    fields
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Sorted field names of a row
fn field_set(row: &Fields) -> Vec<&str> {
    let mut names: Vec<&str> = row.iter().map(|(name, _)| name.as_str()).collect();
    names.sort_unstable();
    names
}

fn insert_statement(table: &str, columns: &[CompactString], values: Vec<SQLiteValue>) -> SQL<SQLiteValue> {
    let insert = SQL::raw("INSERT INTO").append(SQL::ident(table));
    if columns.is_empty() {
        return insert.append_raw("DEFAULT VALUES");
    }
    insert
        .append(SQL::join(columns.iter().map(SQL::ident), ", ").parens())
        .append_raw("VALUES")
        .append(SQL::parameters(values).parens())
}

impl SQLiteDatabase {
    /// Inserts one row and returns its rowid.
    ///
    /// With no fields the row is inserted with `DEFAULT VALUES`.
    pub fn create<I, K, V>(&self, table: &str, fields: I) -> Result<i64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<CompactString>,
        V: Into<SQLiteValue>,
    {
        let fields = collect_fields(fields);
        self.catalog()
            .validate_fields(table, fields.iter().map(|(name, _)| name))?;

        let (columns, values): (Vec<_>, Vec<_>) = fields.into_iter().unzip();
        let sql = insert_statement(table, &columns, values);

        self.write(|db| {
            db.execute_sql(&sql)?;
            Ok(db.conn.last_insert_rowid())
        })
    }

    /// Inserts every row in one transaction and returns the number inserted.
    ///
    /// The column list is the union of every row's fields, in first-seen
    /// order. A row missing a column binds `NULL` for it.
    pub fn createmany<I>(&self, table: &str, rows: I) -> Result<usize>
    where
        I: IntoIterator<Item = Fields>,
    {
        let rows: Vec<Fields> = rows.into_iter().collect();
        let mut columns: Vec<CompactString> = Vec::new();
        for (name, _) in rows.iter().flatten() {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
        self.catalog().validate_table(table)?;
        self.catalog().validate_fields(table, columns.iter())?;
        if rows.is_empty() {
            return Ok(0);
        }

        self.write(|db| {
            let mut inserted = 0;
            for row in rows {
                let values = columns
                    .iter()
                    .map(|column| {
                        row.iter()
                            .rfind(|(name, _)| name == column)
                            .map_or(SQLiteValue::Null, |(_, value)| value.clone())
                    })
                    .collect();
                inserted += db.execute_sql(&insert_statement(table, &columns, values))?;
            }
            Ok(inserted)
        })
    }

    /// Updates the row whose id is `uid`, returning the number of changed rows
    pub fn update<I, K, V>(&self, table: &str, uid: impl Into<SQLiteValue>, fields: I) -> Result<usize>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<CompactString>,
        V: Into<SQLiteValue>,
    {
        let fields = collect_fields(fields);
        if fields.is_empty() {
            return Err(SqlDbError::InvalidQuery(format!(
                "no fields given to update in {table}"
            )));
        }
        let id_field = self.id_field();
        self.catalog().validate_fields(
            table,
            fields
                .iter()
                .map(|(name, _)| name.as_str())
                .chain([id_field])
                .collect::<Vec<_>>(),
        )?;

        let assignments = SQL::join(
            fields.into_iter().map(|(name, value)| {
                SQL::ident(name)
                    .append_raw("=")
                    .append(SQL::parameter(value))
            }),
            ", ",
        );
        let sql = SQL::raw("UPDATE")
            .append(SQL::ident(table))
            .append_raw("SET")
            .append(assignments)
            .append_raw("WHERE")
            .append(SQL::ident(id_field))
            .append_raw("=")
            .append(SQL::parameter(uid));

        self.write(|db| db.execute_sql(&sql))
    }

    /// Updates many rows in one transaction, each identified by its id field.
    ///
    /// Every row must carry the same set of fields, including the id field.
    pub fn updatemany<I>(&self, table: &str, rows: I) -> Result<usize>
    where
        I: IntoIterator<Item = Fields>,
    {
        let rows: Vec<Fields> = rows.into_iter().collect();
        let Some(first) = rows.first() else {
            self.catalog().validate_table(table)?;
            return Ok(0);
        };

        let expected = field_set(first);
        if rows.iter().any(|row| field_set(row) != expected) {
            return Err(SqlDbError::InvalidQuery(format!(
                "rows updated together in {table} must share the same fields"
            )));
        }
        if expected.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(SqlDbError::InvalidQuery(format!(
                "duplicate field in update of {table}"
            )));
        }

        let id_field = self.id_field();
        if !expected.contains(&id_field) {
            return Err(SqlDbError::InvalidQuery(format!(
                "every row updated in {table} needs its {id_field} field"
            )));
        }
        self.catalog().validate_fields(table, expected.iter().copied())?;

        let columns: Vec<&str> = first
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| *name != id_field)
            .collect();
        if columns.is_empty() {
            return Err(SqlDbError::InvalidQuery(format!(
                "no fields given to update in {table}"
            )));
        }

        let assignments = SQL::join(
            columns.iter().map(|column| {
                SQL::ident(column)
                    .append_raw("=")
                    .append(SQL::placeholder(*column))
            }),
            ", ",
        );
        let sql: SQL<SQLiteValue> = SQL::raw("UPDATE")
            .append(SQL::ident(table))
            .append_raw("SET")
            .append(assignments)
            .append_raw("WHERE")
            .append(SQL::ident(id_field))
            .append_raw("=")
            .append(SQL::placeholder(id_field));

        self.write(|db| {
            let mut updated = 0;
            for row in &rows {
                let values = columns
                    .iter()
                    .chain([&id_field])
                    .map(|column| {
                        row.iter()
                            .find(|(name, _)| name == column)
                            .map(|(_, value)| value)
                            .ok_or_else(|| {
                                SqlDbError::InvalidQuery(format!("missing field {column} in {table}"))
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                updated += db.execute_named(&sql, &values)?;
            }
            Ok(updated)
        })
    }

    /// Deletes the row whose id is `uid`, returning the number of deleted rows
    pub fn delete(&self, table: &str, uid: impl Into<SQLiteValue>) -> Result<usize> {
        let id_field = self.id_field();
        self.catalog().validate_fields(table, [id_field])?;
        let sql = SQL::raw("DELETE FROM")
            .append(SQL::ident(table))
            .append_raw("WHERE")
            .append(SQL::ident(id_field))
            .append_raw("=")
            .append(SQL::parameter(uid));
        self.write(|db| db.execute_sql(&sql))
    }

    /// Deletes every row whose id is in `uids` with a single statement
    pub fn deletemany<I>(&self, table: &str, uids: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: Into<SQLiteValue>,
    {
        let id_field = self.id_field();
        self.catalog().validate_fields(table, [id_field])?;
        let uids: Vec<SQLiteValue> = uids.into_iter().map(Into::into).collect();
        if uids.is_empty() {
            return Ok(0);
        }
        let sql = SQL::raw("DELETE FROM")
            .append(SQL::ident(table))
            .append_raw("WHERE")
            .append(SQL::ident(id_field))
            .append_raw("IN")
            .append(SQL::parameters(uids).parens());
        self.write(|db| db.execute_sql(&sql))
    }
}
