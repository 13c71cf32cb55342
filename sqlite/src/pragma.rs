//! SQLite PRAGMA and catalog statements used for configuration and introspection
//!
//! Introspection uses the table-valued pragma functions so the table name is
//! bound as a parameter rather than interpolated.
//!
//! [SQLite PRAGMA Documentation](https://sqlite.org/pragma.html)
//!
//! ```
//! use sqldb_sqlite::pragma::Pragma;
//! use sqldb_core::ToSQL;
//!
//! let pragma = Pragma::foreign_keys(true);
//! assert_eq!(pragma.to_sql().sql(), "PRAGMA foreign_keys = ON");
//!
//! let pragma = Pragma::table_info("users");
//! assert_eq!(
//!     pragma.to_sql().sql(),
//!     r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?) ORDER BY cid"#
//! );
//! ```

use sqldb_core::{SQL, ToSQL};

use crate::values::SQLiteValue;

/// The pragmas and catalog lookups the database wrapper issues
#[derive(Debug, Clone, PartialEq)]
pub enum Pragma<'a> {
    /// Enable or disable foreign key constraint enforcement
    ///
    /// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_foreign_keys)
    ForeignKeys(bool),

    /// Column metadata for a table: name, declared type, not-null flag,
    /// default expression and primary key position, in declaration order
    ///
    /// [SQLite Documentation](https://sqlite.org/pragma.html#pragma_table_info)
    TableInfo(&'a str),

    /// Whether an ordinary table with this name exists in `sqlite_master`
    TableExists(&'a str),

    /// Names of every ordinary table, excluding SQLite's internal ones
    TableList,
}

impl<'a> Pragma<'a> {
    pub fn foreign_keys(enabled: bool) -> Self {
        Self::ForeignKeys(enabled)
    }

    pub fn table_info(table: &'a str) -> Self {
        Self::TableInfo(table)
    }

    pub fn table_exists(table: &'a str) -> Self {
        Self::TableExists(table)
    }
}

impl ToSQL<SQLiteValue> for Pragma<'_> {
    fn to_sql(&self) -> SQL<SQLiteValue> {
        match self {
            Pragma::ForeignKeys(enabled) => {
                SQL::raw(if *enabled {
                    "PRAGMA foreign_keys = ON"
                } else {
                    "PRAGMA foreign_keys = OFF"
                })
            }
            Pragma::TableInfo(table) => SQL::raw(
                r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info("#,
            )
            .append(SQL::parameter(*table))
            .append_raw(") ORDER BY cid"),
            Pragma::TableExists(table) => {
                SQL::raw("SELECT name FROM sqlite_master WHERE type = 'table' AND name =")
                    .append(SQL::parameter(*table))
            }
            Pragma::TableList => SQL::raw(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            ),
        }
    }
}
