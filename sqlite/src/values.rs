//! Owned SQLite value type and its driver bindings

use std::fmt;

use compact_str::CompactString;
use sqldb_core::SQLParam;

/// A single SQLite value: one of the five storage classes
#[derive(Debug, Clone, PartialEq, PartialOrd, Default)]
pub enum SQLiteValue {
    /// Integer value (i64)
    Integer(i64),
    /// Real value (f64)
    Real(f64),
    /// Text value
    Text(String),
    /// Blob value
    Blob(Vec<u8>),
    /// NULL value
    #[default]
    Null,
}

impl SQLiteValue {
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            SQLiteValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Reads the value as a float, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SQLiteValue::Real(r) => Some(*r),
            SQLiteValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SQLiteValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            SQLiteValue::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Name of the storage class, as reported by `typeof()`
    pub const fn type_name(&self) -> &'static str {
        match self {
            SQLiteValue::Integer(_) => "integer",
            SQLiteValue::Real(_) => "real",
            SQLiteValue::Text(_) => "text",
            SQLiteValue::Blob(_) => "blob",
            SQLiteValue::Null => "null",
        }
    }
}

impl SQLParam for SQLiteValue {
    const NULL: Self = SQLiteValue::Null;

    fn is_null(&self) -> bool {
        matches!(self, SQLiteValue::Null)
    }

    fn as_text(&self) -> Option<&str> {
        self.as_str()
    }
}

impl fmt::Display for SQLiteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SQLiteValue::Integer(i) => write!(f, "{i}"),
            SQLiteValue::Real(r) => write!(f, "{r}"),
            SQLiteValue::Text(s) => f.write_str(s),
            SQLiteValue::Blob(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            SQLiteValue::Null => f.write_str("NULL"),
        }
    }
}

//------------------------------------------------------------------------------
// Conversions
//------------------------------------------------------------------------------

macro_rules! impl_from_int {
    ($($ty:ty),*) => { $(
        impl From<$ty> for SQLiteValue {
            fn from(value: $ty) -> Self {
                SQLiteValue::Integer(i64::from(value))
            }
        }
    )* }
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for SQLiteValue {
    fn from(value: bool) -> Self {
        SQLiteValue::Integer(i64::from(value))
    }
}

impl From<f32> for SQLiteValue {
    fn from(value: f32) -> Self {
        SQLiteValue::Real(f64::from(value))
    }
}

impl From<f64> for SQLiteValue {
    fn from(value: f64) -> Self {
        SQLiteValue::Real(value)
    }
}

impl From<&str> for SQLiteValue {
    fn from(value: &str) -> Self {
        SQLiteValue::Text(value.to_string())
    }
}

impl From<String> for SQLiteValue {
    fn from(value: String) -> Self {
        SQLiteValue::Text(value)
    }
}

impl From<&String> for SQLiteValue {
    fn from(value: &String) -> Self {
        SQLiteValue::Text(value.clone())
    }
}

impl From<CompactString> for SQLiteValue {
    fn from(value: CompactString) -> Self {
        SQLiteValue::Text(value.into_string())
    }
}

impl From<Vec<u8>> for SQLiteValue {
    fn from(value: Vec<u8>) -> Self {
        SQLiteValue::Blob(value)
    }
}

impl From<&[u8]> for SQLiteValue {
    fn from(value: &[u8]) -> Self {
        SQLiteValue::Blob(value.to_vec())
    }
}

impl From<&SQLiteValue> for SQLiteValue {
    fn from(value: &SQLiteValue) -> Self {
        value.clone()
    }
}

impl<T: Into<SQLiteValue>> From<Option<T>> for SQLiteValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SQLiteValue::Null, Into::into)
    }
}

//------------------------------------------------------------------------------
// rusqlite implementations
//------------------------------------------------------------------------------

#[cfg(feature = "rusqlite")]
impl rusqlite::ToSql for SQLiteValue {
    fn to_sql(&self) -> ::rusqlite::Result<::rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, Value, ValueRef};
        Ok(match self {
            SQLiteValue::Null => ToSqlOutput::Owned(Value::Null),
            SQLiteValue::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            SQLiteValue::Real(f) => ToSqlOutput::Owned(Value::Real(*f)),
            SQLiteValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SQLiteValue::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

#[cfg(feature = "rusqlite")]
impl rusqlite::types::FromSql for SQLiteValue {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        Ok(SQLiteValue::from(value))
    }
}

#[cfg(feature = "rusqlite")]
impl From<rusqlite::types::Value> for SQLiteValue {
    fn from(value: rusqlite::types::Value) -> Self {
        match value {
            rusqlite::types::Value::Null => SQLiteValue::Null,
            rusqlite::types::Value::Integer(i) => SQLiteValue::Integer(i),
            rusqlite::types::Value::Real(r) => SQLiteValue::Real(r),
            rusqlite::types::Value::Text(s) => SQLiteValue::Text(s),
            rusqlite::types::Value::Blob(b) => SQLiteValue::Blob(b),
        }
    }
}

#[cfg(feature = "rusqlite")]
impl From<rusqlite::types::ValueRef<'_>> for SQLiteValue {
    fn from(value: rusqlite::types::ValueRef<'_>) -> Self {
        match value {
            rusqlite::types::ValueRef::Null => SQLiteValue::Null,
            rusqlite::types::ValueRef::Integer(i) => SQLiteValue::Integer(i),
            rusqlite::types::ValueRef::Real(r) => SQLiteValue::Real(r),
            rusqlite::types::ValueRef::Text(items) => {
                SQLiteValue::Text(String::from_utf8_lossy(items).into_owned())
            }
            rusqlite::types::ValueRef::Blob(items) => SQLiteValue::Blob(items.to_vec()),
        }
    }
}

/// Reads every column of `row` in order
#[cfg(feature = "rusqlite")]
pub fn row_values(row: &rusqlite::Row<'_>, width: usize) -> rusqlite::Result<Vec<SQLiteValue>> {
    (0..width).map(|i| row.get::<_, SQLiteValue>(i)).collect()
}

//------------------------------------------------------------------------------
// serde
//------------------------------------------------------------------------------

#[cfg(feature = "serde")]
impl serde::Serialize for SQLiteValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SQLiteValue::Integer(i) => serializer.serialize_i64(*i),
            SQLiteValue::Real(r) => serializer.serialize_f64(*r),
            SQLiteValue::Text(s) => serializer.serialize_str(s),
            SQLiteValue::Blob(b) => serializer.serialize_bytes(b),
            SQLiteValue::Null => serializer.serialize_none(),
        }
    }
}
