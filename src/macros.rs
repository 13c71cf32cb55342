/// Builds a [`Fields`](crate::Fields) list for `create`, `update` and the
/// batch operations.
///
/// ```
/// use sqldb::{SQLiteValue, fields};
///
/// let row = fields! { "name" => "alpha", "budget" => 12.5, "owner" => None::<i64> };
/// assert_eq!(row.len(), 3);
/// assert_eq!(row[2].1, SQLiteValue::Null);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {
        ::std::vec![
            $((
                $crate::CompactString::from($name),
                $crate::SQLiteValue::from($value),
            )),+
        ]
    };
}
