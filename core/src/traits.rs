use core::fmt::Debug;

/// A marker trait for types that can be used as SQL parameters.
///
/// This trait is used as a bound on the parameter type in SQL fragments and
/// reconstructed records. Dialect crates provide the concrete value type.
pub trait SQLParam: Clone + Debug + PartialEq + From<i64> {
    /// The NULL value for this parameter type
    const NULL: Self;

    /// Whether this value is SQL NULL
    fn is_null(&self) -> bool;

    /// Borrows the value as text, if it holds text
    fn as_text(&self) -> Option<&str>;
}
