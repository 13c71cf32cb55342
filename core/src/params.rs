use core::fmt;

use compact_str::CompactString;

use crate::traits::SQLParam;

/// Various styles of SQL parameter placeholders.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderStyle {
    /// Colon style placeholders (:param)
    Colon,
    #[default]
    Positional,
}

/// A SQL parameter placeholder.
#[derive(Default, Debug, Clone, Hash, PartialEq, Eq)]
pub struct Placeholder {
    /// The name of the parameter.
    pub name: Option<CompactString>,
    /// The style of the placeholder.
    pub style: PlaceholderStyle,
}

impl Placeholder {
    /// Creates a new colon-style placeholder.
    pub fn colon(name: impl Into<CompactString>) -> Self {
        Placeholder {
            name: Some(name.into()),
            style: PlaceholderStyle::Colon,
        }
    }

    /// Creates a positional placeholder ('?').
    pub const fn positional() -> Self {
        Placeholder {
            name: None,
            style: PlaceholderStyle::Positional,
        }
    }

    /// The key used when binding by name, e.g. `:name`
    pub fn bind_key(&self) -> Option<CompactString> {
        match self.style {
            PlaceholderStyle::Colon => self.name.as_ref().map(|n| compact_str::format_compact!(":{n}")),
            PlaceholderStyle::Positional => None,
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.style {
            PlaceholderStyle::Colon => write!(f, ":{}", self.name.as_deref().unwrap_or_default()),
            PlaceholderStyle::Positional => write!(f, "?"),
        }
    }
}

/// A SQL parameter that associates a value with a placeholder.
///
/// A named placeholder may be rendered without a value; the value is then
/// supplied at execution time (see `updatemany`).
#[derive(Debug, Clone, PartialEq)]
pub struct Param<V: SQLParam> {
    /// The placeholder to use in the SQL
    pub placeholder: Placeholder,
    /// The value to bind
    pub value: Option<V>,
}

impl<V: SQLParam> Param<V> {
    pub fn new(placeholder: Placeholder, value: Option<V>) -> Self {
        Self { placeholder, value }
    }

    /// Creates a new parameter with a positional placeholder
    pub const fn positional(value: V) -> Self {
        Self {
            placeholder: Placeholder::positional(),
            value: Some(value),
        }
    }

    /// Creates a named placeholder with no value
    pub fn named(name: impl Into<CompactString>) -> Self {
        Self {
            placeholder: Placeholder::colon(name),
            value: None,
        }
    }
}
