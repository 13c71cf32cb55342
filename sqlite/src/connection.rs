//! Transaction modes for SQLite connections

/// SQLite transaction types
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SQLiteTransactionType {
    /// A deferred transaction does not acquire locks until needed
    Deferred,
    #[default]
    /// An immediate transaction acquires a RESERVED lock immediately, so
    /// write intent is declared up front
    Immediate,
    /// An exclusive transaction acquires an EXCLUSIVE lock immediately
    Exclusive,
}

impl SQLiteTransactionType {
    /// The statement that opens a transaction of this type
    pub const fn begin_sql(&self) -> &'static str {
        match self {
            SQLiteTransactionType::Deferred => "BEGIN DEFERRED",
            SQLiteTransactionType::Immediate => "BEGIN IMMEDIATE",
            SQLiteTransactionType::Exclusive => "BEGIN EXCLUSIVE",
        }
    }
}

#[cfg(feature = "rusqlite")]
impl From<SQLiteTransactionType> for ::rusqlite::TransactionBehavior {
    fn from(tx_type: SQLiteTransactionType) -> Self {
        match tx_type {
            SQLiteTransactionType::Deferred => ::rusqlite::TransactionBehavior::Deferred,
            SQLiteTransactionType::Immediate => ::rusqlite::TransactionBehavior::Immediate,
            SQLiteTransactionType::Exclusive => ::rusqlite::TransactionBehavior::Exclusive,
        }
    }
}

#[cfg(feature = "rusqlite")]
impl From<::rusqlite::TransactionBehavior> for SQLiteTransactionType {
    fn from(behavior: ::rusqlite::TransactionBehavior) -> Self {
        match behavior {
            ::rusqlite::TransactionBehavior::Deferred => SQLiteTransactionType::Deferred,
            ::rusqlite::TransactionBehavior::Exclusive => SQLiteTransactionType::Exclusive,
            _ => SQLiteTransactionType::Immediate,
        }
    }
}
