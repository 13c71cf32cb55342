//! Transaction scopes for [`SQLiteDatabase`].
//!
//! A scope begins on entry, commits when the callback returns `Ok`, and rolls
//! back when it returns `Err` or panics. Calls made inside an active scope run
//! directly; writes made outside one each get their own implicit transaction.

use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};

use sqldb_core::SqlDbError;
use sqldb_sqlite::SQLiteTransactionType;

use crate::Result;
use crate::database::SQLiteDatabase;

/// Whether a transaction scope is open on the connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxState {
    #[default]
    Idle,
    Active,
}

impl SQLiteDatabase {
    /// Whether a transaction scope is currently open
    pub fn in_transaction(&self) -> bool {
        self.state.get() == TxState::Active
    }

    /// Runs `f` in a transaction using the configured begin mode.
    ///
    /// ```no_run
    /// # use sqldb::prelude::*;
    /// # fn main() -> sqldb::Result<()> {
    /// # let db = SQLiteDatabase::open_in_memory()?;
    /// db.transaction(|db| {
    ///     db.create("project", fields! { "name" => "alpha" })?;
    ///     db.create("project", fields! { "name" => "beta" })?;
    ///     Ok(())
    /// })?;
    /// # Ok(()) }
    /// ```
    pub fn transaction<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Self) -> Result<R>,
    {
        self.transaction_with(self.transaction_type(), f)
    }

    /// Runs `f` in a transaction opened with `tx_type`.
    ///
    /// Inside an active scope `f` runs directly and joins the outer transaction.
    pub fn transaction_with<F, R>(&self, tx_type: SQLiteTransactionType, f: F) -> Result<R>
    where
        F: FnOnce(&Self) -> Result<R>,
    {
        if self.in_transaction() {
            return f(self);
        }

        self.control(tx_type.begin_sql())?;
        sqldb_core::sqldb_trace_tx!("begin", "sqlite.rusqlite");
        self.state.set(TxState::Active);

        let result = catch_unwind(AssertUnwindSafe(|| f(self)));

        self.state.set(TxState::Idle);

        match result {
            Ok(Ok(value)) => match self.control("COMMIT") {
                Ok(()) => {
                    sqldb_core::sqldb_trace_tx!("commit", "sqlite.rusqlite");
                    Ok(value)
                }
                Err(e) => {
                    let _ = self.control("ROLLBACK");
                    sqldb_core::sqldb_trace_tx!("rollback", "sqlite.rusqlite");
                    Err(e)
                }
            },
            Ok(Err(e)) => {
                let _ = self.control("ROLLBACK");
                sqldb_core::sqldb_trace_tx!("rollback", "sqlite.rusqlite");
                Err(e)
            }
            Err(panic_payload) => {
                let _ = self.control("ROLLBACK");
                sqldb_core::sqldb_trace_tx!("rollback", "sqlite.rusqlite");
                resume_unwind(panic_payload);
            }
        }
    }

    /// Runs `f` inside a savepoint of the current transaction.
    ///
    /// On `Err` or panic only the savepoint's changes are rolled back and the
    /// outer transaction continues. Outside a scope this behaves like
    /// [`Self::transaction`]. Savepoints can be nested.
    pub fn savepoint<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Self) -> Result<R>,
    {
        if !self.in_transaction() {
            return self.transaction(f);
        }

        let depth = self.savepoint_depth.get();
        let name = format!("sqldb_sp_{depth}");
        self.savepoint_depth.set(depth + 1);

        self.control(&format!("SAVEPOINT {name}"))?;
        sqldb_core::sqldb_trace_tx!("savepoint", "sqlite.rusqlite");

        let result = catch_unwind(AssertUnwindSafe(|| f(self)));

        self.savepoint_depth.set(depth);

        match result {
            Ok(Ok(value)) => {
                self.control(&format!("RELEASE SAVEPOINT {name}"))?;
                Ok(value)
            }
            Ok(Err(e)) => {
                let _ = self.control(&format!("ROLLBACK TO SAVEPOINT {name}"));
                let _ = self.control(&format!("RELEASE SAVEPOINT {name}"));
                sqldb_core::sqldb_trace_tx!("rollback_savepoint", "sqlite.rusqlite");
                Err(e)
            }
            Err(panic_payload) => {
                let _ = self.control(&format!("ROLLBACK TO SAVEPOINT {name}"));
                let _ = self.control(&format!("RELEASE SAVEPOINT {name}"));
                resume_unwind(panic_payload);
            }
        }
    }

    /// Runs a write inside the active scope, or in its own transaction if none is open
    pub(crate) fn write<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Self) -> Result<R>,
    {
        if self.in_transaction() {
            f(self)
        } else {
            self.transaction(f)
        }
    }

    fn control(&self, sql: &str) -> Result<()> {
        self.trace(sql, &[]);
        self.conn
            .execute_batch(sql)
            .map_err(|e| SqlDbError::TransactionError(format!("{sql}: {e}")))
    }
}
