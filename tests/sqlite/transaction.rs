use std::panic::{AssertUnwindSafe, catch_unwind};

use sqldb::error::SqlDbError;
use sqldb::prelude::*;

use crate::common::{data_statements, int, setup_db_with_log, text};

fn projects(db: &SQLiteDatabase) -> sqldb::Result<u64> {
    db.count("project", &[])
}

sqlite_test!(commit_on_ok, |db| {
    let ids = db.transaction(|tx| {
        assert!(tx.in_transaction());
        let a = tx.create("project", fields! { "name" => "alpha" })?;
        let b = tx.create("project", fields! { "name" => "beta" })?;
        Ok((a, b))
    })?;
    assert_eq!(ids, (1, 2));
    assert!(!db.in_transaction());
    assert_eq!(projects(&db)?, 2);
});

sqlite_test!(constraint_failure_rolls_back_the_scope, |db| {
    let result = db.transaction(|tx| {
        tx.create("project", fields! { "name" => "alpha" })?;
        // visible inside the scope before the failure
        assert_eq!(projects(tx)?, 1);
        tx.create("project", fields! { "name" => "alpha" })?;
        Ok(())
    });
    assert!(matches!(result, Err(SqlDbError::Constraint(_))));
    assert_eq!(projects(&db)?, 0);
    assert!(!db.in_transaction());
});

sqlite_test!(error_returned_from_scope_rolls_back, |db| {
    let result: sqldb::Result<()> = db.transaction(|tx| {
        tx.create("project", fields! { "name" => "alpha" })?;
        Err(SqlDbError::InvalidQuery("changed my mind".into()))
    });
    assert!(result.is_err());
    assert_eq!(projects(&db)?, 0);
});

sqlite_test!(panic_rolls_back_and_resumes, |db| {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let _ = db.transaction(|tx| -> sqldb::Result<()> {
            tx.create("project", fields! { "name" => "alpha" })?;
            panic!("boom");
        });
    }));
    assert!(outcome.is_err());
    assert!(!db.in_transaction());
    assert_eq!(projects(&db)?, 0);

    db.create("project", fields! { "name" => "beta" })?;
    assert_eq!(projects(&db)?, 1);
});

sqlite_test!(nested_scope_joins_the_outer_transaction, |db| {
    let result: sqldb::Result<()> = db.transaction(|tx| {
        tx.transaction(|inner| {
            inner.create("project", fields! { "name" => "alpha" })?;
            Ok(())
        })?;
        Err(SqlDbError::InvalidQuery("abort outer".into()))
    });
    assert!(result.is_err());
    assert_eq!(projects(&db)?, 0);
});

sqlite_test!(savepoint_rolls_back_only_its_own_work, |db| {
    db.transaction(|tx| {
        tx.create("project", fields! { "name" => "alpha" })?;
        let failed = tx.savepoint(|sp| {
            sp.create("project", fields! { "name" => "beta" })?;
            sp.create("project", fields! { "name" => "alpha" })?;
            Ok(())
        });
        assert!(matches!(failed, Err(SqlDbError::Constraint(_))));
        tx.savepoint(|sp| {
            sp.create("project", fields! { "name" => "gamma" })?;
            sp.savepoint(|inner| inner.create("project", fields! { "name" => "delta" }))
        })?;
        Ok(())
    })?;

    let page = db.get(&Select::new("project").fields(["name"]).order_by("id", OrderBy::Asc))?;
    let names: Vec<_> = page.records.iter().map(|r| r.value("name").cloned()).collect();
    assert_eq!(
        names,
        [Some(text("alpha")), Some(text("gamma")), Some(text("delta"))]
    );
});

sqlite_test!(savepoint_outside_a_scope_is_a_transaction, |db| {
    let result: sqldb::Result<()> = db.savepoint(|sp| {
        assert!(sp.in_transaction());
        sp.create("project", fields! { "name" => "alpha" })?;
        Err(SqlDbError::InvalidQuery("no".into()))
    });
    assert!(result.is_err());
    assert_eq!(projects(&db)?, 0);
});

sqlite_test!(deferred_transactions, |db| {
    db.transaction_with(SQLiteTransactionType::Deferred, |tx| {
        tx.create("counter", fields! { "hits" => 1 })
    })?;
    let counter = db.get_one(&Select::new("counter"))?.expect("counter");
    assert_eq!(counter.value("hits"), Some(&int(1)));
});

#[test]
fn writes_get_implicit_transactions_reads_do_not() {
    let (db, log) = setup_db_with_log();

    db.create("project", fields! { "name" => "alpha" }).unwrap();
    let seen = data_statements(&log);
    assert_eq!(seen.first().map(String::as_str), Some("BEGIN IMMEDIATE"));
    assert!(seen[1].starts_with(r#"INSERT INTO "project""#));
    assert_eq!(seen.last().map(String::as_str), Some("COMMIT"));

    log.lock().unwrap().clear();
    db.get(&Select::new("project")).unwrap();
    let seen = data_statements(&log);
    assert_eq!(seen.len(), 1);
    assert!(seen[0].starts_with("SELECT"));

    log.lock().unwrap().clear();
    db.transaction(|tx| {
        tx.create("project", fields! { "name" => "beta" })?;
        tx.update("project", 1, fields! { "description" => "first" })
    })
    .unwrap();
    let seen = data_statements(&log);
    assert_eq!(seen.len(), 4);
    assert_eq!(seen.iter().filter(|s| s.starts_with("BEGIN")).count(), 1);
}
