use sqldb::error::{SchemaError, SqlDbError};
use sqldb::prelude::*;

use crate::common::{int, is_catalog_lookup, seed_users, setup_db_with_log, statements, text};

fn names(page: &Page) -> Vec<String> {
    page.records
        .iter()
        .filter_map(|r| r.value("name").and_then(SQLiteValue::as_str).map(str::to_string))
        .collect()
}

sqlite_test!(eq_null_matches_unset_fields, |db| {
    db.createmany(
        "user",
        [
            fields! { "name" => "ann", "age" => 30 },
            fields! { "name" => "bob" },
        ],
    )?;

    let unset = db.get(&Select::new("user").filter(FilterGroup::new().eq("age", None::<i64>)))?;
    assert_eq!(names(&unset), ["bob"]);

    let set = db.get(&Select::new("user").filter(FilterGroup::new().ne("age", SQLiteValue::Null)))?;
    assert_eq!(names(&set), ["ann"]);

    let plan = db.plan(&Select::new("user").filter(FilterGroup::new().is_null("age")))?;
    assert!(plan.sql().contains(r#""user"."age" IS NULL"#));
    assert!(plan.params().is_empty());
});

sqlite_test!(groups_are_ored_and_conditions_anded, |db| {
    seed_users(&db, 6);
    let select = Select::new("user")
        .filter(FilterGroup::new().eq("name", "user1"))
        .filter(FilterGroup::new().ge("age", 25).lt("age", 26))
        .order_by("id", OrderBy::Asc);
    let page = db.get(&select)?;
    assert_eq!(names(&page), ["user1", "user5"]);
    assert_eq!(page.max_pages, NOT_PAGINATED);
});

sqlite_test!(list_and_pattern_comparisons, |db| {
    seed_users(&db, 12);

    let page = db.get(
        &Select::new("user")
            .filter(FilterGroup::new().is_in("id", [2, 4, 99]))
            .order_by("id", OrderBy::Asc),
    )?;
    assert_eq!(names(&page), ["user2", "user4"]);

    let page = db.get(&Select::new("user").filter(FilterGroup::new().not_in("id", 1..=10)))?;
    assert_eq!(names(&page), ["user11", "user12"]);

    let page = db.get(&Select::new("user").filter(FilterGroup::new().like("name", "user1_")))?;
    assert_eq!(names(&page), ["user10", "user11", "user12"]);

    let page = db.get(
        &Select::new("user")
            .filter(FilterGroup::new().unlike("name", "user1%").le("age", 23)),
    )?;
    assert_eq!(names(&page), ["user2", "user3"]);
});

sqlite_test!(empty_filter_group_selects_everything, |db| {
    seed_users(&db, 3);
    let page = db.get(&Select::new("user").filter(FilterGroup::new()))?;
    assert_eq!(page.len(), 3);
});

sqlite_test!(empty_groups_do_not_widen_other_groups, |db| {
    seed_users(&db, 3);
    let page = db.get(
        &Select::new("user")
            .filter(FilterGroup::new())
            .filter(FilterGroup::new().eq("name", "user1")),
    )?;
    assert_eq!(names(&page), ["user1"]);
});

sqlite_test!(descending_order, |db| {
    seed_users(&db, 4);
    let page = db.get(&Select::new("user").order_by("age", OrderBy::Desc))?;
    assert_eq!(names(&page), ["user4", "user3", "user2", "user1"]);
});

sqlite_test!(field_selection_always_carries_the_id, |db| {
    seed_users(&db, 1);
    let user = db
        .get_one(&Select::new("user").fields(["name"]))?
        .expect("one user");
    assert_eq!(user.keys().collect::<Vec<_>>(), ["id", "name", "type"]);
    assert_eq!(user.value("id"), Some(&int(1)));
    assert_eq!(user.value("type"), Some(&text("user")));

    let star = db.get_one(&Select::new("user").fields(["*"]))?.expect("one user");
    assert_eq!(star.len(), 6);
});

sqlite_test!(get_one_returns_none_without_a_match, |db| {
    seed_users(&db, 2);
    let missing = db.get_one(&Select::new("user").filter(FilterGroup::new().eq("id", 7)))?;
    assert!(missing.is_none());

    let first = db
        .get_one(&Select::new("user").order_by("id", OrderBy::Desc).limit(1).page(5))?
        .expect("a user");
    assert_eq!(first.value("name"), Some(&text("user2")));
});

sqlite_test!(get_unique_returns_distinct_combinations, |db| {
    db.createmany(
        "user",
        [
            fields! { "name" => "a", "age" => 30 },
            fields! { "name" => "b", "age" => 30 },
            fields! { "name" => "c", "age" => 41 },
            fields! { "name" => "d" },
        ],
    )?;

    let ages = db.get_unique("user", ["age"], &[], &[OrderTerm::asc("age")])?;
    let values: Vec<_> = ages.iter().map(|r| r.value("age").cloned()).collect();
    assert_eq!(
        values,
        [Some(SQLiteValue::Null), Some(int(30)), Some(int(41))]
    );
    assert!(ages.iter().all(|r| r.len() == 1));

    let filtered = db.get_unique(
        "user",
        ["age"],
        &[FilterGroup::new().is_not_null("age")],
        &[OrderTerm::desc("age")],
    )?;
    assert_eq!(filtered.len(), 2);
    assert_eq!(filtered[0].value("age"), Some(&int(41)));

    let err = db.get_unique("user", ["height"], &[], &[]).unwrap_err();
    assert!(matches!(err, SqlDbError::Schema(SchemaError::UnknownFields { .. })));
    let err = db.get_unique("user", Vec::<&str>::new(), &[], &[]).unwrap_err();
    assert!(matches!(err, SqlDbError::InvalidQuery(_)));
});

sqlite_test!(count_matches_filters, |db| {
    seed_users(&db, 5);
    assert_eq!(db.count("user", &[])?, 5);
    assert_eq!(db.count("user", &[FilterGroup::new().gt("age", 23)])?, 2);
});

#[test]
fn unknown_identifiers_fail_before_any_statement() {
    let (db, log) = setup_db_with_log();

    let err = db.get(&Select::new("company")).unwrap_err();
    assert_eq!(err.to_string(), "Invalid table: company");

    let err = db
        .get(&Select::new("user").fields(["name", "shoe", "hat"]))
        .unwrap_err();
    assert!(matches!(
        err,
        SqlDbError::Schema(SchemaError::UnknownFields { ref fields, .. }) if fields == &["hat", "shoe"]
    ));

    let err = db
        .get(&Select::new("user").filter(FilterGroup::new().eq("shoe", 1)))
        .unwrap_err();
    assert!(matches!(err, SqlDbError::Schema(SchemaError::UnknownFields { .. })));

    let err = db
        .get(&Select::new("user").order_by("shoe", OrderBy::Asc))
        .unwrap_err();
    assert!(matches!(err, SqlDbError::Schema(SchemaError::UnknownFields { .. })));

    assert!(statements(&log).iter().all(|sql| is_catalog_lookup(sql)));
}

#[test]
fn statement_hook_sees_text_and_values() {
    let (db, log) = setup_db_with_log();
    db.get(&Select::new("user").filter(FilterGroup::new().eq("name", "ann")))
        .unwrap();

    let seen = log.lock().unwrap();
    let (sql, params) = seen.last().expect("a statement");
    assert!(sql.starts_with("SELECT"));
    assert!(!sql.contains("ann"));
    assert_eq!(params, &[text("ann")]);
}

#[test]
fn statement_hook_sees_catalog_lookups_once() {
    let (db, log) = setup_db_with_log();
    db.get(&Select::new("user")).unwrap();
    let seen = statements(&log);
    assert!(seen[0].contains("sqlite_master"));
    assert!(seen[1].contains("pragma_table_info"));
    assert!(seen[2].starts_with("SELECT \"user\"."));
    assert_eq!(seen.len(), 3);

    log.lock().unwrap().clear();
    db.get(&Select::new("user")).unwrap();
    assert_eq!(statements(&log).len(), 1);
}
