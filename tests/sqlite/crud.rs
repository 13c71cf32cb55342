use sqldb::error::{SchemaError, SqlDbError};
use sqldb::prelude::*;

use crate::common::{int, seed_users, text};

fn by_id(table: &str, id: i64) -> Select<SQLiteValue> {
    Select::new(table).filter(FilterGroup::new().eq("id", id))
}

sqlite_test!(create_round_trips_through_get_one, |db| {
    let id = db.create("project", fields! { "name" => "alpha" })?;

    let project = db.get_one(&by_id("project", id))?.expect("created project");
    assert_eq!(project.value("id"), Some(&int(id)));
    assert_eq!(project.value("name"), Some(&text("alpha")));
    assert_eq!(project.value("description"), Some(&text("none")));
    assert_eq!(project.table(), Some("project"));
    assert_eq!(project.len(), 4);
});

sqlite_test!(create_without_fields_uses_defaults, |db| {
    let first = db.create("counter", fields! {})?;
    let second = db.create("counter", Fields::new())?;
    assert_eq!(second, first + 1);

    let counter = db.get_one(&by_id("counter", first))?.expect("counter");
    assert_eq!(counter.value("hits"), Some(&int(0)));
});

sqlite_test!(create_rejects_unknown_fields_before_writing, |db| {
    let err = db
        .create("project", fields! { "name" => "alpha", "owner" => 1, "budget" => 2.0 })
        .unwrap_err();
    assert!(matches!(
        err,
        SqlDbError::Schema(SchemaError::UnknownFields { ref table, ref fields })
            if table == "project" && fields == &["budget", "owner"]
    ));
    assert_eq!(db.count("project", &[])?, 0);

    let err = db.create("company", fields! { "name" => "x" }).unwrap_err();
    assert!(matches!(err, SqlDbError::Schema(SchemaError::UnknownTable { .. })));
});

sqlite_test!(unique_violation_is_a_constraint_error, |db| {
    db.create("project", fields! { "name" => "alpha" })?;
    let err = db.create("project", fields! { "name" => "alpha" }).unwrap_err();
    assert!(matches!(err, SqlDbError::Constraint(_)), "{err:?}");
});

sqlite_test!(foreign_keys_are_enforced, |db| {
    let err = db
        .create("user", fields! { "name" => "ann", "project_id" => 99 })
        .unwrap_err();
    assert!(matches!(err, SqlDbError::Constraint(_)), "{err:?}");
});

sqlite_test!(createmany_binds_null_for_missing_fields, |db| {
    let inserted = db.createmany(
        "user",
        [
            fields! { "name" => "ann", "age" => 30 },
            fields! { "name" => "bob" },
            fields! { "email" => "cy@example.com", "name" => "cy" },
        ],
    )?;
    assert_eq!(inserted, 3);

    let bob = db
        .get_one(&Select::new("user").filter(FilterGroup::new().eq("name", "bob")))?
        .expect("bob");
    assert_eq!(bob.value("age"), Some(&SQLiteValue::Null));
    assert_eq!(bob.value("email"), Some(&SQLiteValue::Null));

    let cy = db
        .get_one(&Select::new("user").filter(FilterGroup::new().eq("name", "cy")))?
        .expect("cy");
    assert_eq!(cy.value("email"), Some(&text("cy@example.com")));

    assert_eq!(db.createmany("user", Vec::<Fields>::new())?, 0);
});

sqlite_test!(createmany_is_all_or_nothing, |db| {
    let err = db
        .createmany(
            "project",
            [fields! { "name" => "alpha" }, fields! { "name" => "alpha" }],
        )
        .unwrap_err();
    assert!(matches!(err, SqlDbError::Constraint(_)));
    assert_eq!(db.count("project", &[])?, 0);
});

sqlite_test!(update_by_id, |db| {
    seed_users(&db, 2);
    assert_eq!(db.update("user", 1, fields! { "age" => 41, "email" => "a@b.c" })?, 1);
    assert_eq!(db.update("user", 99, fields! { "age" => 41 })?, 0);

    let user = db.get_one(&by_id("user", 1))?.expect("user 1");
    assert_eq!(user.value("age"), Some(&int(41)));
    assert_eq!(user.value("email"), Some(&text("a@b.c")));
    let other = db.get_one(&by_id("user", 2))?.expect("user 2");
    assert_eq!(other.value("age"), Some(&int(22)));
});

sqlite_test!(update_validates_fields, |db| {
    seed_users(&db, 1);
    let err = db.update("user", 1, fields! { "nickname" => "x" }).unwrap_err();
    assert!(matches!(err, SqlDbError::Schema(SchemaError::UnknownFields { .. })));

    let err = db.update("user", 1, Fields::new()).unwrap_err();
    assert!(matches!(err, SqlDbError::InvalidQuery(_)));
});

sqlite_test!(updatemany_updates_each_row_by_id, |db| {
    seed_users(&db, 3);
    let updated = db.updatemany(
        "user",
        [
            fields! { "id" => 1, "age" => 50, "name" => "ann" },
            fields! { "name" => "bob", "id" => 3, "age" => 51 },
        ],
    )?;
    assert_eq!(updated, 2);

    let users = db.get(&Select::new("user").order_by("id", OrderBy::Asc))?;
    let names: Vec<_> = users.records.iter().map(|u| u.value("name").cloned()).collect();
    assert_eq!(
        names,
        [Some(text("ann")), Some(text("user2")), Some(text("bob"))]
    );
    assert_eq!(users.records[2].value("age"), Some(&int(51)));
});

sqlite_test!(updatemany_requires_identical_field_sets, |db| {
    seed_users(&db, 2);
    let err = db
        .updatemany(
            "user",
            [
                fields! { "id" => 1, "age" => 50 },
                fields! { "id" => 2, "name" => "bob" },
            ],
        )
        .unwrap_err();
    assert!(matches!(err, SqlDbError::InvalidQuery(_)));

    let err = db
        .updatemany("user", [fields! { "age" => 50 }, fields! { "age" => 51 }])
        .unwrap_err();
    assert!(matches!(err, SqlDbError::InvalidQuery(_)));

    let user = db.get_one(&by_id("user", 1))?.expect("user 1");
    assert_eq!(user.value("age"), Some(&int(21)));
    assert_eq!(db.updatemany("user", Vec::<Fields>::new())?, 0);
});

sqlite_test!(delete_and_deletemany, |db| {
    seed_users(&db, 5);
    assert_eq!(db.delete("user", 1)?, 1);
    assert_eq!(db.delete("user", 1)?, 0);
    assert_eq!(db.deletemany("user", [2, 3, 42])?, 2);
    assert_eq!(db.deletemany("user", Vec::<i64>::new())?, 0);

    let left = db.get(&Select::new("user").fields(["id"]))?;
    let ids: Vec<_> = left.records.iter().map(|u| u.value("id").cloned()).collect();
    assert_eq!(ids, [Some(int(4)), Some(int(5))]);

    let err = db.delete("company", 1).unwrap_err();
    assert!(matches!(err, SqlDbError::Schema(SchemaError::UnknownTable { .. })));
});
