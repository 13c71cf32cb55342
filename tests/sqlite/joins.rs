use sqldb::error::{SchemaError, SqlDbError};
use sqldb::prelude::*;

use crate::common::{int, seed_graph, text};

sqlite_test!(join_nests_child_and_strips_foreign_key, |db| {
    let (project, user, _) = seed_graph(&db);

    let record = db
        .get_one(&Select::new("user").join(JoinSpec::new("project")))?
        .expect("user");
    assert_eq!(record.value("id"), Some(&int(user)));
    assert!(!record.contains_key("project_id"));

    let nested = record.record("project").expect("nested project");
    assert_eq!(nested.value("id"), Some(&int(project)));
    assert_eq!(nested.value("name"), Some(&text("alpha")));
    assert_eq!(nested.table(), Some("project"));
});

sqlite_test!(nested_joins_compose, |db| {
    let (project, user, post) = seed_graph(&db);

    let select = Select::new("post")
        .join(JoinSpec::new("user").join(JoinSpec::new("project").fields(["name"])));
    let record = db.get_one(&select)?.expect("post");

    assert_eq!(record.value("id"), Some(&int(post)));
    assert!(!record.contains_key("user_id"));
    let author = record.record("user").expect("user");
    assert_eq!(author.value("id"), Some(&int(user)));
    assert!(!author.contains_key("project_id"));
    let team = author.record("project").expect("project");
    assert_eq!(team.keys().collect::<Vec<_>>(), ["id", "name", "type"]);
    assert_eq!(team.value("id"), Some(&int(project)));
});

sqlite_test!(sibling_joins_attach_to_the_same_parent, |db| {
    let (project, user, post) = seed_graph(&db);

    let select = Select::new("post")
        .fields(["title"])
        .join(JoinSpec::new("user").fields(["name"]))
        .join(JoinSpec::new("project").fields(["name"]));
    let record = db.get_one(&select)?.expect("post");

    assert_eq!(
        record.keys().collect::<Vec<_>>(),
        ["id", "project", "title", "type", "user"]
    );
    assert_eq!(record.value("id"), Some(&int(post)));
    assert_eq!(record.record("user").and_then(|u| u.value("id")), Some(&int(user)));
    assert_eq!(
        record.record("project").and_then(|p| p.value("id")),
        Some(&int(project))
    );
});

sqlite_test!(join_conditions_filter_the_result, |db| {
    seed_graph(&db);
    let other = db.create("project", fields! { "name" => "beta" })?;
    db.create("user", fields! { "name" => "bob", "project_id" => other })?;
    db.create("user", fields! { "name" => "cy" })?;

    let select = Select::new("user")
        .join(JoinSpec::new("project").condition(FilterGroup::new().eq("name", "beta")))
        .limit(10);
    let page = db.get(&select)?;
    assert_eq!(page.len(), 1);
    assert_eq!(page.max_pages, 1);
    assert_eq!(page.records[0].value("name"), Some(&text("bob")));

    let all = db.get(&Select::new("user").join(JoinSpec::new("project")).limit(10))?;
    assert_eq!(all.len(), 2, "users without a project are dropped by the join");
});

sqlite_test!(qualified_fields_reach_joined_tables, |db| {
    seed_graph(&db);
    let other = db.create("project", fields! { "name" => "beta" })?;
    db.create("user", fields! { "name" => "bob", "project_id" => other })?;

    let select = Select::new("user")
        .filter(FilterGroup::new().eq("project.name", "alpha"))
        .join(JoinSpec::new("project"))
        .order_by("project.name", OrderBy::Desc);
    let page = db.get(&select)?;
    assert_eq!(page.len(), 1);
    assert_eq!(page.records[0].value("name"), Some(&text("ann")));

    let err = db
        .get(&Select::new("user").filter(FilterGroup::new().eq("project.name", "alpha")))
        .unwrap_err();
    assert!(matches!(err, SqlDbError::Schema(SchemaError::UnknownTable { .. })));
});

sqlite_test!(join_identifiers_are_validated, |db| {
    let err = db
        .get(&Select::new("user").join(JoinSpec::new("company")))
        .unwrap_err();
    assert!(matches!(err, SqlDbError::Schema(SchemaError::UnknownTable { .. })));

    let err = db
        .get(&Select::new("project").join(JoinSpec::new("post")))
        .unwrap_err();
    assert!(
        matches!(err, SqlDbError::Schema(SchemaError::UnknownFields { ref table, .. }) if table == "project"),
        "project has no post_id: {err:?}"
    );

    let err = db
        .get(&Select::new("user").join(JoinSpec::new("project").fields(["budget"])))
        .unwrap_err();
    assert!(matches!(err, SqlDbError::Schema(SchemaError::UnknownFields { .. })));
});

sqlite_test!(one_to_many_joins_yield_one_record_per_child, |db| {
    let (project, _, _) = seed_graph(&db);
    db.create("user", fields! { "name" => "bob", "project_id" => project })?;

    let select = Select::new("project")
        .join(
            JoinSpec::new("user")
                .src_field("project_id")
                .dst_field("id")
                .fields(["name"]),
        )
        .order_by("user.name", OrderBy::Asc);
    let page = db.get(&select)?;
    assert_eq!(page.len(), 2);
    for record in &page.records {
        assert_eq!(record.value("name"), Some(&text("alpha")));
        // the join consumed the parent's id column
        assert!(!record.contains_key("id"));
    }
    let users: Vec<_> = page
        .records
        .iter()
        .filter_map(|r| r.record("user").and_then(|u| u.value("name")).cloned())
        .collect();
    assert_eq!(users, [text("ann"), text("bob")]);
});

sqlite_test!(pages_serialise_as_nested_json, |db| {
    seed_graph(&db);
    let page = db.get(
        &Select::new("user")
            .fields(["name"])
            .join(JoinSpec::new("project").fields(["name"]))
            .limit(5),
    )?;
    let json = serde_json::to_value(&page).expect("serialise page");
    assert_eq!(
        json,
        serde_json::json!({
            "records": [{
                "id": 1,
                "name": "ann",
                "type": "user",
                "project": { "id": 1, "name": "alpha", "type": "project" }
            }],
            "max_pages": 1
        })
    );
});
