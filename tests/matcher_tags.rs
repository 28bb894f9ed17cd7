//! Matcher tagging semantics: EXISTS/AMEND/ADD, short-circuit amend
//! checks, cross-section key resolution, hierarchy failures.

mod common;

use common::fixtures;
use mex::snapshot::{preview, Tag, CHECK_KEY};
use mex::MexError;
use serde_json::json;

#[test]
fn tags_exists_when_all_watched_fields_match() {
    let storage = common::test_db();
    fixtures::seed_base(&storage);

    let mut document = fixtures::empty_document();
    document["currencies"]["EUR"] = fixtures::euro_entry();
    let mut snapshot = fixtures::snapshot_from(&document);

    let report = preview(&storage, &mut snapshot).unwrap();
    assert_eq!(report.count(Tag::Exists), 1);
    assert_eq!(report.count(Tag::Amend), 0);
    assert_eq!(report.count(Tag::Add), 0);

    let entry = &snapshot.section("currencies")["EUR"];
    assert_eq!(entry[CHECK_KEY], "EXISTS");
    // pk written back under the section's configured key name
    assert_eq!(entry["iso3"], "EUR");
}

#[test]
fn tags_amend_with_first_mismatching_field() {
    let storage = common::test_db();
    fixtures::seed_base(&storage);

    // symbol and fractional_unit both differ; symbol is declared first
    let mut entry = fixtures::euro_entry();
    entry["symbol"] = json!("€");
    entry["fractional_unit"] = json!("centesimo");
    let mut document = fixtures::empty_document();
    document["currencies"]["EUR"] = entry;
    let mut snapshot = fixtures::snapshot_from(&document);

    let report = preview(&storage, &mut snapshot).unwrap();
    assert_eq!(report.count(Tag::Amend), 1);

    let amended = report
        .entries
        .iter()
        .find(|e| e.tag == Tag::Amend)
        .unwrap();
    assert_eq!(amended.section, "currencies");
    assert_eq!(amended.amend_field.as_deref(), Some("symbol"));
    assert_eq!(snapshot.section("currencies")["EUR"][CHECK_KEY], "AMEND");
}

#[test]
fn tags_add_when_not_found() {
    let storage = common::test_db();
    fixtures::seed_base(&storage);

    let mut document = fixtures::empty_document();
    document["clients"]["1"] = json!({"name": "Globex"});
    let mut snapshot = fixtures::snapshot_from(&document);

    let report = preview(&storage, &mut snapshot).unwrap();
    assert_eq!(report.count(Tag::Add), 1);
    let entry = &snapshot.section("clients")["1"];
    assert_eq!(entry[CHECK_KEY], "ADD");
    // no pk write-back for unmatched entries
    assert!(entry.get("id").is_none());
}

#[test]
fn cross_section_key_resolves_through_written_back_pk() {
    let storage = common::test_db();
    fixtures::seed_base(&storage);

    let mut document = fixtures::empty_document();
    // ordinal ids deliberately differ from live ids
    document["clients"]["77"] = json!({"name": "Acme Corp"});
    document["projects"]["9"] = json!({
        "name": "Warehouse rollout",
        "client": 77,
        "notes": "phase one"
    });
    let mut snapshot = fixtures::snapshot_from(&document);

    let report = preview(&storage, &mut snapshot).unwrap();
    assert_eq!(report.count(Tag::Exists), 2);
    assert_eq!(snapshot.section("projects")["9"]["id"], 1);
}

#[test]
fn unresolvable_reference_downgrades_to_add() {
    let storage = common::test_db();
    fixtures::seed_base(&storage);

    let mut document = fixtures::empty_document();
    // project references a client entry that is not in the snapshot
    document["projects"]["9"] = json!({
        "name": "Warehouse rollout",
        "client": 404,
        "notes": "phase one"
    });
    let mut snapshot = fixtures::snapshot_from(&document);

    let report = preview(&storage, &mut snapshot).unwrap();
    assert_eq!(report.count(Tag::Add), 1);
    assert_eq!(snapshot.section("projects")["9"][CHECK_KEY], "ADD");
}

#[test]
fn project_under_add_tagged_client_is_add_not_error() {
    let storage = common::test_db();
    fixtures::seed_base(&storage);

    let mut document = fixtures::empty_document();
    document["clients"]["5"] = json!({"name": "Globex"});
    document["projects"]["6"] = json!({
        "name": "Warehouse rollout",
        "client": 5,
        "notes": "phase one"
    });
    let mut snapshot = fixtures::snapshot_from(&document);

    let report = preview(&storage, &mut snapshot).unwrap();
    // client unknown -> ADD; its project cannot resolve -> ADD as well
    assert_eq!(report.count(Tag::Add), 2);
}

#[test]
fn stale_exported_pk_does_not_leak_into_resolution() {
    let storage = common::test_db();
    fixtures::seed_base(&storage);

    // the snapshot's client does not exist here, but its exported id
    // collides with a live client's id
    let mut document = fixtures::empty_document();
    document["clients"]["8"] = json!({"id": 1, "name": "Globex"});
    document["projects"]["9"] = json!({
        "name": "Warehouse rollout",
        "client": 8,
        "notes": "phase one"
    });
    let mut snapshot = fixtures::snapshot_from(&document);

    let report = preview(&storage, &mut snapshot).unwrap();
    assert_eq!(report.count(Tag::Add), 2);
    assert_eq!(snapshot.section("projects")["9"][CHECK_KEY], "ADD");
}

#[test]
fn hierarchy_mismatch_is_a_hard_error() {
    let storage = common::test_db();
    fixtures::seed_base(&storage);

    let mut document = fixtures::empty_document();
    document["categories"]["2"] = json!({
        "id": 2,
        "title": "Train",
        "active": true,
        "parent": 1,
        "tree": "Transport:Train"
    });
    // a mission after the failing section must stay untouched
    document["missions"]["1"] = json!({
        "number": 1, "year": 2024, "title": "Kickoff",
        "from_date": "2024-03-04", "to_date": "2024-03-08",
        "default_currency": "EUR"
    });
    let mut snapshot = fixtures::snapshot_from(&document);

    let err = preview(&storage, &mut snapshot).unwrap_err();
    match err {
        MexError::HierarchyMismatch {
            section,
            expected,
            found,
            ..
        } => {
            assert_eq!(section, "categories");
            assert_eq!(expected, "Transport:Train");
            assert_eq!(found, "Travel:Train");
        }
        other => panic!("expected hierarchy mismatch, got {other}"),
    }
    assert!(snapshot.section("missions")["1"].get(CHECK_KEY).is_none());
}

#[test]
fn matching_hierarchy_still_checks_amend_fields() {
    let storage = common::test_db();
    fixtures::seed_base(&storage);

    let mut document = fixtures::empty_document();
    document["categories"]["2"] = json!({
        "id": 2,
        "title": "Train",
        "active": false,
        "parent": 1,
        "tree": "Travel:Train"
    });
    let mut snapshot = fixtures::snapshot_from(&document);

    let report = preview(&storage, &mut snapshot).unwrap();
    assert_eq!(report.count(Tag::Amend), 1);
    assert_eq!(
        report.entries[0].amend_field.as_deref(),
        Some("active")
    );
}

#[test]
fn ambiguous_natural_key_is_a_hard_error() {
    let storage = common::test_db();
    fixtures::seed_base(&storage);
    // two categories titled the same under different parents
    storage
        .insert_expense_category(&fixtures::expense_category(10, "Meals", None))
        .unwrap();
    storage
        .insert_expense_category(&fixtures::expense_category(11, "Meals", Some(1)))
        .unwrap();

    let mut document = fixtures::empty_document();
    document["categories"]["3"] = json!({
        "title": "Meals",
        "active": true,
        "tree": "Meals"
    });
    let mut snapshot = fixtures::snapshot_from(&document);

    let err = preview(&storage, &mut snapshot).unwrap_err();
    assert!(matches!(err, MexError::AmbiguousKey { .. }));
}

#[test]
fn mission_amend_uses_derived_values() {
    let storage = common::test_db();
    fixtures::seed_base(&storage);
    storage.insert_mission(&fixtures::mission(1, 1, 2024)).unwrap();

    // dates and currency code in canonical form -> EXISTS
    let mut document = fixtures::empty_document();
    document["missions"]["1"] = json!({
        "number": 1, "year": 2024, "title": "Kickoff",
        "from_date": "2024-03-04", "to_date": "2024-03-08",
        "default_currency": "EUR"
    });
    let mut snapshot = fixtures::snapshot_from(&document);
    let report = preview(&storage, &mut snapshot).unwrap();
    assert_eq!(report.count(Tag::Exists), 1);

    // a drifted title tags AMEND on the first declared field
    let mut document = fixtures::empty_document();
    document["missions"]["1"] = json!({
        "number": 1, "year": 2024, "title": "Kickoff v2",
        "from_date": "2024-03-04", "to_date": "2024-03-08",
        "default_currency": "EUR"
    });
    let mut snapshot = fixtures::snapshot_from(&document);
    let report = preview(&storage, &mut snapshot).unwrap();
    assert_eq!(report.entries[0].amend_field.as_deref(), Some("title"));
}

#[test]
fn preview_is_idempotent() {
    let storage = common::test_db();
    fixtures::seed_base(&storage);

    let mut document = fixtures::empty_document();
    document["clients"]["1"] = json!({"name": "Acme Corp"});
    document["clients"]["2"] = json!({"name": "Globex"});
    document["currencies"]["EUR"] = fixtures::euro_entry();

    let mut first = fixtures::snapshot_from(&document);
    let first_report = preview(&storage, &mut first).unwrap();
    let mut second = fixtures::snapshot_from(&document);
    let second_report = preview(&storage, &mut second).unwrap();

    assert_eq!(first_report, second_report);
    assert_eq!(first, second);

    // annotating an annotated snapshot changes nothing either
    let mut again = first.clone();
    let again_report = preview(&storage, &mut again).unwrap();
    assert_eq!(first_report, again_report);
    assert_eq!(first, again);
}
