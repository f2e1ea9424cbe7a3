//! Record action tests against realistic change payloads
//!
//! Run with: cargo test --package rlm-actions --test actions_tests

use pretty_assertions::assert_eq;
use rlm_actions::{
    AddFieldsChange, DefaultLinkDataActions, DefaultRecordActions, LinkDataActions, MergeMode,
    RecordActions, RemoveSubfieldsChange, ReplaceValueChange,
};
use rlm_record::{Record, Subfield};
use rlm_test_utils::{
    fin11_replace_change, remove_subfields_change, sample_record, sample_source_record,
    subject_field, yso_add_change,
};
use serde_json::{json, Value};

fn add_change(value: Value) -> AddFieldsChange {
    serde_json::from_value(value).unwrap()
}

fn remove_change(value: Value) -> RemoveSubfieldsChange {
    serde_json::from_value(value["removeSubfields"].clone()).unwrap()
}

async fn add_from_link_data(record: Record, change: &AddFieldsChange, link: &Value) -> Record {
    let candidates = DefaultLinkDataActions::new()
        .convert_link_data_to_fields(Some(link), change)
        .await
        .unwrap();
    let actions = DefaultRecordActions::new();
    let unique = actions
        .filter_existing_fields(candidates, &record, &change.duplicate_filter_codes)
        .await
        .unwrap();
    actions
        .add_or_replace_fields(record, unique, change)
        .await
        .unwrap()
}

#[tokio::test]
async fn subject_links_are_added_once() {
    let change = add_change(yso_add_change());
    let link = json!(["p123", "p2", "p2"]);

    let record = add_from_link_data(sample_record(), &change, &link).await;
    let subjects: Vec<_> = record.fields_by_tag("650").cloned().collect();

    assert_eq!(
        subjects,
        vec![subject_field("kissat", "p123"), subject_field("p2", "p2")]
    );
}

#[tokio::test]
async fn object_link_data_fills_by_code() {
    let change = add_change(json!({
        "add": {"tag": "700", "ind1": "1", "subfields": [
            {"code": "a", "value": "%s"},
            {"code": "d", "value": "%s"},
            {"code": "0", "value": "(FIN11)%s"}
        ]},
        "order": ["a", "d", "0"],
        "duplicateFilterCodes": ["0"]
    }));
    let link = json!([
        {"a": "Virtanen, Ville", "0": "000555"},
        {"a": "Korhonen, Kaisa", "d": "1970-", "0": "000556"}
    ]);

    let record = add_from_link_data(sample_record(), &change, &link).await;
    let added: Vec<_> = record.fields_by_tag("700").collect();

    assert_eq!(added.len(), 2);
    assert_eq!(
        added[0].subfields,
        vec![
            Subfield::new("a", "Virtanen, Ville"),
            Subfield::new("0", "(FIN11)000555"),
        ]
    );
    assert_eq!(added[1].subfield("d"), Some("1970-"));
    assert_eq!(record.fields().last().unwrap().tag, "700");
}

#[tokio::test]
async fn replace_mode_swaps_existing_subjects() {
    let mut change = add_change(yso_add_change());
    change.mode = MergeMode::Replace;
    let link = json!("p999");

    let record = add_from_link_data(sample_record(), &change, &link).await;
    let subjects: Vec<_> = record.fields_by_tag("650").cloned().collect();

    assert_eq!(subjects, vec![subject_field("p999", "p999")]);
}

#[tokio::test]
async fn authority_id_written_to_matching_author() {
    let change: ReplaceValueChange = serde_json::from_value(fin11_replace_change()).unwrap();
    let source = sample_source_record();

    let record = DefaultRecordActions::new()
        .replace_value_in_field(Some(&source), sample_record(), &change)
        .await
        .unwrap();

    let author = record.first_field("100").unwrap();
    assert_eq!(
        author.subfields,
        vec![
            Subfield::new("a", "Meikäläinen, Matti"),
            Subfield::new("d", "1950-"),
            Subfield::new("0", "(FIN11)000987"),
        ]
    );
}

#[tokio::test]
async fn authority_id_skips_other_author() {
    let change: ReplaceValueChange = serde_json::from_value(fin11_replace_change()).unwrap();
    let source = Record::with_fields(
        "",
        vec![
            rlm_record::Field::control("001", "000111"),
            rlm_test_utils::author_field("Toinen, Tiina", "1980-"),
        ],
    );

    let original = sample_record();
    let record = DefaultRecordActions::new()
        .replace_value_in_field(Some(&source), original.clone(), &change)
        .await
        .unwrap();

    assert_eq!(record, original);
}

#[tokio::test]
async fn pattern_removal_targets_only_matching_values() {
    let change = remove_change(remove_subfields_change("650", "0", "/p1/"));
    let mut record = sample_record();
    record.insert_field(subject_field("koirat", "p9"));

    let record = DefaultRecordActions::new()
        .remove_subfields(record, &change)
        .await
        .unwrap();
    let subjects: Vec<_> = record.fields_by_tag("650").collect();

    assert_eq!(subjects.len(), 2);
    assert_eq!(subjects[0].subfield("0"), None);
    assert_eq!(
        subjects[1].subfield("0"),
        Some("http://www.yso.fi/onto/yso/p9")
    );
}
