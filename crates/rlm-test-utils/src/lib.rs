//! Testing utilities for RLM workspace
//!
//! Shared record fixtures, change descriptor payloads, and batch builders.

#![allow(missing_docs)]

use rlm_record::{Field, Record, Subfield};
use serde_json::{json, Value};

pub fn data_field(tag: &str, subfields: &[(&str, &str)]) -> Field {
    Field::data(
        tag,
        " ",
        " ",
        subfields
            .iter()
            .map(|(code, value)| Subfield::new(*code, *value))
            .collect(),
    )
}

pub fn subject_field(term: &str, id: &str) -> Field {
    Field::data(
        "650",
        " ",
        "7",
        vec![
            Subfield::new("a", term),
            Subfield::new("2", "yso/fin"),
            Subfield::new("0", format!("http://www.yso.fi/onto/yso/{id}")),
        ],
    )
}

pub fn author_field(name: &str, dates: &str) -> Field {
    Field::data(
        "100",
        "1",
        " ",
        vec![Subfield::new("a", name), Subfield::new("d", dates)],
    )
}

/// Bibliographic record with a control number, an author and a title
pub fn sample_record() -> Record {
    Record::with_fields(
        "00000cam a2200000 i 4500",
        vec![
            Field::control("001", "000123"),
            author_field("Meikäläinen, Matti", "1950-"),
            data_field("245", &[("a", "Kissojen elämä")]),
            subject_field("kissat", "p123"),
        ],
    )
}

/// Authority record supplying values for replace steps
pub fn sample_source_record() -> Record {
    Record::with_fields(
        "00000cz  a2200000n  4500",
        vec![
            Field::control("001", "000987"),
            author_field("Meikäläinen, Matti", "1950-"),
        ],
    )
}

pub fn record_value(record: &Record) -> Value {
    serde_json::to_value(record).unwrap()
}

pub fn remove_subfields_change(tag: &str, code: &str, value: &str) -> Value {
    json!({"removeSubfields": {"tag": tag, "code": code, "value": value}})
}

pub fn yso_add_change() -> Value {
    json!({
        "add": {"tag": "650", "ind1": " ", "ind2": "7", "subfields": [
            {"code": "a", "value": "%s"},
            {"code": "2", "value": "yso/fin"},
            {"code": "0", "value": "http://www.yso.fi/onto/yso/%s"}
        ]},
        "order": ["a", "2", "0"],
        "duplicateFilterCodes": ["2", "0"]
    })
}

pub fn fin11_replace_change() -> Value {
    json!({
        "from": {"tag": "001", "value": "value"},
        "to": {
            "tag": "100",
            "value": {"code": "0"},
            "format": "(FIN11)%s",
            "where": {
                "collect": ["a", "b", "c", "d", "q"],
                "from": {"tag": "100", "value": "collect"},
                "to": {"tag": "100", "value": "collect"}
            }
        },
        "order": ["a", "c", "q", "d", "e", "0"]
    })
}

pub fn batch_element(record: &Record, changes: Vec<Value>) -> Value {
    json!({"record": record_value(record), "changes": changes})
}

pub fn batch(elements: &[Value]) -> String {
    Value::Array(elements.to_vec()).to_string()
}
