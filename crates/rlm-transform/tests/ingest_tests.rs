//! Ingest pipeline tests
//!
//! Drive whole batches through `Transformer` and check the event stream.
//!
//! Run with: cargo test --package rlm-transform --test ingest_tests

use pretty_assertions::assert_eq;
use rlm_test_utils::{
    batch, batch_element, fin11_replace_change, record_value, remove_subfields_change,
    sample_record, sample_source_record, yso_add_change,
};
use rlm_transform::emitter::channel;
use rlm_transform::{
    BatchEvent, ConversionError, ConversionResult, IngestError, TransformConfig, Transformer,
    NO_UPDATE_MESSAGE,
};
use serde_json::{json, Value};
use std::io::Cursor;

async fn ingest_with(config: TransformConfig, input: impl Into<Vec<u8>>) -> Vec<BatchEvent> {
    Transformer::new(config)
        .ingest(Cursor::new(input.into()))
        .collect_all()
        .await
}

async fn ingest(input: impl Into<Vec<u8>>) -> Vec<BatchEvent> {
    ingest_with(TransformConfig::default(), input).await
}

/// Record results ordered by element index
fn results(events: &[BatchEvent]) -> Vec<(usize, &ConversionResult)> {
    let mut out: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            BatchEvent::Record { index, result } => Some((*index, result)),
            _ => None,
        })
        .collect();
    out.sort_by_key(|(index, _)| *index);
    out
}

fn kinds(events: &[BatchEvent]) -> Vec<&'static str> {
    events.iter().map(BatchEvent::kind).collect()
}

#[tokio::test]
async fn removes_subfield_and_reports_update() {
    let input = json!([{
        "record": {"fields": [{"tag": "100", "subfields": [{"code": "a", "value": "X"}]}]},
        "changes": [{"removeSubfields": {"tag": "100", "code": "a", "value": "X"}}]
    }]);

    let events = ingest(input.to_string()).await;
    assert_eq!(kinds(&events), vec!["record", "end"]);

    let (index, result) = results(&events)[0];
    assert_eq!(index, 0);
    assert!(result.updated);
    let field = result.record.first_field("100").unwrap();
    assert_eq!(field.subfield("a"), None);
    assert!(matches!(events[1], BatchEvent::End { count: 1 }));
}

#[tokio::test]
async fn empty_array_ends_with_zero() {
    let events = ingest("[]").await;
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], BatchEvent::End { count: 0 }));
}

#[tokio::test]
async fn non_array_document_is_a_single_error() {
    let events = ingest(r#"{"record": {"fields": []}}"#).await;
    assert_eq!(kinds(&events), vec!["error"]);
    assert!(matches!(
        events[0],
        BatchEvent::Error(IngestError::NotAnArray { found: '{', .. })
    ));
}

#[tokio::test]
async fn syntax_error_keeps_earlier_elements() {
    let first = batch_element(&sample_record(), vec![]).to_string();
    let input = format!(r#"[{first}, {{"record": tru}}, {first}]"#);

    let events = ingest(input).await;
    let errors: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, BatchEvent::Error(IngestError::Syntax { .. })))
        .collect();

    assert_eq!(errors.len(), 1);
    assert_eq!(results(&events).len(), 1);
    assert!(!events.iter().any(|event| matches!(event, BatchEvent::End { .. })));
}

#[tokio::test]
async fn truncated_stream_reports_unexpected_eof() {
    let element = batch_element(&sample_record(), vec![]).to_string();
    let events = ingest(format!("[{element}, ")).await;

    assert_eq!(results(&events).len(), 1);
    assert!(events
        .iter()
        .any(|event| matches!(event, BatchEvent::Error(IngestError::UnexpectedEof { .. }))));
}

fn nested_object(levels: usize) -> String {
    format!("{}{{}}{}", r#"{"x":"#.repeat(levels), "}".repeat(levels))
}

#[tokio::test]
async fn deeply_nested_link_data_does_not_abort_batch() {
    let ok = batch_element(&sample_record(), vec![]).to_string();
    let deep = format!(
        r#"{{"record": {}, "changes": [], "linkData": {}}}"#,
        record_value(&sample_record()),
        nested_object(200)
    );
    let events = ingest(format!("[{ok}, {deep}, {ok}]")).await;

    assert_eq!(kinds(&events).last(), Some(&"end"));
    assert!(matches!(events.last(), Some(BatchEvent::End { count: 3 })));
    let outcomes = results(&events);
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[1].0, 1);
    assert!(!outcomes[1].1.updated);
}

#[tokio::test]
async fn element_past_depth_limit_fails_alone() {
    let ok = batch_element(&sample_record(), vec![]).to_string();
    let deep = format!(
        r#"{{"record": {}, "changes": [], "linkData": {}}}"#,
        record_value(&sample_record()),
        nested_object(300)
    );
    let events = ingest(format!("[{ok}, {deep}, {ok}]")).await;

    assert_eq!(events.len(), 4);
    assert!(matches!(events[3], BatchEvent::End { count: 3 }));
    assert!(events.iter().any(|event| matches!(
        event,
        BatchEvent::Failed {
            index: 1,
            error: ConversionError::TooDeep { limit: 256, .. }
        }
    )));
    let indices: Vec<_> = results(&events).iter().map(|(index, _)| *index).collect();
    assert_eq!(indices, vec![0, 2]);
}

#[tokio::test]
async fn conversion_failure_is_counted_but_not_fatal() {
    let input = batch(&[
        batch_element(&sample_record(), vec![fin11_replace_change()]),
        batch_element(&sample_record(), vec![remove_subfields_change("245", "a", "*")]),
        json!({"changes": []}),
    ]);

    let events = ingest(input).await;
    assert_eq!(events.len(), 4);
    assert!(matches!(events[3], BatchEvent::End { count: 3 }));

    let mut failures: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            BatchEvent::Failed { index, error } => Some((*index, error)),
            _ => None,
        })
        .collect();
    failures.sort_by_key(|(index, _)| *index);

    assert_eq!(failures.len(), 2);
    assert!(matches!(
        failures[0],
        (0, ConversionError::Change { kind: "replace", .. })
    ));
    assert!(matches!(failures[1], (2, ConversionError::InvalidElement(_))));
    assert_eq!(results(&events)[0].0, 1);
}

#[tokio::test]
async fn unrecognized_descriptor_is_not_an_update() {
    let input = batch(&[batch_element(
        &sample_record(),
        vec![json!({"renameField": {"from": "650"}})],
    )]);

    let events = ingest(input).await;
    let (_, result) = results(&events)[0];
    assert!(!result.updated);
    assert_eq!(result.record, sample_record());
    assert_eq!(result.messages, vec![NO_UPDATE_MESSAGE.to_string()]);
}

#[tokio::test]
async fn end_follows_every_record() {
    let elements: Vec<Value> = (0..50)
        .map(|i| {
            let code = if i % 2 == 0 { "a" } else { "x" };
            batch_element(&sample_record(), vec![remove_subfields_change("245", code, "*")])
        })
        .collect();

    let events = ingest(batch(&elements)).await;
    assert_eq!(events.len(), 51);
    assert!(matches!(events[50], BatchEvent::End { count: 50 }));

    let indices: Vec<_> = results(&events).iter().map(|(index, _)| *index).collect();
    assert_eq!(indices, (0..50).collect::<Vec<_>>());

    let updated = results(&events).iter().filter(|(_, r)| r.updated).count();
    assert_eq!(updated, 25);
}

#[tokio::test]
async fn admission_limit_does_not_change_results() {
    let elements: Vec<Value> = (0..20)
        .map(|_| batch_element(&sample_record(), vec![remove_subfields_change("650", "0", "*")]))
        .collect();
    let input = batch(&elements);

    for limit in [1, 3] {
        let config = TransformConfig::new().with_max_in_flight(limit);
        let events = ingest_with(config, input.clone()).await;
        assert_eq!(results(&events).len(), 20);
        assert!(matches!(events.last(), Some(BatchEvent::End { count: 20 })));
    }
}

#[tokio::test]
async fn tiny_read_chunks_give_same_events() {
    let input = batch(&[
        batch_element(&sample_record(), vec![remove_subfields_change("100", "d", "/^19/")]),
        batch_element(&sample_record(), vec![]),
    ]);

    let whole = ingest(input.clone()).await;
    let chunked = ingest_with(TransformConfig::new().with_read_chunk_size(1), input).await;

    assert_eq!(kinds(&chunked).len(), kinds(&whole).len());
    for ((_, a), (_, b)) in results(&whole).into_iter().zip(results(&chunked)) {
        assert_eq!(a, b);
    }
}

#[tokio::test]
async fn split_reads_from_async_source() {
    let element = batch_element(&sample_record(), vec![remove_subfields_change("245", "a", "*")])
        .to_string();
    let (head, tail) = element.as_bytes().split_at(element.len() / 2);
    let reader = tokio_test::io::Builder::new()
        .read(b" [")
        .read(head)
        .read(tail)
        .read(b"]\n")
        .build();

    let (sink, events) = channel();
    let summary = Transformer::default().run(reader, sink).await;
    let events = events.collect_all().await;

    assert_eq!(summary.dispatched, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(kinds(&events), vec!["record", "end"]);
}

#[tokio::test]
async fn read_failure_is_an_ingest_error() {
    let reader = tokio_test::io::Builder::new()
        .read(b"[")
        .read_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"))
        .build();

    let (sink, events) = channel();
    let summary = Transformer::default().run(reader, sink).await;
    let events = events.collect_all().await;

    assert!(summary.aborted);
    assert_eq!(kinds(&events), vec!["error"]);
    assert!(matches!(events[0], BatchEvent::Error(IngestError::Io(_))));
}

#[tokio::test]
async fn link_data_and_host_record_flow_through() {
    let input = batch(&[
        json!({
            "record": record_value(&sample_record()),
            "changes": [yso_add_change()],
            "linkData": ["p123", "p999"]
        }),
        json!({
            "record": record_value(&sample_record()),
            "hostRecord": record_value(&sample_source_record()),
            "changes": [fin11_replace_change()]
        }),
    ]);

    let events = ingest(input).await;
    let outcomes = results(&events);
    assert_eq!(outcomes.len(), 2);

    let subjects: Vec<_> = outcomes[0].1.record.fields_by_tag("650").collect();
    assert_eq!(subjects.len(), 2);
    assert_eq!(subjects[1].subfield("a"), Some("p999"));

    let author = outcomes[1].1.record.first_field("100").unwrap();
    assert_eq!(author.subfield("0"), Some("(FIN11)000987"));
}

#[tokio::test]
async fn validation_flags_emptied_fields() {
    let input = batch(&[batch_element(
        &sample_record(),
        vec![remove_subfields_change("245", "a", "*")],
    )]);

    let events = ingest_with(TransformConfig::new().with_validate(true), input.clone()).await;
    let (_, result) = results(&events)[0];
    assert!(result.failed);
    assert!(result.record.first_field("245").is_some());

    let events = ingest_with(
        TransformConfig::new().with_validate(true).with_fix(true),
        input,
    )
    .await;
    let (_, result) = results(&events)[0];
    assert!(result.updated);
}

#[tokio::test]
async fn events_render_as_json_lines() {
    let input = batch(&[batch_element(&sample_record(), vec![])]);
    let lines: Vec<Value> = ingest(input).await.iter().map(BatchEvent::to_value).collect();

    assert_eq!(lines[0]["event"], "record");
    assert_eq!(lines[0]["result"]["messages"], json!([NO_UPDATE_MESSAGE]));
    assert_eq!(lines[1], json!({"event": "end", "count": 1}));
}
