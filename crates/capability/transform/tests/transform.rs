use anylog_codec::decode;
use anylog_transform::{TargetRecord, record_from_json, to_bulk, to_streaming, transform};
use domain::{ArrayData, NdArray, ReadingValue, Record};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use wire_contract::{EncodedArray, EncodedData, RestFormat};

fn sample_record() -> Record {
    let mut reading = BTreeMap::new();
    reading.insert("temp".to_string(), ReadingValue::from(21.5));
    reading.insert(
        "spectrum".to_string(),
        ReadingValue::from(
            NdArray::new(vec![2, 2], ArrayData::F32(vec![1.0, 2.0, 3.0, 4.0])).expect("array"),
        ),
    );
    reading.insert("meta".to_string(), ReadingValue::Opaque(json!({"unit": "C"})));
    Record::new(5, "Plant 1/Line 2", "2024-05-01 10:00:00.000000+00:00", reading)
}

#[test]
fn bulk_record_matches_wire_shape() {
    let record = record_from_json(&json!({
        "id": 1, "asset_code": "Room A/1", "user_ts": "t1", "reading": {"x": 1}
    }))
    .expect("record");
    let bulk = to_bulk(&record, "fledge");
    let body = serde_json::to_string(&vec![bulk]).expect("serialize");
    assert_eq!(
        body,
        r#"[{"dbms":"fledge","asset":"Room_A_1","timestamp":"t1","readings":{"x":1}}]"#
    );
}

#[test]
fn arrays_are_base64_encoded_in_readings() {
    let bulk = to_bulk(&sample_record(), "plant");
    assert_eq!(bulk.asset, "Plant_1_Line_2");
    let spectrum = bulk.readings.get("spectrum").expect("spectrum").clone();
    let encoded: EncodedArray = serde_json::from_value(spectrum).expect("encoded array");
    assert!(matches!(encoded.data, EncodedData::Base64(_)));
    assert_eq!(encoded.dtype, "float32");
    assert_eq!(encoded.shape, vec![2, 2]);
    let decoded = decode(&encoded).expect("decode");
    assert_eq!(decoded.data(), &ArrayData::F32(vec![1.0, 2.0, 3.0, 4.0]));
}

#[test]
fn scalars_and_opaque_values_pass_through() {
    let bulk = to_bulk(&sample_record(), "plant");
    assert_eq!(bulk.readings.get("temp"), Some(&json!(21.5)));
    assert_eq!(bulk.readings.get("meta"), Some(&json!({"unit": "C"})));
}

#[test]
fn streaming_flattens_readings_into_body() {
    let streaming = to_streaming(&sample_record(), "plant");
    assert_eq!(streaming.headers.dbms, "plant");
    assert_eq!(streaming.headers.table, "Plant_1_Line_2");
    assert_eq!(
        streaming.body.get("timestamp"),
        Some(&json!("2024-05-01 10:00:00.000000+00:00"))
    );
    assert_eq!(streaming.body.get("temp"), Some(&json!(21.5)));
    assert!(streaming.body.get("spectrum").is_some_and(Value::is_object));
    assert!(streaming.body.get("readings").is_none());
    assert_eq!(streaming.body.len(), 4);
}

#[test]
fn streaming_reading_named_timestamp_wins() {
    let mut reading = BTreeMap::new();
    reading.insert("timestamp".to_string(), ReadingValue::from(99_i64));
    let record = Record::new(1, "a", "t1", reading);
    let streaming = to_streaming(&record, "db");
    assert_eq!(streaming.body.get("timestamp"), Some(&json!(99)));
}

#[test]
fn transform_dispatches_on_format() {
    let record = sample_record();
    assert!(matches!(
        transform(&record, RestFormat::Post, "db"),
        TargetRecord::Bulk(_)
    ));
    assert!(matches!(
        transform(&record, RestFormat::Put, "db"),
        TargetRecord::Streaming(_)
    ));
}

#[test]
fn reading_keys_are_emitted_in_sorted_order() {
    let record = record_from_json(&json!({
        "id": 1, "asset_code": "a", "user_ts": "t1", "reading": {"zeta": 1, "alpha": 2, "mid": 3}
    }))
    .expect("record");
    let body = serde_json::to_string(&to_bulk(&record, "db")).expect("serialize");
    assert_eq!(
        body,
        r#"{"dbms":"db","asset":"a","timestamp":"t1","readings":{"alpha":2,"mid":3,"zeta":1}}"#
    );
    let streaming = to_streaming(&record, "db");
    let keys = streaming.body.keys().map(String::as_str).collect::<Vec<_>>();
    assert_eq!(keys, ["alpha", "mid", "timestamp", "zeta"]);
}
