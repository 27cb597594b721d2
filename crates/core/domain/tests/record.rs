use domain::{ArrayData, DeliveryReport, NdArray, ReadingValue, Record, Scalar};
use std::collections::BTreeMap;

#[test]
fn record_builds() {
    let mut reading = BTreeMap::new();
    reading.insert("temp".to_string(), ReadingValue::from(21.5));
    reading.insert(
        "vector".to_string(),
        ReadingValue::from(NdArray::from_flat(ArrayData::I32(vec![1, 2, 3]))),
    );
    let record = Record::new(7, "Room A/1", "2024-01-01 00:00:00.000000+00:00", reading);

    assert_eq!(record.id, 7);
    assert_eq!(record.asset_code, "Room A/1");
    assert_eq!(
        record.reading.get("temp"),
        Some(&ReadingValue::Scalar(Scalar::F64(21.5)))
    );
    assert!(matches!(
        record.reading.get("vector"),
        Some(ReadingValue::Array(array)) if array.shape() == [3]
    ));
}

#[test]
fn empty_report_is_successful_with_zero_checkpoint() {
    let report = DeliveryReport::nothing_to_send();
    assert!(report.success);
    assert_eq!(report.last_object_id, 0);
    assert_eq!(report.count_sent, 0);
}
