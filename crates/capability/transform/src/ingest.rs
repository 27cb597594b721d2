//! 宿主 JSON 记录 → Record。
//!
//! 宿主记录形如 `{"id": 1, "asset_code": "...", "user_ts": "...", "reading": {...}}`。
//! 读数值在此处一次性判定为标量、数组或不识别的值。

use crate::TransformError;
use anylog_codec::array_from_json;
use domain::{ReadingValue, Record, RecordId, Scalar};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// 解析单条宿主记录；缺失 `id`、`asset_code`、`user_ts`、`reading` 时返回 `MalformedRecord`。
pub fn record_from_json(value: &Value) -> Result<Record, TransformError> {
    let object = value
        .as_object()
        .ok_or_else(|| TransformError::MalformedRecord("record is not an object".to_string()))?;

    let id = object
        .get("id")
        .and_then(parse_id)
        .ok_or_else(|| TransformError::MalformedRecord("id".to_string()))?;
    let asset_code = object
        .get("asset_code")
        .and_then(Value::as_str)
        .ok_or_else(|| TransformError::MalformedRecord("asset_code".to_string()))?;
    let user_ts = match object.get("user_ts") {
        Some(Value::Null) | None => {
            return Err(TransformError::MalformedRecord("user_ts".to_string()));
        }
        Some(user_ts) => user_ts.clone(),
    };
    let reading = object
        .get("reading")
        .and_then(Value::as_object)
        .ok_or_else(|| TransformError::MalformedRecord("reading".to_string()))?;

    let reading = reading
        .iter()
        .map(|(key, value)| (key.clone(), reading_value(key, value)))
        .collect::<BTreeMap<_, _>>();

    Ok(Record {
        id,
        asset_code: asset_code.to_string(),
        user_ts,
        reading,
    })
}

fn parse_id(value: &Value) -> Option<RecordId> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse::<RecordId>().ok(),
        _ => None,
    }
}

fn reading_value(key: &str, value: &Value) -> ReadingValue {
    match value {
        Value::Bool(v) => ReadingValue::Scalar(Scalar::Bool(*v)),
        Value::String(v) => ReadingValue::Scalar(Scalar::String(v.clone())),
        Value::Number(number) => {
            if let Some(v) = number.as_i64() {
                ReadingValue::Scalar(Scalar::I64(v))
            } else if number.is_f64() {
                ReadingValue::Scalar(Scalar::F64(number.as_f64().unwrap_or(f64::NAN)))
            } else {
                // 超出 i64 的整数保持原始数值。
                ReadingValue::Opaque(value.clone())
            }
        }
        Value::Array(_) => match array_from_json(value) {
            Ok(array) => ReadingValue::Array(array),
            Err(err) => {
                debug!(target: "anylog.transform", field = %key, error = %err, "array_not_encodable");
                ReadingValue::Opaque(value.clone())
            }
        },
        Value::Null | Value::Object(_) => ReadingValue::Opaque(value.clone()),
    }
}
