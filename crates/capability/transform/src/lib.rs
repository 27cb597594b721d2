//! # 结构转换能力模块
//!
//! 将过滤后的记录转换为 AnyLog 接入端的两种线上形态：
//!
//! ```text
//! Record { id, asset_code, user_ts, reading }
//!       │
//!       ├── post ──▶ BulkRecord { dbms, asset, timestamp, readings }（整批一个 JSON 数组）
//!       └── put  ──▶ StreamingRecord { headers: { dbms, table }, body: { timestamp, <读数字段> } }
//! ```
//!
//! 数组读数统一以 base64 形式编码；标量原样透传。

mod ingest;

use anylog_codec::{EncodeMode, encode};
use anylog_telemetry::{record_array_encoded, record_opaque_passthrough};
use domain::{ReadingValue, Record, Scalar};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};
use wire_contract::{BulkRecord, RestFormat, StreamingHeaders, StreamingRecord};

pub use ingest::record_from_json;

/// 转换错误。
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("malformed record: {0}")]
    MalformedRecord(String),
}

/// 一条记录转换后的线上形态。
#[derive(Debug, Clone, PartialEq)]
pub enum TargetRecord {
    Bulk(BulkRecord),
    Streaming(StreamingRecord),
}

/// 规整资产名作为目标表名：空格与 `/` 替换为 `_`。
pub fn normalize_asset(asset_code: &str) -> String {
    asset_code.replace([' ', '/'], "_")
}

/// 按发送方式转换单条记录。
pub fn transform(record: &Record, format: RestFormat, db_name: &str) -> TargetRecord {
    match format {
        RestFormat::Post => TargetRecord::Bulk(to_bulk(record, db_name)),
        RestFormat::Put => TargetRecord::Streaming(to_streaming(record, db_name)),
    }
}

/// 批量形态。
pub fn to_bulk(record: &Record, db_name: &str) -> BulkRecord {
    BulkRecord {
        dbms: db_name.to_string(),
        asset: normalize_asset(&record.asset_code),
        timestamp: record.user_ts.clone(),
        readings: encode_readings(&record.reading),
    }
}

/// 流式形态：读数字段平铺到请求体顶层，同名 `timestamp` 字段覆盖采集时间。
pub fn to_streaming(record: &Record, db_name: &str) -> StreamingRecord {
    let table = normalize_asset(&record.asset_code);
    let mut body = Map::new();
    body.insert("timestamp".to_string(), record.user_ts.clone());
    for (key, value) in encode_readings(&record.reading) {
        if key == "timestamp" {
            warn!(
                target: "anylog.transform",
                record_id = record.id,
                table = %table,
                "reading_overrides_timestamp"
            );
        }
        body.insert(key, value);
    }
    StreamingRecord {
        headers: StreamingHeaders {
            dbms: db_name.to_string(),
            table,
        },
        body,
    }
}

/// 读数 → JSON：数组编码为 base64，标量与不识别的值原样保留。
pub fn encode_readings(reading: &BTreeMap<String, ReadingValue>) -> Map<String, Value> {
    reading
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(key, value)))
        .collect()
}

fn encode_value(key: &str, value: &ReadingValue) -> Value {
    match value {
        ReadingValue::Scalar(scalar) => scalar_value(scalar),
        ReadingValue::Array(array) => {
            record_array_encoded();
            let encoded = encode(array, EncodeMode::Base64);
            serde_json::to_value(encoded).unwrap_or(Value::Null)
        }
        ReadingValue::Opaque(raw) => {
            record_opaque_passthrough();
            debug!(target: "anylog.transform", field = %key, "reading_passed_through");
            raw.clone()
        }
    }
}

fn scalar_value(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::I64(v) => Value::from(*v),
        Scalar::F64(v) => serde_json::Number::from_f64(*v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Scalar::Bool(v) => Value::Bool(*v),
        Scalar::String(v) => Value::String(v.clone()),
    }
}
