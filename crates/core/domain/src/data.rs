use crate::array::NdArray;
use std::collections::BTreeMap;

/// 宿主分配的记录标识（单调递增，用作检查点）。
pub type RecordId = u64;

/// 标量读数值。
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    I64(i64),
    F64(f64),
    Bool(bool),
    String(String),
}

/// 读数值：在记录接入时即确定是标量、数组还是无法识别的值。
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingValue {
    Scalar(Scalar),
    Array(NdArray),
    /// 编码器不识别的值，原样透传。
    Opaque(serde_json::Value),
}

impl From<i64> for ReadingValue {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::I64(value))
    }
}

impl From<f64> for ReadingValue {
    fn from(value: f64) -> Self {
        Self::Scalar(Scalar::F64(value))
    }
}

impl From<bool> for ReadingValue {
    fn from(value: bool) -> Self {
        Self::Scalar(Scalar::Bool(value))
    }
}

impl From<&str> for ReadingValue {
    fn from(value: &str) -> Self {
        Self::Scalar(Scalar::String(value.to_string()))
    }
}

impl From<String> for ReadingValue {
    fn from(value: String) -> Self {
        Self::Scalar(Scalar::String(value))
    }
}

impl From<NdArray> for ReadingValue {
    fn from(value: NdArray) -> Self {
        Self::Array(value)
    }
}

/// 宿主交付的一条读数记录。
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    /// 来源设备/表名，发送前需规整（空格与 `/` 替换为 `_`）。
    pub asset_code: String,
    /// 宿主采集时间，原样透传。
    pub user_ts: serde_json::Value,
    pub reading: BTreeMap<String, ReadingValue>,
}

impl Record {
    pub fn new(
        id: RecordId,
        asset_code: impl Into<String>,
        user_ts: impl Into<serde_json::Value>,
        reading: BTreeMap<String, ReadingValue>,
    ) -> Self {
        Self {
            id,
            asset_code: asset_code.into(),
            user_ts: user_ts.into(),
            reading,
        }
    }
}

/// 一次 send 调用的结果，宿主据此推进检查点。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub success: bool,
    pub last_object_id: RecordId,
    pub count_sent: usize,
}

impl DeliveryReport {
    pub fn sent(last_object_id: RecordId, count_sent: usize) -> Self {
        Self {
            success: true,
            last_object_id,
            count_sent,
        }
    }

    pub fn failed(last_object_id: RecordId, count_sent: usize) -> Self {
        Self {
            success: false,
            last_object_id,
            count_sent,
        }
    }

    /// 过滤后无记录：不发请求，检查点为 0。
    pub fn nothing_to_send() -> Self {
        Self::sent(0, 0)
    }
}
