//! AnyLog REST 接入端的线上契约：两种请求形态、数组编码结构与请求头。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 发送方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestFormat {
    /// 批量：一次 POST 携带整批记录。
    Post,
    /// 流式：每条记录一次 PUT。
    Put,
}

impl RestFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestFormat::Post => "post",
            RestFormat::Put => "put",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "post" => Some(RestFormat::Post),
            "put" => Some(RestFormat::Put),
            _ => None,
        }
    }
}

/// 批量（post）形态的单条记录，整批序列化为 JSON 数组作为请求体。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkRecord {
    pub dbms: String,
    pub asset: String,
    pub timestamp: Value,
    pub readings: Map<String, Value>,
}

/// 流式（put）形态的请求头部分。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingHeaders {
    pub dbms: String,
    pub table: String,
}

/// 流式（put）形态：请求头 + 扁平化请求体 `{timestamp, <读数字段>}`。
#[derive(Debug, Clone, PartialEq)]
pub struct StreamingRecord {
    pub headers: StreamingHeaders,
    pub body: Map<String, Value>,
}

/// 数组的线上编码：`{"__ndarray__": <base64 或扁平列表>, "dtype": ..., "shape": [...]}`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedArray {
    #[serde(rename = "__ndarray__")]
    pub data: EncodedData,
    pub dtype: String,
    pub shape: Vec<usize>,
}

/// 数组数据部分。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EncodedData {
    /// 原始连续字节缓冲区（小端）的 base64。
    Base64(String),
    /// 行优先扁平元素列表。
    Plain(Vec<Value>),
}

/// 请求头名称与固定取值。
pub mod headers {
    pub const COMMAND: &str = "command";
    pub const COMMAND_DATA: &str = "data";
    pub const TOPIC: &str = "topic";
    pub const USER_AGENT: &str = "User-Agent";
    pub const USER_AGENT_VALUE: &str = "AnyLog/1.23";
    pub const CONTENT_TYPE: &str = "content-type";
    pub const CONTENT_TYPE_TEXT: &str = "text/plain";

    pub const TYPE: &str = "type";
    pub const TYPE_JSON: &str = "json";
    pub const DBMS: &str = "dbms";
    pub const TABLE: &str = "table";
    pub const MODE: &str = "mode";
    pub const MODE_STREAMING: &str = "streaming";
}
