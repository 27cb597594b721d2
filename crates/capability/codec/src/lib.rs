//! # 数组编码能力模块
//!
//! 将 N 维数值数组编码为可传输的标量表示（dtype + shape + 扁平数据），
//! 接收方可据此无损还原数组。
//!
//! ```text
//! NdArray ──encode(Plain)──▶ {"__ndarray__": [1, 2, 3, 4], "dtype": "int32", "shape": [2, 2]}
//!         ──encode(Base64)─▶ {"__ndarray__": "AQAAAAIAAAADAAAABAAAAA==", ...}
//! ```
//!
//! - 扁平化顺序固定为行优先（C 顺序）
//! - base64 模式编码原始连续字节缓冲区（小端）
//! - 相同输入与模式总是产生完全相同的输出

mod bytes;
mod json;

use base64::{Engine as _, engine::general_purpose};
use domain::{DType, NdArray, ShapeError, element_count};
use serde_json::Value;
use wire_contract::{EncodedArray, EncodedData};

pub use json::array_from_json;

/// 编解码错误。
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("unsupported type: {0}")]
    UnsupportedType(String),
    #[error("unknown dtype: {0}")]
    UnknownDType(String),
    #[error("invalid base64: {0}")]
    InvalidBase64(String),
    #[error("invalid element for {dtype}: {value}")]
    InvalidElement { dtype: DType, value: String },
    #[error("buffer of {actual} bytes does not hold {count} x {dtype}")]
    BufferLength {
        dtype: DType,
        count: usize,
        actual: usize,
    },
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// 数据部分的编码方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodeMode {
    /// 行优先扁平元素列表。
    Plain,
    /// 原始字节缓冲区的 base64 字符串。
    #[default]
    Base64,
}

/// 编码数组。
pub fn encode(array: &NdArray, mode: EncodeMode) -> EncodedArray {
    let data = match mode {
        EncodeMode::Plain => EncodedData::Plain(bytes::to_values(array.data())),
        EncodeMode::Base64 => {
            EncodedData::Base64(general_purpose::STANDARD.encode(bytes::to_le_bytes(array.data())))
        }
    };
    EncodedArray {
        data,
        dtype: array.dtype().as_str().to_string(),
        shape: array.shape().to_vec(),
    }
}

/// 编码宿主 JSON 中的数组值；非数值数组返回 `UnsupportedType`。
pub fn encode_json(value: &Value, mode: EncodeMode) -> Result<EncodedArray, CodecError> {
    let array = array_from_json(value)?;
    Ok(encode(&array, mode))
}

/// 按 dtype 与 shape 还原数组。
pub fn decode(encoded: &EncodedArray) -> Result<NdArray, CodecError> {
    let dtype = DType::parse(&encoded.dtype)
        .ok_or_else(|| CodecError::UnknownDType(encoded.dtype.clone()))?;
    let count = element_count(&encoded.shape).ok_or_else(|| ShapeError::Overflow {
        shape: encoded.shape.clone(),
    })?;
    let data = match &encoded.data {
        EncodedData::Base64(text) => {
            let raw = general_purpose::STANDARD
                .decode(text)
                .map_err(|err| CodecError::InvalidBase64(err.to_string()))?;
            bytes::from_le_bytes(dtype, count, &raw)?
        }
        EncodedData::Plain(values) => bytes::from_values(dtype, values)?,
    };
    Ok(NdArray::new(encoded.shape.clone(), data)?)
}
