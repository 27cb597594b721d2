//! 元素 ⇄ 小端字节 / JSON 值的转换。

use crate::CodecError;
use domain::{ArrayData, DType};
use serde_json::Value;

macro_rules! le_bytes {
    ($values:expr) => {
        $values.iter().flat_map(|value| value.to_le_bytes()).collect()
    };
}

macro_rules! from_le {
    ($raw:expr, $ty:ty) => {
        $raw.chunks_exact(std::mem::size_of::<$ty>())
            .map(|chunk| {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(chunk);
                <$ty>::from_le_bytes(buf)
            })
            .collect()
    };
}

/// 连续字节缓冲区（小端，bool 为 0/1 单字节）。
pub(crate) fn to_le_bytes(data: &ArrayData) -> Vec<u8> {
    match data {
        ArrayData::Bool(values) => values.iter().map(|value| u8::from(*value)).collect(),
        ArrayData::I8(values) => le_bytes!(values),
        ArrayData::I16(values) => le_bytes!(values),
        ArrayData::I32(values) => le_bytes!(values),
        ArrayData::I64(values) => le_bytes!(values),
        ArrayData::U8(values) => values.clone(),
        ArrayData::U16(values) => le_bytes!(values),
        ArrayData::U32(values) => le_bytes!(values),
        ArrayData::U64(values) => le_bytes!(values),
        ArrayData::F32(values) => le_bytes!(values),
        ArrayData::F64(values) => le_bytes!(values),
    }
}

pub(crate) fn from_le_bytes(
    dtype: DType,
    count: usize,
    raw: &[u8],
) -> Result<ArrayData, CodecError> {
    if count.checked_mul(dtype.item_size()) != Some(raw.len()) {
        return Err(CodecError::BufferLength {
            dtype,
            count,
            actual: raw.len(),
        });
    }
    let data = match dtype {
        DType::Bool => ArrayData::Bool(raw.iter().map(|byte| *byte != 0).collect()),
        DType::Int8 => ArrayData::I8(from_le!(raw, i8)),
        DType::Int16 => ArrayData::I16(from_le!(raw, i16)),
        DType::Int32 => ArrayData::I32(from_le!(raw, i32)),
        DType::Int64 => ArrayData::I64(from_le!(raw, i64)),
        DType::UInt8 => ArrayData::U8(raw.to_vec()),
        DType::UInt16 => ArrayData::U16(from_le!(raw, u16)),
        DType::UInt32 => ArrayData::U32(from_le!(raw, u32)),
        DType::UInt64 => ArrayData::U64(from_le!(raw, u64)),
        DType::Float32 => ArrayData::F32(from_le!(raw, f32)),
        DType::Float64 => ArrayData::F64(from_le!(raw, f64)),
    };
    Ok(data)
}

/// 扁平 JSON 元素列表；非有限浮点数写为 null。
pub(crate) fn to_values(data: &ArrayData) -> Vec<Value> {
    match data {
        ArrayData::Bool(values) => values.iter().map(|value| Value::Bool(*value)).collect(),
        ArrayData::I8(values) => values.iter().map(|value| Value::from(*value)).collect(),
        ArrayData::I16(values) => values.iter().map(|value| Value::from(*value)).collect(),
        ArrayData::I32(values) => values.iter().map(|value| Value::from(*value)).collect(),
        ArrayData::I64(values) => values.iter().map(|value| Value::from(*value)).collect(),
        ArrayData::U8(values) => values.iter().map(|value| Value::from(*value)).collect(),
        ArrayData::U16(values) => values.iter().map(|value| Value::from(*value)).collect(),
        ArrayData::U32(values) => values.iter().map(|value| Value::from(*value)).collect(),
        ArrayData::U64(values) => values.iter().map(|value| Value::from(*value)).collect(),
        ArrayData::F32(values) => values
            .iter()
            .map(|value| float_value(f64::from(*value)))
            .collect(),
        ArrayData::F64(values) => values.iter().map(|value| float_value(*value)).collect(),
    }
}

fn float_value(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

pub(crate) fn from_values(dtype: DType, values: &[Value]) -> Result<ArrayData, CodecError> {
    let data = match dtype {
        DType::Bool => ArrayData::Bool(collect(dtype, values, Value::as_bool)?),
        DType::Int8 => ArrayData::I8(collect(dtype, values, as_int)?),
        DType::Int16 => ArrayData::I16(collect(dtype, values, as_int)?),
        DType::Int32 => ArrayData::I32(collect(dtype, values, as_int)?),
        DType::Int64 => ArrayData::I64(collect(dtype, values, Value::as_i64)?),
        DType::UInt8 => ArrayData::U8(collect(dtype, values, as_uint)?),
        DType::UInt16 => ArrayData::U16(collect(dtype, values, as_uint)?),
        DType::UInt32 => ArrayData::U32(collect(dtype, values, as_uint)?),
        DType::UInt64 => ArrayData::U64(collect(dtype, values, Value::as_u64)?),
        // f64 -> f32 收窄：编码时由 f32 扩展而来，往返不丢精度。
        DType::Float32 => ArrayData::F32(collect(dtype, values, |value| {
            as_float(value).map(|value| value as f32)
        })?),
        DType::Float64 => ArrayData::F64(collect(dtype, values, as_float)?),
    };
    Ok(data)
}

fn collect<T>(
    dtype: DType,
    values: &[Value],
    convert: impl Fn(&Value) -> Option<T>,
) -> Result<Vec<T>, CodecError> {
    values
        .iter()
        .map(|value| {
            convert(value).ok_or_else(|| CodecError::InvalidElement {
                dtype,
                value: value.to_string(),
            })
        })
        .collect()
}

fn as_int<T: TryFrom<i64>>(value: &Value) -> Option<T> {
    value.as_i64().and_then(|value| T::try_from(value).ok())
}

fn as_uint<T: TryFrom<u64>>(value: &Value) -> Option<T> {
    value.as_u64().and_then(|value| T::try_from(value).ok())
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(f64::NAN),
        other => other.as_f64(),
    }
}
