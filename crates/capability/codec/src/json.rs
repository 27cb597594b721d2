//! 宿主 JSON 数组 → NdArray。

use crate::CodecError;
use domain::{ArrayData, NdArray, element_count};
use serde_json::Value;

/// 将嵌套 JSON 数组解析为 NdArray。
///
/// 要求各层长度一致（矩形），元素全为布尔或全为数值。
/// 全部为整数时 dtype 为 `int64`（超出 i64 的非负整数为 `uint64`），
/// 否则为 `float64`；空数组按 `float64` 处理。
pub fn array_from_json(value: &Value) -> Result<NdArray, CodecError> {
    if !value.is_array() {
        return Err(CodecError::UnsupportedType(type_name(value).to_string()));
    }

    let mut shape = Vec::new();
    let mut cursor = value;
    while let Value::Array(items) = cursor {
        shape.push(items.len());
        match items.first() {
            Some(first) => cursor = first,
            None => break,
        }
    }

    // 形状仅取自每层首元素，矩形校验在 collect_leaves 中完成。
    if element_count(&shape).is_none() {
        return Err(CodecError::UnsupportedType("array too large".to_string()));
    }
    let mut leaves = Vec::new();
    collect_leaves(value, &shape, 0, &mut leaves)?;
    let data = infer_data(&leaves)?;
    Ok(NdArray::new(shape, data)?)
}

fn collect_leaves<'a>(
    value: &'a Value,
    shape: &[usize],
    depth: usize,
    leaves: &mut Vec<&'a Value>,
) -> Result<(), CodecError> {
    if depth == shape.len() {
        if value.is_array() {
            return Err(CodecError::UnsupportedType("ragged array".to_string()));
        }
        leaves.push(value);
        return Ok(());
    }
    match value {
        Value::Array(items) if items.len() == shape[depth] => {
            for item in items {
                collect_leaves(item, shape, depth + 1, leaves)?;
            }
            Ok(())
        }
        _ => Err(CodecError::UnsupportedType("ragged array".to_string())),
    }
}

fn infer_data(leaves: &[&Value]) -> Result<ArrayData, CodecError> {
    if leaves.is_empty() {
        return Ok(ArrayData::F64(Vec::new()));
    }
    if leaves.iter().all(|leaf| leaf.is_boolean()) {
        return Ok(ArrayData::Bool(
            leaves.iter().filter_map(|leaf| leaf.as_bool()).collect(),
        ));
    }
    if let Some(leaf) = leaves.iter().find(|leaf| !leaf.is_number()) {
        return Err(CodecError::UnsupportedType(format!(
            "array of {}",
            type_name(leaf)
        )));
    }
    if leaves.iter().all(|leaf| leaf.is_i64()) {
        return Ok(ArrayData::I64(
            leaves.iter().filter_map(|leaf| leaf.as_i64()).collect(),
        ));
    }
    if leaves.iter().all(|leaf| leaf.is_u64()) {
        return Ok(ArrayData::U64(
            leaves.iter().filter_map(|leaf| leaf.as_u64()).collect(),
        ));
    }
    Ok(ArrayData::F64(
        leaves.iter().filter_map(|leaf| leaf.as_f64()).collect(),
    ))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
