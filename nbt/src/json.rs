//! JSON text form of NBT trees.
//!
//! JSON cannot say which width a number has or what a list holds, so two conventions apply:
//!
//! - Byte arrays are written as `{"byteArray": [0, 1, 3]}`. An object whose only key is
//!   `byteArray` and whose value is an array reads back as a byte array, any other object is a compound.
//! - Int arrays are written as plain `[0, 1, 3]`. Any array starting with an integer reads back
//!   as an int array, so a list of ints comes back as an int array.
//!
//! Empty lists have no element type and are left out entirely; `[]`, `null` and booleans read
//! as "no value" and are dropped from their parent.
//!
//! Reading falls back to the legacy [Mojangson](crate::mojangson) notation when the text is not JSON.

use serde_json::{Map, Number, Value};

use crate::{mojangson, NbtCompound, NbtError, NbtList, NbtTag, Result};

/// Key of the single-entry object that wraps byte arrays.
pub const BYTE_ARRAY_KEY: &str = "byteArray";

/// Converts a tag to JSON. Returns `None` for tags that are left out, see [`NbtTag::is_omitted`].
///
/// NaN and infinite numbers have no JSON form and fail with [`NbtError::NonFiniteNumber`].
pub fn to_value(tag: &NbtTag) -> Result<Option<Value>> {
    Ok(Some(match tag {
        NbtTag::Byte(v) => Value::from(*v),
        NbtTag::Short(v) => Value::from(*v),
        NbtTag::Int(v) => Value::from(*v),
        NbtTag::Long(v) => Value::from(*v),
        NbtTag::Float(v) => finite(f64::from(*v))?,
        NbtTag::Double(v) => finite(*v)?,
        NbtTag::ByteArray(v) => {
            let mut map = Map::with_capacity(1);
            map.insert(BYTE_ARRAY_KEY.to_owned(), Value::from(v.clone()));
            Value::Object(map)
        }
        NbtTag::String(v) => Value::from(v.as_str()),
        NbtTag::List(list) => {
            let items = list
                .iter()
                .filter_map(|tag| to_value(tag).transpose())
                .collect::<Result<Vec<Value>>>()?;
            if items.is_empty() {
                return Ok(None);
            }
            Value::Array(items)
        }
        NbtTag::Compound(compound) => compound_to_value(compound)?,
        NbtTag::IntArray(v) => Value::from(v.clone()),
    }))
}

pub fn compound_to_value(compound: &NbtCompound) -> Result<Value> {
    let mut map = Map::new();
    for (key, value) in compound {
        if let Some(value) = to_value(value)? {
            map.insert(key.clone(), value);
        }
    }
    Ok(Value::Object(map))
}

/// Writes `root` as compact JSON.
pub fn to_string(root: &NbtCompound) -> Result<String> {
    Ok(compound_to_value(root)?.to_string())
}

/// Writes `root` as indented JSON.
pub fn to_string_pretty(root: &NbtCompound) -> Result<String> {
    Ok(format!("{:#}", compound_to_value(root)?))
}

fn finite(value: f64) -> Result<Value> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or(NbtError::NonFiniteNumber { value })
}

/// Converts parsed JSON back to a tag. `Ok(None)` means "no value".
pub fn from_value(value: Value) -> Result<Option<NbtTag>> {
    Ok(match value {
        Value::Null | Value::Bool(_) => None,
        Value::Number(number) => Some(number_to_tag(&number)),
        Value::String(string) => Some(NbtTag::String(string)),
        Value::Array(items) => array_to_tag(items)?,
        Value::Object(map) => Some(object_to_tag(map)?),
    })
}

/// Reads a compound from JSON text, or from Mojangson text if it is not JSON.
pub fn from_str(text: &str) -> Result<NbtCompound> {
    let value = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(json) => {
            return mojangson::parse(text).map_err(|mojangson| NbtError::Text { json, mojangson })
        }
    };

    match from_value(value)? {
        Some(NbtTag::Compound(compound)) => Ok(compound),
        Some(tag) => Err(NbtError::Type {
            expected: "a compound root",
            found: tag_kind(&tag),
        }),
        None => Err(NbtError::Type {
            expected: "a compound root",
            found: "no value",
        }),
    }
}

fn number_to_tag(number: &Number) -> NbtTag {
    if let Some(v) = number.as_i64() {
        match i32::try_from(v) {
            Ok(v) => NbtTag::Int(v),
            Err(_) => NbtTag::Long(v),
        }
    } else {
        // Fractional, or an integer beyond the range of a long.
        NbtTag::Double(number.as_f64().unwrap_or(f64::NAN))
    }
}

fn is_integral(value: &Value) -> bool {
    matches!(value, Value::Number(number) if number.is_i64() || number.is_u64())
}

/// Truncates a JSON number the way a narrowing cast would.
fn wrapping_i64(value: &Value, expected: &'static str) -> Result<i64> {
    match value {
        Value::Number(number) => Ok(number
            .as_i64()
            .or_else(|| number.as_u64().map(|v| v as i64))
            .or_else(|| number.as_f64().map(|v| v as i64))
            .unwrap_or_default()),
        other => Err(NbtError::Type {
            expected,
            found: value_kind(other),
        }),
    }
}

fn array_to_tag(items: Vec<Value>) -> Result<Option<NbtTag>> {
    let Some(first) = items.first() else {
        return Ok(None);
    };

    if is_integral(first) {
        let ints = items
            .iter()
            .map(|item| wrapping_i64(item, "a number in an int array").map(|v| v as i32))
            .collect::<Result<Vec<i32>>>()?;
        return Ok(Some(NbtTag::IntArray(ints)));
    }

    let mut list = NbtList::new();
    for item in items {
        if let Some(tag) = from_value(item)? {
            list.push(tag)?;
        }
    }
    Ok((!list.is_empty()).then_some(NbtTag::List(list)))
}

fn object_to_tag(map: Map<String, Value>) -> Result<NbtTag> {
    if map.len() == 1 {
        if let Some(Value::Array(bytes)) = map.get(BYTE_ARRAY_KEY) {
            let bytes = bytes
                .iter()
                .map(|item| wrapping_i64(item, "a number in a byte array").map(|v| v as i8))
                .collect::<Result<Vec<i8>>>()?;
            return Ok(NbtTag::ByteArray(bytes));
        }
    }

    let mut compound = NbtCompound::new();
    for (key, value) in map {
        if let Some(tag) = from_value(value)? {
            compound.insert(key, tag);
        }
    }
    Ok(NbtTag::Compound(compound))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn tag_kind(tag: &NbtTag) -> &'static str {
    match tag {
        NbtTag::Byte(_) | NbtTag::Short(_) | NbtTag::Int(_) | NbtTag::Long(_) => "an integer",
        NbtTag::Float(_) | NbtTag::Double(_) => "a decimal number",
        NbtTag::String(_) => "a string",
        NbtTag::ByteArray(_) => "a byte array",
        NbtTag::IntArray(_) => "an int array",
        NbtTag::List(_) => "a list",
        NbtTag::Compound(_) => "a compound",
    }
}
