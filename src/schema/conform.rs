//! Record conformance
//!
//! Brings a normalized record in line with its stream schema. Each declared
//! value is coerced to the first declared type it fits, trying types the value
//! already has before lossless conversions. Anything that fits none of them is
//! a transform error.

use super::types::{JsonSchema, JsonType, SchemaProperty};
use crate::error::{Error, Result};
use crate::types::{format_datetime, parse_datetime, scalar_to_string, JsonObject, JsonValue};
use std::collections::BTreeMap;
use tracing::error;

/// Conform a record to the schema of `stream`
///
/// The offending record is logged before an error is returned.
pub fn conform_record(stream: &str, record: JsonObject, schema: &JsonSchema) -> Result<JsonObject> {
    let snapshot = tracing::enabled!(tracing::Level::ERROR).then(|| record.clone());

    conform_object(record, &schema.properties, schema.additional_properties, "")
        .map_err(|message| {
            if let Some(original) = snapshot {
                error!("Stream: {stream}, error record: {}", JsonValue::Object(original));
            }
            Error::transform(stream, message)
        })
}

type ConformResult<T> = std::result::Result<T, String>;

fn conform_object(
    obj: JsonObject,
    properties: &BTreeMap<String, SchemaProperty>,
    allow_additional: bool,
    path: &str,
) -> ConformResult<JsonObject> {
    let mut out = JsonObject::with_capacity(obj.len());
    for (key, value) in obj {
        let field_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };

        match properties.get(&key) {
            Some(property) => {
                out.insert(key, conform_value(value, property, &field_path)?);
            }
            None if allow_additional => {
                out.insert(key, value);
            }
            None => {}
        }
    }
    Ok(out)
}

fn conform_value(value: JsonValue, property: &SchemaProperty, path: &str) -> ConformResult<JsonValue> {
    if value.is_null() {
        return if property.is_nullable() {
            Ok(JsonValue::Null)
        } else {
            Err(format!("'{path}' is null but declared {}", property.json_type))
        };
    }

    let types = property.json_type.value_types();

    // Empty text stands in for a missing value on non-string fields
    if matches!(&value, JsonValue::String(s) if s.is_empty())
        && property.is_nullable()
        && !types.contains(&JsonType::String)
    {
        return Ok(JsonValue::Null);
    }

    let (exact, others): (Vec<JsonType>, Vec<JsonType>) =
        types.into_iter().partition(|t| t.matches(&value));

    for json_type in exact.into_iter().chain(others) {
        if let Some(coerced) = coerce(&value, json_type, property, path)? {
            return Ok(coerced);
        }
    }

    Err(format!(
        "'{path}' value {value} does not fit declared type {}",
        property.json_type
    ))
}

/// Convert a value to one type, or `None` if it does not fit
fn coerce(
    value: &JsonValue,
    json_type: JsonType,
    property: &SchemaProperty,
    path: &str,
) -> ConformResult<Option<JsonValue>> {
    let coerced = match json_type {
        JsonType::Integer => to_integer(value),
        JsonType::Number => to_number(value),
        JsonType::Boolean => to_boolean(value),
        JsonType::String => match scalar_to_string(value) {
            Some(s) if property.format.as_deref() == Some("date-time") => {
                let dt = parse_datetime(&s).map_err(|e| format!("'{path}': {e}"))?;
                Some(JsonValue::String(format_datetime(dt)))
            }
            other => other.map(JsonValue::String),
        },
        JsonType::Object => match value {
            JsonValue::Object(obj) => {
                let empty = BTreeMap::new();
                let properties = property.properties.as_ref().unwrap_or(&empty);
                let conformed =
                    conform_object(obj.clone(), properties, property.allows_additional(), path)?;
                Some(JsonValue::Object(conformed))
            }
            _ => None,
        },
        JsonType::Array => match (value, property.items.as_deref()) {
            (JsonValue::Array(items), Some(item_schema)) => {
                let conformed = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| conform_value(item.clone(), item_schema, &format!("{path}[{i}]")))
                    .collect::<ConformResult<Vec<_>>>()?;
                Some(JsonValue::Array(conformed))
            }
            (JsonValue::Array(_), None) => Some(value.clone()),
            _ => None,
        },
        JsonType::Null => None,
    };
    Ok(coerced)
}

fn to_integer(value: &JsonValue) -> Option<JsonValue> {
    match value {
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
        JsonValue::Number(n) => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
            .map(|f| JsonValue::from(f as i64)),
        JsonValue::String(s) => s.trim().parse::<i64>().ok().map(JsonValue::from),
        _ => None,
    }
}

fn to_number(value: &JsonValue) -> Option<JsonValue> {
    match value {
        JsonValue::Number(_) => Some(value.clone()),
        JsonValue::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(JsonValue::Number),
        _ => None,
    }
}

fn to_boolean(value: &JsonValue) -> Option<JsonValue> {
    match value {
        JsonValue::Bool(_) => Some(value.clone()),
        JsonValue::String(s) => match s.trim() {
            "true" => Some(JsonValue::Bool(true)),
            "false" => Some(JsonValue::Bool(false)),
            _ => None,
        },
        JsonValue::Number(n) => match n.as_i64() {
            Some(0) => Some(JsonValue::Bool(false)),
            Some(1) => Some(JsonValue::Bool(true)),
            _ => None,
        },
        _ => None,
    }
}
