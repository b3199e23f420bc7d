//! Schema types
//!
//! The subset of JSON Schema the stream documents use: a type or a list of
//! types, an optional format, nested object properties and array items.
//! Keywords outside that subset are ignored on load.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// JSON Schema type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl JsonType {
    /// Keyword used in schema documents
    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Number => "number",
            JsonType::Integer => "integer",
            JsonType::Boolean => "boolean",
            JsonType::Object => "object",
            JsonType::Array => "array",
            JsonType::Null => "null",
        }
    }

    /// Whether a value already has this type, without coercion
    pub fn matches(self, value: &Value) -> bool {
        match self {
            JsonType::String => value.is_string(),
            JsonType::Number => value.is_number(),
            JsonType::Integer => value.is_i64() || value.is_u64(),
            JsonType::Boolean => value.is_boolean(),
            JsonType::Object => value.is_object(),
            JsonType::Array => value.is_array(),
            JsonType::Null => value.is_null(),
        }
    }
}

impl std::fmt::Display for JsonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `type` keyword: one type, or a list where `null` marks the field nullable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonTypeOrArray {
    Single(JsonType),
    Multiple(Vec<JsonType>),
}

impl JsonTypeOrArray {
    /// `[null, t]`
    pub fn nullable(t: JsonType) -> Self {
        match t {
            JsonType::Null => JsonTypeOrArray::Single(JsonType::Null),
            other => JsonTypeOrArray::Multiple(vec![JsonType::Null, other]),
        }
    }

    fn all(&self) -> &[JsonType] {
        match self {
            JsonTypeOrArray::Single(t) => std::slice::from_ref(t),
            JsonTypeOrArray::Multiple(types) => types,
        }
    }

    /// Whether `null` is one of the declared types
    pub fn is_nullable(&self) -> bool {
        self.all().contains(&JsonType::Null)
    }

    /// Declared non-null types, in declaration order
    pub fn value_types(&self) -> Vec<JsonType> {
        self.all()
            .iter()
            .copied()
            .filter(|t| *t != JsonType::Null)
            .collect()
    }
}

impl std::fmt::Display for JsonTypeOrArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonTypeOrArray::Single(t) => write!(f, "{t}"),
            JsonTypeOrArray::Multiple(types) => {
                let names: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
                write!(f, "[{}]", names.join(", "))
            }
        }
    }
}

/// A declared field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaProperty {
    #[serde(rename = "type")]
    pub json_type: JsonTypeOrArray,

    /// `date` or `date-time` for temporal strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Fields of a nested object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SchemaProperty>>,

    /// Whether a nested object keeps undeclared fields; kept when unset
    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<bool>,

    /// Element schema of an array
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaProperty>>,
}

impl SchemaProperty {
    fn of(json_type: JsonTypeOrArray) -> Self {
        Self {
            json_type,
            format: None,
            properties: None,
            additional_properties: None,
            items: None,
        }
    }

    /// Required field of one type
    pub fn new(json_type: JsonType) -> Self {
        Self::of(JsonTypeOrArray::Single(json_type))
    }

    /// Field that may be null
    pub fn nullable(json_type: JsonType) -> Self {
        Self::of(JsonTypeOrArray::nullable(json_type))
    }

    /// Nullable nested object
    pub fn object(properties: BTreeMap<String, SchemaProperty>, additional: bool) -> Self {
        Self {
            properties: Some(properties),
            additional_properties: Some(additional),
            ..Self::nullable(JsonType::Object)
        }
    }

    /// Nullable array of `items`
    pub fn array(items: SchemaProperty) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::nullable(JsonType::Array)
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn is_nullable(&self) -> bool {
        self.json_type.is_nullable()
    }

    /// Whether undeclared nested fields are kept
    pub fn allows_additional(&self) -> bool {
        self.additional_properties.unwrap_or(true)
    }
}

/// Top-level schema of a stream's records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema {
    /// Always `object` for stream schemas
    #[serde(rename = "type")]
    pub json_type: JsonType,

    #[serde(default)]
    pub properties: BTreeMap<String, SchemaProperty>,

    /// Whether records keep undeclared fields
    #[serde(rename = "additionalProperties", default = "keep_additional")]
    pub additional_properties: bool,
}

fn keep_additional() -> bool {
    true
}

impl Default for JsonSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonSchema {
    /// Empty object schema that keeps every field
    pub fn new() -> Self {
        Self {
            json_type: JsonType::Object,
            properties: BTreeMap::new(),
            additional_properties: true,
        }
    }

    pub fn add_property(&mut self, name: &str, property: SchemaProperty) {
        self.properties.insert(name.to_string(), property);
    }

    pub fn get_property(&self, name: &str) -> Option<&SchemaProperty> {
        self.properties.get(name)
    }

    /// Declared top-level field names
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Schema document as sent in SCHEMA messages
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
