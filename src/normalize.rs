//! Field name normalization
//!
//! The web service mixes `camelCase`, `PascalCase` and bare acronyms
//! (`ID`, `URL`, `CTR`) in its field names. Every key is rewritten to
//! `snake_case` before a record leaves the connector. Values are left alone
//! apart from recursing into nested objects and arrays.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use regex::Regex;
use std::sync::LazyLock;
use tracing::error;

/// An acronym run followed by a capitalized word: `HTMLParser` -> `HTML_Parser`
static ACRONYM_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").unwrap());

/// A lowercase letter or digit followed by an uppercase letter: `campaignID` -> `campaign_ID`
static WORD_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());

/// Convert a single key to snake_case
///
/// Keys without uppercase letters are returned unchanged, which makes the
/// conversion idempotent.
pub fn decamelize(key: &str) -> String {
    if !key.chars().any(|c| c.is_ascii_uppercase()) {
        return key.to_string();
    }

    let split = ACRONYM_BOUNDARY.replace_all(key, "${1}_${2}");
    let split = WORD_BOUNDARY.replace_all(&split, "${1}_${2}");
    split.to_lowercase()
}

/// Recursively normalize every object key inside a value
pub fn normalize_value(value: JsonValue) -> Result<JsonValue> {
    match value {
        JsonValue::Object(obj) => normalize_object(obj).map(JsonValue::Object),
        JsonValue::Array(items) => items
            .into_iter()
            .map(normalize_value)
            .collect::<Result<Vec<_>>>()
            .map(JsonValue::Array),
        other => Ok(other),
    }
}

fn normalize_object(obj: JsonObject) -> Result<JsonObject> {
    let mut out = JsonObject::with_capacity(obj.len());
    for (key, value) in obj {
        let normalized = decamelize(&key);
        if out.contains_key(&normalized) {
            return Err(Error::Other(format!(
                "field '{key}' collides with an existing '{normalized}'"
            )));
        }
        out.insert(normalized, normalize_value(value)?);
    }
    Ok(out)
}

/// Normalize a top-level record for `stream`
///
/// A record must be a JSON object. Anything else, or a key collision after
/// renaming, is a fatal transform error. The offending record is logged first.
pub fn normalize_record(stream: &str, record: JsonValue) -> Result<JsonObject> {
    let JsonValue::Object(obj) = record else {
        error!("Stream: {stream}, unexpected record shape: {record}");
        return Err(Error::transform(
            stream,
            format!("expected an object record, got {}", kind_of(&record)),
        ));
    };

    let snapshot = tracing::enabled!(tracing::Level::ERROR).then(|| obj.clone());
    normalize_object(obj).map_err(|e| {
        if let Some(original) = snapshot {
            error!("Stream: {stream}, error record: {}", JsonValue::Object(original));
        }
        Error::transform(stream, e.to_string())
    })
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("ID", "id")]
    #[test_case("URL", "url")]
    #[test_case("CTR", "ctr")]
    #[test_case("campaignID", "campaign_id")]
    #[test_case("overallImpressionCount", "overall_impression_count")]
    #[test_case("subCategories", "sub_categories")]
    #[test_case("HTMLParser", "html_parser")]
    #[test_case("trackingURL", "tracking_url")]
    #[test_case("Name", "name")]
    #[test_case("leadCount2", "lead_count2")]
    #[test_case("click2Count", "click2_count")]
    #[test_case("campaign_id", "campaign_id")]
    #[test_case("date", "date")]
    fn test_decamelize(input: &str, expected: &str) {
        assert_eq!(decamelize(input), expected);
    }

    #[test]
    fn test_normalize_nested() {
        let record = json!({
            "ID": 7,
            "name": "Spring Sale",
            "URL": "https://shop.example",
            "info": {
                "campaignStatus": "accepted",
                "subCategories": [{"ID": 1, "categoryName": "Fashion"}],
                "tags": ["keepCamelValues"]
            }
        });

        let normalized = normalize_record("campaigns", record).unwrap();
        assert_eq!(
            JsonValue::Object(normalized),
            json!({
                "id": 7,
                "name": "Spring Sale",
                "url": "https://shop.example",
                "info": {
                    "campaign_status": "accepted",
                    "sub_categories": [{"id": 1, "category_name": "Fashion"}],
                    "tags": ["keepCamelValues"]
                }
            })
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let record = json!({
            "campaignID": 42,
            "reportData": {"uniqueClickCount": 3, "CTR": 1.5},
            "rows": [{"saleCount": 1}]
        });

        let once = normalize_record("campaign_report", record).unwrap();
        let twice = normalize_record("campaign_report", JsonValue::Object(once.clone())).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_non_object_record_fails() {
        let err = normalize_record("campaigns", json!(["not", "a", "record"])).unwrap_err();
        assert!(matches!(err, Error::Transform { ref stream, .. } if stream == "campaigns"));
        assert!(err.to_string().contains("got array"));
    }

    #[test]
    fn test_key_collision_fails() {
        let err = normalize_record(
            "campaigns",
            json!({"campaignID": 1, "campaign_id": 2}),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Transform { .. }));
        assert!(err.to_string().contains("collides"));
    }
}
