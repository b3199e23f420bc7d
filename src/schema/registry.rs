//! Stream schemas embedded in the binary

use super::types::JsonSchema;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Built-in stream schema documents, keyed by stream name
pub static BUILTIN_SCHEMAS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        let mut m = HashMap::new();

        m.insert(
            "campaigns",
            include_str!("../../definitions/schemas/campaigns.json"),
        );
        m.insert(
            "campaign_report",
            include_str!("../../definitions/schemas/campaign_report.json"),
        );
        m.insert(
            "affiliate_sites",
            include_str!("../../definitions/schemas/affiliate_sites.json"),
        );

        m
    });

/// Get the raw schema document for a stream
pub fn get_builtin(stream: &str) -> Option<&'static str> {
    BUILTIN_SCHEMAS.get(stream).copied()
}

/// Parse the built-in schema for a stream
pub fn load_schema(stream: &str) -> Result<JsonSchema> {
    let raw = get_builtin(stream).ok_or_else(|| Error::StreamNotFound {
        stream: stream.to_string(),
    })?;
    Ok(serde_json::from_str(raw)?)
}
