//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs.

use crate::error::{Error, Result};
use crate::types::{parse_datetime, JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Bookmark key for a field, scoped to a parent when given
///
/// `bookmark_key("date", Some("42"))` is `date(parent:42)`.
pub fn bookmark_key(field: &str, parent_id: Option<&str>) -> String {
    match parent_id {
        Some(id) => format!("{field}(parent:{id})"),
        None => field.to_string(),
    }
}

/// Complete state for a connector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Bookmark values per stream, keyed by bookmark key
    #[serde(default)]
    pub bookmarks: BTreeMap<String, BTreeMap<String, String>>,

    /// Top-level stream in progress, if a run was interrupted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currently_syncing: Option<String>,

    /// Unrecognized top-level keys, kept as they were
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a bookmark value
    pub fn get_bookmark(&self, stream: &str, field: &str, parent_id: Option<&str>) -> Option<&str> {
        self.bookmarks
            .get(stream)?
            .get(&bookmark_key(field, parent_id))
            .map(String::as_str)
    }

    /// Advance a bookmark
    ///
    /// The value replaces the stored one only when it is strictly later.
    /// Returns whether the state changed.
    pub fn write_bookmark(
        &mut self,
        stream: &str,
        field: &str,
        parent_id: Option<&str>,
        value: &str,
    ) -> Result<bool> {
        let new = parse_datetime(value).map_err(|e| {
            Error::state(format!("Bookmark for stream '{stream}' is not a date: {e}"))
        })?;

        let key = bookmark_key(field, parent_id);
        let entries = self.bookmarks.entry(stream.to_string()).or_default();

        if let Some(existing) = entries.get(&key) {
            match parse_datetime(existing) {
                Ok(old) if new <= old => return Ok(false),
                Ok(_) => {}
                Err(_) => warn!("Stream: {stream}, replacing unreadable bookmark '{existing}'"),
            }
        }

        info!(
            "Write state for Stream: {stream}, Parent ID: {}, value: {value}",
            parent_id.unwrap_or("-")
        );
        entries.insert(key, value.to_string());
        Ok(true)
    }

    /// Set or clear the currently syncing marker
    pub fn set_currently_syncing(&mut self, stream: Option<&str>) {
        self.currently_syncing = stream.map(str::to_string);
    }

    /// State as a JSON value
    pub fn to_value(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_default()
    }
}
