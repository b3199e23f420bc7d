//! Singer catalog discovery and stream selection

use super::streams::{Stream, StreamCatalog};
use crate::error::{Error, Result};
use crate::schema::load_schema;
use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Metadata attached to a breadcrumb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Empty for the stream itself, `["properties", field]` for a field
    pub breadcrumb: Vec<String>,
    /// Metadata values
    pub metadata: JsonObject,
}

/// One stream in a Singer catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Stream identifier
    pub tap_stream_id: String,
    /// Stream name
    pub stream: String,
    /// Primary key fields
    #[serde(default)]
    pub key_properties: Vec<String>,
    /// JSON schema of the records
    #[serde(default)]
    pub schema: JsonValue,
    /// Breadcrumb metadata
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

impl CatalogEntry {
    /// Metadata of the stream-level breadcrumb
    pub fn root_metadata(&self) -> Option<&JsonObject> {
        self.metadata
            .iter()
            .find(|m| m.breadcrumb.is_empty())
            .map(|m| &m.metadata)
    }

    /// Whether the stream is selected
    pub fn is_selected(&self) -> bool {
        self.root_metadata()
            .and_then(|m| m.get("selected"))
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }

    /// Fields left out of emitted records
    ///
    /// A property is excluded when its inclusion is `unsupported` or it is
    /// explicitly `selected: false`. `automatic` properties are always kept.
    pub fn excluded_fields(&self) -> Vec<&str> {
        self.metadata
            .iter()
            .filter_map(|m| match m.breadcrumb.as_slice() {
                [kind, field] if kind == "properties" => Some((field.as_str(), &m.metadata)),
                _ => None,
            })
            .filter(|(_, metadata)| {
                let inclusion = metadata.get("inclusion").and_then(JsonValue::as_str);
                let selected = metadata.get("selected").and_then(JsonValue::as_bool);
                match inclusion {
                    Some("automatic") => false,
                    Some("unsupported") => true,
                    _ => selected == Some(false),
                }
            })
            .map(|(field, _)| field)
            .collect()
    }
}

/// Singer catalog document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Catalog entries
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    /// Parse a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::catalog(format!("Invalid catalog: {e}")))
    }

    /// Load a catalog from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Names of the selected streams
    pub fn selected_streams(&self) -> Vec<&str> {
        self.streams
            .iter()
            .filter(|e| e.is_selected())
            .map(|e| e.stream.as_str())
            .collect()
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// Build the catalog describing every stream
pub fn discover(catalog: &StreamCatalog) -> Result<Catalog> {
    let streams = catalog
        .streams()
        .iter()
        .map(catalog_entry)
        .collect::<Result<Vec<_>>>()?;
    Ok(Catalog { streams })
}

fn catalog_entry(stream: &Stream) -> Result<CatalogEntry> {
    let schema = load_schema(&stream.name)?;

    let mut root = JsonObject::new();
    root.insert(
        "table-key-properties".to_string(),
        json!(stream.key_properties),
    );
    root.insert(
        "forced-replication-method".to_string(),
        json!(stream.replication_method.as_str()),
    );
    if let Some(key) = &stream.replication_key {
        root.insert("valid-replication-keys".to_string(), json!([key]));
    }
    root.insert("inclusion".to_string(), json!("available"));
    if let Some(parent) = &stream.parent_stream {
        root.insert("parent-tap-stream-id".to_string(), json!(parent));
    }

    let mut metadata = vec![MetadataEntry {
        breadcrumb: Vec::new(),
        metadata: root,
    }];

    for field in schema.property_names() {
        let automatic = stream.key_properties.iter().any(|k| k == field)
            || stream.replication_key.as_deref() == Some(field);
        let mut entry = JsonObject::new();
        entry.insert(
            "inclusion".to_string(),
            json!(if automatic { "automatic" } else { "available" }),
        );
        metadata.push(MetadataEntry {
            breadcrumb: vec!["properties".to_string(), field.to_string()],
            metadata: entry,
        });
    }

    Ok(CatalogEntry {
        tap_stream_id: stream.name.clone(),
        stream: stream.name.clone(),
        key_properties: stream.key_properties.clone(),
        schema: schema.to_json(),
        metadata,
    })
}

// ============================================================================
// Selection
// ============================================================================

/// Resolve which streams the user asked for
///
/// An input catalog selects through its `selected` metadata; a name filter
/// narrows that further. With neither, every stream is selected. Unknown
/// names are an error. The result follows catalog order.
pub fn select_streams(
    catalog: &StreamCatalog,
    input: Option<&Catalog>,
    filter: Option<&[String]>,
) -> Result<Vec<String>> {
    let from_catalog: Option<HashSet<&str>> = match input {
        Some(input) => {
            let selected: HashSet<&str> = input.selected_streams().into_iter().collect();
            for name in &selected {
                catalog.require(name)?;
            }
            Some(selected)
        }
        None => None,
    };

    let from_filter: Option<HashSet<&str>> = match filter {
        Some(names) => {
            for name in names {
                catalog.require(name)?;
            }
            Some(names.iter().map(String::as_str).collect())
        }
        None => None,
    };

    let selected: Vec<String> = catalog
        .streams()
        .iter()
        .map(|s| s.name.as_str())
        .filter(|name| from_catalog.as_ref().map_or(true, |set| set.contains(name)))
        .filter(|name| from_filter.as_ref().map_or(true, |set| set.contains(name)))
        .map(str::to_string)
        .collect();

    info!("Selected streams: {selected:?}");
    Ok(selected)
}
