//! Stream definitions and the flattened stream catalog

use crate::error::{Error, Result};
use crate::types::ReplicationMethod;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Stream tree shipped with the binary
pub const BUILTIN_STREAMS: &str = include_str!("../../definitions/streams.yaml");

// ============================================================================
// Definitions
// ============================================================================

/// Remote call backing a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// `getCampaigns`
    Campaigns,
    /// `getReportCampaign`, one call per campaign and window
    CampaignReport,
    /// `getAffiliateSites`, one call per campaign
    AffiliateSites,
}

impl Endpoint {
    /// Whether every call needs a parent campaign ID
    pub fn requires_parent(self) -> bool {
        matches!(self, Endpoint::CampaignReport | Endpoint::AffiliateSites)
    }

    /// Whether calls take a date range
    pub fn takes_date_range(self) -> bool {
        matches!(self, Endpoint::CampaignReport)
    }
}

/// A stream as declared in the stream tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDefinition {
    /// Stream name
    pub name: String,

    /// Remote call backing the stream
    pub endpoint: Endpoint,

    /// Primary key fields
    #[serde(default)]
    pub key_properties: Vec<String>,

    /// Replication method
    #[serde(default)]
    pub replication_method: ReplicationMethod,

    /// Bookmark field for incremental streams
    #[serde(default)]
    pub replication_key: Option<String>,

    /// Days per report window
    #[serde(default)]
    pub date_window_size: Option<i64>,

    /// Field that receives the parent ID on child records
    #[serde(default)]
    pub parent_field: Option<String>,

    /// Field of this stream's records passed to children as their parent ID
    #[serde(default)]
    pub parent_key: Option<String>,

    /// Child streams fetched once per record of this stream
    #[serde(default)]
    pub children: Vec<StreamDefinition>,
}

impl StreamDefinition {
    /// Parent key handed to children: explicit, else the first key property
    pub fn resolved_parent_key(&self) -> Option<&str> {
        self.parent_key
            .as_deref()
            .or_else(|| self.key_properties.first().map(String::as_str))
    }
}

#[derive(Debug, Deserialize)]
struct StreamTree {
    streams: Vec<StreamDefinition>,
}

// ============================================================================
// Flattened Streams
// ============================================================================

/// A stream with its position in the tree made explicit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stream {
    /// Stream name
    pub name: String,
    /// Remote call backing the stream
    pub endpoint: Endpoint,
    /// Primary key fields
    pub key_properties: Vec<String>,
    /// Replication method
    pub replication_method: ReplicationMethod,
    /// Bookmark field
    pub replication_key: Option<String>,
    /// Days per report window
    pub date_window_size: Option<i64>,
    /// Field that receives the parent ID
    pub parent_field: Option<String>,
    /// Field handed to children as their parent ID, set when the stream has children
    pub parent_key: Option<String>,
    /// Name of the parent stream, for children
    pub parent_stream: Option<String>,
    /// Names of child streams
    pub children: Vec<String>,
}

impl Stream {
    /// Whether the stream tracks a bookmark
    pub fn is_incremental(&self) -> bool {
        self.replication_method == ReplicationMethod::Incremental
    }

    /// Whether the stream is a child of another stream
    pub fn is_child(&self) -> bool {
        self.parent_stream.is_some()
    }

    /// Bookmark fields announced in SCHEMA messages
    pub fn bookmark_properties(&self) -> Vec<String> {
        self.replication_key.iter().cloned().collect()
    }
}

/// Flatten a stream tree, parents first, each child naming its parent
pub fn flatten_streams(definitions: &[StreamDefinition]) -> Vec<Stream> {
    let mut out = Vec::new();
    for definition in definitions {
        flatten_into(definition, None, &mut out);
    }
    out
}

fn flatten_into(definition: &StreamDefinition, parent: Option<&str>, out: &mut Vec<Stream>) {
    let has_children = !definition.children.is_empty();
    out.push(Stream {
        name: definition.name.clone(),
        endpoint: definition.endpoint,
        key_properties: definition.key_properties.clone(),
        replication_method: definition.replication_method,
        replication_key: definition.replication_key.clone(),
        date_window_size: definition.date_window_size,
        parent_field: definition.parent_field.clone(),
        parent_key: has_children
            .then(|| definition.resolved_parent_key().map(str::to_string))
            .flatten(),
        parent_stream: parent.map(str::to_string),
        children: definition.children.iter().map(|c| c.name.clone()).collect(),
    });

    for child in &definition.children {
        flatten_into(child, Some(&definition.name), out);
    }
}

/// Check a stream tree for structural errors
pub fn validate(definitions: &[StreamDefinition]) -> Result<()> {
    let mut names = HashSet::new();

    for definition in definitions {
        validate_one(definition, false, &mut names)?;
        for child in &definition.children {
            if !child.children.is_empty() {
                return Err(Error::catalog(format!(
                    "Stream '{}' is a child and cannot declare children",
                    child.name
                )));
            }
            validate_one(child, true, &mut names)?;
        }
    }
    Ok(())
}

fn validate_one(
    definition: &StreamDefinition,
    is_child: bool,
    names: &mut HashSet<String>,
) -> Result<()> {
    let name = &definition.name;

    if !names.insert(name.clone()) {
        return Err(Error::catalog(format!("Duplicate stream name '{name}'")));
    }
    if definition.replication_method == ReplicationMethod::Incremental
        && definition.replication_key.is_none()
    {
        return Err(Error::catalog(format!(
            "Incremental stream '{name}' has no replication_key"
        )));
    }
    if let Some(size) = definition.date_window_size {
        if size < 1 {
            return Err(Error::catalog(format!(
                "Stream '{name}' has date_window_size {size}, must be at least 1"
            )));
        }
    }
    if definition.endpoint.takes_date_range()
        && definition.replication_method != ReplicationMethod::Incremental
    {
        return Err(Error::catalog(format!(
            "Stream '{name}' reads a date range and must be INCREMENTAL"
        )));
    }
    if !definition.children.is_empty() && definition.resolved_parent_key().is_none() {
        return Err(Error::catalog(format!(
            "Stream '{name}' has children but no parent_key or key_properties"
        )));
    }
    if definition.endpoint.requires_parent() != is_child {
        return Err(Error::catalog(format!(
            "Stream '{name}' uses endpoint {:?}, which {} a parent stream",
            definition.endpoint,
            if is_child { "does not take" } else { "requires" }
        )));
    }
    Ok(())
}

// ============================================================================
// Catalog
// ============================================================================

/// Validated, flattened view of the stream tree
#[derive(Debug, Clone)]
pub struct StreamCatalog {
    streams: Vec<Stream>,
}

impl StreamCatalog {
    /// Catalog of the built-in streams
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_STREAMS)
    }

    /// Parse and validate a stream tree from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let tree: StreamTree = serde_yaml::from_str(yaml)?;
        Self::from_definitions(&tree.streams)
    }

    /// Validate and flatten stream definitions
    pub fn from_definitions(definitions: &[StreamDefinition]) -> Result<Self> {
        validate(definitions)?;
        Ok(Self {
            streams: flatten_streams(definitions),
        })
    }

    /// All streams, parents before their children
    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    /// Look up a stream by name
    pub fn get(&self, name: &str) -> Option<&Stream> {
        self.streams.iter().find(|s| s.name == name)
    }

    /// Look up a stream by name, failing if it does not exist
    pub fn require(&self, name: &str) -> Result<&Stream> {
        self.get(name).ok_or_else(|| Error::StreamNotFound {
            stream: name.to_string(),
        })
    }

    /// Streams without a parent, in declaration order
    pub fn top_level(&self) -> impl Iterator<Item = &Stream> {
        self.streams.iter().filter(|s| !s.is_child())
    }

    /// Children of a stream, in declaration order
    pub fn children_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Stream> {
        self.streams
            .iter()
            .filter(move |s| s.parent_stream.as_deref() == Some(name))
    }

    /// All stream names
    pub fn names(&self) -> Vec<&str> {
        self.streams.iter().map(|s| s.name.as_str()).collect()
    }
}
