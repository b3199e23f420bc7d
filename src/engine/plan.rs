//! Sync plan
//!
//! The user selects streams; the plan adds the parent of every selected
//! child, since children are fetched per parent record. A parent that is
//! only in the plan for that reason is fetched but never emitted.
//!
//! An input catalog can also deselect fields. Those are dropped from emitted
//! records, except the stream's key and bookmark fields.

use crate::catalog::{Catalog, StreamCatalog};
use crate::error::Result;
use std::collections::{HashMap, HashSet};

/// Streams selected by the user and streams that must be fetched
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    selected: HashSet<String>,
    sync: Vec<String>,
    excluded_fields: HashMap<String, HashSet<String>>,
}

impl SyncPlan {
    /// Build a plan from selected stream names
    pub fn new(catalog: &StreamCatalog, selected: &[String]) -> Result<Self> {
        let mut wanted: HashSet<&str> = HashSet::new();
        for name in selected {
            let stream = catalog.require(name)?;
            wanted.insert(&stream.name);
            if let Some(parent) = &stream.parent_stream {
                wanted.insert(parent);
            }
        }

        let sync: Vec<String> = catalog
            .streams()
            .iter()
            .filter(|s| wanted.contains(s.name.as_str()))
            .map(|s| s.name.clone())
            .collect();

        Ok(Self {
            selected: selected.iter().cloned().collect(),
            sync,
            excluded_fields: HashMap::new(),
        })
    }

    /// Take field deselection from an input catalog
    #[must_use]
    pub fn with_field_selection(mut self, input: &Catalog) -> Self {
        self.excluded_fields = input
            .streams
            .iter()
            .filter(|entry| self.selected.contains(&entry.stream))
            .map(|entry| {
                let fields: HashSet<String> = entry
                    .excluded_fields()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                (entry.stream.clone(), fields)
            })
            .filter(|(_, fields)| !fields.is_empty())
            .collect();
        self
    }

    /// Whether the user selected the stream
    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.contains(name)
    }

    /// Whether the stream is fetched in this run
    pub fn should_sync(&self, name: &str) -> bool {
        self.sync.iter().any(|s| s == name)
    }

    /// Whether the stream is fetched only to drive its children
    pub fn is_parent_only(&self, name: &str) -> bool {
        self.should_sync(name) && !self.is_selected(name)
    }

    /// Streams fetched in this run, in catalog order
    pub fn sync_streams(&self) -> &[String] {
        &self.sync
    }

    /// Fields deselected for a stream, if any
    pub fn excluded_fields(&self, name: &str) -> Option<&HashSet<String>> {
        self.excluded_fields.get(name)
    }

    /// Whether nothing was selected
    pub fn is_empty(&self) -> bool {
        self.sync.is_empty()
    }
}
