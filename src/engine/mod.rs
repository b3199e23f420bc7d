//! Sync engine
//!
//! Walks the stream tree and turns remote documents into output messages.
//!
//! # Overview
//!
//! For each top-level stream in the plan the engine:
//! - announces the stream and its selected children with SCHEMA messages
//! - marks the stream as currently syncing
//! - fetches records once, or once per date window for report streams
//! - normalizes, tags and conforms each record, then emits it if selected
//! - syncs every child stream for each parent record
//! - advances the bookmark after each window and emits STATE
//!
//! Parents that are only in the plan because a child was selected are
//! fetched to drive their children but never emitted.

mod plan;
mod types;
mod window;

pub use plan::SyncPlan;
pub use types::{SyncSettings, SyncStats};
pub use window::{date_windows, initial_start, DateWindow, DateWindows, WindowTag};

use crate::catalog::{Endpoint, Stream, StreamCatalog};
use crate::error::{Error, Result};
use crate::merchant::{into_records, MerchantApi};
use crate::normalize::normalize_record;
use crate::output::{Message, MessageSink};
use crate::schema::{conform_record, load_schema, JsonSchema};
use crate::state::StateManager;
use crate::types::{format_datetime, parse_datetime, scalar_to_string, JsonObject, JsonValue};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, info};

/// Sync engine for a single run
pub struct SyncEngine<'a, A: MerchantApi + ?Sized> {
    /// Remote service
    api: &'a A,
    /// Stream tree
    catalog: &'a StreamCatalog,
    /// State manager
    state: StateManager,
    /// Run settings
    settings: SyncSettings,
    /// Loaded schemas by stream
    schemas: HashMap<String, JsonSchema>,
    /// Statistics
    stats: SyncStats,
}

impl<'a, A: MerchantApi + ?Sized> SyncEngine<'a, A> {
    /// Create a new sync engine
    pub fn new(
        api: &'a A,
        catalog: &'a StreamCatalog,
        state: StateManager,
        settings: SyncSettings,
    ) -> Self {
        Self {
            api,
            catalog,
            state,
            settings,
            schemas: HashMap::new(),
            stats: SyncStats::default(),
        }
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Sync every stream in the plan
    pub async fn run(&mut self, plan: &SyncPlan, sink: &mut dyn MessageSink) -> Result<SyncStats> {
        let started = Instant::now();

        if let Some(previous) = self.state.currently_syncing().await {
            info!("Last run stopped while syncing: {previous}");
        }
        if plan.is_empty() {
            info!("No streams selected");
            return Ok(self.stats.clone());
        }

        let catalog = self.catalog;
        for stream in catalog.top_level() {
            if !plan.should_sync(&stream.name) {
                continue;
            }

            info!("START Syncing: {}", stream.name);
            if plan.is_parent_only(&stream.name) {
                info!("{} is fetched for its children only", stream.name);
            }
            self.announce(stream, plan, sink)?;

            self.state.set_currently_syncing(Some(&stream.name)).await?;
            self.emit_state(sink).await?;

            let total = self.sync_stream(stream, None, plan, sink).await?;

            self.state.set_currently_syncing(None).await?;
            self.emit_state(sink).await?;

            self.stats.add_stream();
            info!("FINISHED Syncing: {}, total_records: {total}", stream.name);
        }

        self.stats
            .set_duration(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX));
        info!(
            "Sync complete: {} records, {} fetches, {} streams in {}ms",
            self.stats.records_synced,
            self.stats.fetches,
            self.stats.streams_synced,
            self.stats.duration_ms
        );

        Ok(self.stats.clone())
    }

    // ========================================================================
    // Streams
    // ========================================================================

    /// Emit SCHEMA for a top-level stream and its children, where selected
    fn announce(&mut self, stream: &Stream, plan: &SyncPlan, sink: &mut dyn MessageSink) -> Result<()> {
        let catalog = self.catalog;
        let family = std::iter::once(stream).chain(catalog.children_of(&stream.name));

        for member in family {
            if !plan.is_selected(&member.name) {
                continue;
            }
            let schema = self.schema(&member.name)?.to_json();
            sink.emit(&Message::schema(
                &member.name,
                schema,
                member.key_properties.clone(),
                member.bookmark_properties(),
            ))?;
        }
        Ok(())
    }

    /// Sync one stream, for one parent when it is a child; returns records fetched
    async fn sync_stream(
        &mut self,
        stream: &Stream,
        parent_id: Option<&str>,
        plan: &SyncPlan,
        sink: &mut dyn MessageSink,
    ) -> Result<usize> {
        let selected = plan.is_selected(&stream.name);
        let mut total = 0;

        if !stream.is_incremental() {
            let records = self.fetch_records(stream, parent_id, None).await?;
            total += records.len();
            self.emit_records(stream, &records, plan, sink)?;
            Box::pin(self.sync_children(stream, &records, plan, sink)).await?;
            return Ok(total);
        }

        let field = stream
            .replication_key
            .as_deref()
            .ok_or_else(|| Error::catalog(format!("Stream '{}' has no replication_key", stream.name)))?;
        let last = self.last_bookmark(stream, field, parent_id).await?;
        let now = self.settings.now();
        let start = match stream.date_window_size {
            Some(_) => initial_start(last, now, self.settings.attribution_window),
            None => last,
        };

        let mut max_bookmark = last;
        for window in date_windows(start, now, stream.date_window_size) {
            debug!(
                "Stream: {}, Parent ID: {}, window {} to {}",
                stream.name,
                parent_id.unwrap_or("-"),
                window.date_from(),
                window.date_to()
            );

            let records = self.fetch_records(stream, parent_id, Some(&window)).await?;
            total += records.len();
            self.emit_records(stream, &records, plan, sink)?;
            Box::pin(self.sync_children(stream, &records, plan, sink)).await?;

            if selected {
                for record in &records {
                    if let Some(value) = bookmark_value(stream, field, record)? {
                        max_bookmark = max_bookmark.max(value);
                    }
                }
                self.state
                    .write_bookmark(&stream.name, field, parent_id, &format_datetime(max_bookmark))
                    .await?;
                self.emit_state(sink).await?;
            }
        }

        Ok(total)
    }

    /// Sync each child stream in the plan for every parent record
    async fn sync_children(
        &mut self,
        stream: &Stream,
        records: &[JsonObject],
        plan: &SyncPlan,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        let catalog = self.catalog;
        let children: Vec<&Stream> = catalog
            .children_of(&stream.name)
            .filter(|child| plan.should_sync(&child.name))
            .collect();
        if children.is_empty() || records.is_empty() {
            return Ok(());
        }

        let parent_key = stream.parent_key.as_deref().ok_or_else(|| {
            Error::catalog(format!("Stream '{}' has children but no parent_key", stream.name))
        })?;

        for record in records {
            let parent_id = record
                .get(parent_key)
                .and_then(scalar_to_string)
                .ok_or_else(|| {
                    Error::transform(
                        &stream.name,
                        format!("record has no value for parent key '{parent_key}'"),
                    )
                })?;

            for child in &children {
                let count = Box::pin(self.sync_stream(child, Some(&parent_id), plan, sink)).await?;
                debug!(
                    "Stream: {}, Parent ID: {parent_id}, records: {count}",
                    child.name
                );
            }
        }
        Ok(())
    }

    // ========================================================================
    // Records
    // ========================================================================

    /// Fetch one batch and turn it into conformed records
    async fn fetch_records(
        &mut self,
        stream: &Stream,
        parent_id: Option<&str>,
        window: Option<&DateWindow>,
    ) -> Result<Vec<JsonObject>> {
        let raw = self.fetch(stream, parent_id, window).await?;
        self.stats.add_fetch();

        let schema = self.schema(&stream.name)?.clone();
        let tag = window
            .filter(|_| stream.endpoint.takes_date_range())
            .map(DateWindow::tag);

        raw.into_iter()
            .map(|value| {
                let mut record = normalize_record(&stream.name, value)?;
                if let (Some(field), Some(id)) = (&stream.parent_field, parent_id) {
                    record
                        .entry(field.clone())
                        .or_insert_with(|| JsonValue::String(id.to_string()));
                }
                if let Some(tag) = &tag {
                    tag.apply(&mut record);
                }
                conform_record(&stream.name, record, &schema)
            })
            .collect()
    }

    /// Remote call backing a stream
    async fn fetch(
        &self,
        stream: &Stream,
        parent_id: Option<&str>,
        window: Option<&DateWindow>,
    ) -> Result<Vec<JsonValue>> {
        match stream.endpoint {
            Endpoint::Campaigns => self.api.campaigns().await,
            Endpoint::AffiliateSites => {
                let campaign_id = campaign_id(stream, parent_id)?;
                self.api.affiliate_sites(campaign_id).await
            }
            Endpoint::CampaignReport => {
                let campaign_id = campaign_id(stream, parent_id)?;
                let window = window.ok_or_else(|| {
                    Error::catalog(format!("Stream '{}' needs a date window", stream.name))
                })?;
                let report = self
                    .api
                    .campaign_report(campaign_id, window.date_from(), window.date_to())
                    .await?;
                Ok(into_records(report))
            }
        }
    }

    fn emit_records(
        &mut self,
        stream: &Stream,
        records: &[JsonObject],
        plan: &SyncPlan,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        if !plan.is_selected(&stream.name) {
            return Ok(());
        }

        let excluded = plan.excluded_fields(&stream.name);
        let extracted = Utc::now();
        for record in records {
            let record = match excluded {
                Some(fields) => without_fields(stream, record, fields),
                None => record.clone(),
            };
            sink.emit(&Message::record(&stream.name, record, extracted))?;
        }
        self.stats.add_records(records.len());
        Ok(())
    }

    // ========================================================================
    // State
    // ========================================================================

    async fn last_bookmark(
        &self,
        stream: &Stream,
        field: &str,
        parent_id: Option<&str>,
    ) -> Result<DateTime<Utc>> {
        match self.state.get_bookmark(&stream.name, field, parent_id).await {
            Some(value) => parse_datetime(&value),
            None => Ok(self.settings.start_date),
        }
    }

    async fn emit_state(&self, sink: &mut dyn MessageSink) -> Result<()> {
        let value = self.state.snapshot().await.to_value();
        sink.emit(&Message::state(value))
    }

    fn schema(&mut self, stream: &str) -> Result<&JsonSchema> {
        if !self.schemas.contains_key(stream) {
            let schema = load_schema(stream)?;
            self.schemas.insert(stream.to_string(), schema);
        }
        self.schemas
            .get(stream)
            .ok_or_else(|| Error::StreamNotFound {
                stream: stream.to_string(),
            })
    }
}

impl<A: MerchantApi + ?Sized> std::fmt::Debug for SyncEngine<'_, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("state", &self.state)
            .field("settings", &self.settings)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// Campaign ID handed down by the parent record
fn campaign_id(stream: &Stream, parent_id: Option<&str>) -> Result<i64> {
    let id = parent_id.ok_or_else(|| {
        Error::catalog(format!("Stream '{}' requires a parent campaign", stream.name))
    })?;
    id.parse().map_err(|_| {
        Error::transform(
            &stream.name,
            format!("parent ID '{id}' is not a numeric campaign ID"),
        )
    })
}

/// Copy of `record` without deselected fields; key and bookmark fields stay
fn without_fields(stream: &Stream, record: &JsonObject, excluded: &HashSet<String>) -> JsonObject {
    let keep = |field: &str| {
        !excluded.contains(field)
            || stream.key_properties.iter().any(|k| k == field)
            || stream.replication_key.as_deref() == Some(field)
    };
    record
        .iter()
        .filter(|(field, _)| keep(field.as_str()))
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect()
}

/// Bookmark value carried by a record, if any
fn bookmark_value(stream: &Stream, field: &str, record: &JsonObject) -> Result<Option<DateTime<Utc>>> {
    match record.get(field).and_then(scalar_to_string) {
        Some(value) => parse_datetime(&value).map(Some).map_err(|e| {
            Error::transform(&stream.name, format!("invalid {field} '{value}': {e}"))
        }),
        None => Ok(None),
    }
}
