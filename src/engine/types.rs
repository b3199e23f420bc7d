//! Engine types
//!
//! Settings and statistics for the sync engine.

use crate::config::TapConfig;
use crate::error::Result;
use chrono::{DateTime, Utc};

/// Settings for a sync run
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Bookmark used when a stream has none yet
    pub start_date: DateTime<Utc>,
    /// Earliest report day, as days before now
    pub attribution_window: i64,
    /// Fixed clock; the wall clock is read per stream when unset
    pub now: Option<DateTime<Utc>>,
}

impl SyncSettings {
    /// Create settings with the default attribution window
    pub fn new(start_date: DateTime<Utc>) -> Self {
        Self {
            start_date,
            attribution_window: crate::config::DEFAULT_ATTRIBUTION_WINDOW,
            now: None,
        }
    }

    /// Settings taken from the connector configuration
    pub fn from_config(config: &TapConfig) -> Result<Self> {
        Ok(Self::new(config.start_datetime()?).with_attribution_window(config.attribution_window))
    }

    /// Set the attribution window in days
    #[must_use]
    pub fn with_attribution_window(mut self, days: i64) -> Self {
        self.attribution_window = days;
        self
    }

    /// Pin the clock
    #[must_use]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Current time according to the settings
    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Total records emitted
    pub records_synced: usize,
    /// Total remote fetches
    pub fetches: usize,
    /// Top-level streams synced
    pub streams_synced: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records
    pub fn add_records(&mut self, count: usize) {
        self.records_synced += count;
    }

    /// Add a fetch
    pub fn add_fetch(&mut self) {
        self.fetches += 1;
    }

    /// Add a stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
