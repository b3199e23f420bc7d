//! Shared state handle
//!
//! Clones share one `State`. When a backing file is set, every mutation is
//! flushed to it through a temp file and a rename.

use super::types::State;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

#[derive(Debug, Clone)]
pub struct StateManager {
    file: Option<PathBuf>,
    state: Arc<RwLock<State>>,
}

impl StateManager {
    /// Empty state backed by `path`
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::build(Some(path.as_ref().to_path_buf()), State::new())
    }

    /// Empty state that is never written anywhere
    pub fn in_memory() -> Self {
        Self::build(None, State::new())
    }

    fn build(file: Option<PathBuf>, state: State) -> Self {
        Self {
            file,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Load `path` if it exists and keep it as the backing file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let state = match std::fs::read_to_string(path) {
            Ok(contents) => parse_state(&contents, "state file")?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => State::new(),
            Err(e) => {
                return Err(Error::state(format!(
                    "Cannot read state file {}: {e}",
                    path.display()
                )))
            }
        };
        Ok(Self::build(Some(path.to_path_buf()), state))
    }

    /// In-memory state parsed from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::build(None, parse_state(json, "state JSON")?))
    }

    /// Flush to the backing file; no-op in memory
    pub async fn save(&self) -> Result<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };

        let body = self.to_json_pretty().await?;
        let staging = file.with_extension("tmp");
        tokio::fs::write(&staging, body)
            .await
            .map_err(|e| Error::state(format!("Cannot write {}: {e}", staging.display())))?;
        tokio::fs::rename(&staging, file)
            .await
            .map_err(|e| Error::state(format!("Cannot replace {}: {e}", file.display())))
    }

    pub async fn state(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().await
    }

    pub async fn snapshot(&self) -> State {
        self.state().await.clone()
    }

    pub async fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&*self.state().await)
            .map_err(|e| Error::state(format!("Cannot serialize state: {e}")))
    }

    pub async fn get_bookmark(
        &self,
        stream: &str,
        field: &str,
        parent_id: Option<&str>,
    ) -> Option<String> {
        self.state()
            .await
            .get_bookmark(stream, field, parent_id)
            .map(str::to_owned)
    }

    /// Move a bookmark forward. Returns false, without saving, when `value`
    /// is not newer than what is stored.
    pub async fn write_bookmark(
        &self,
        stream: &str,
        field: &str,
        parent_id: Option<&str>,
        value: &str,
    ) -> Result<bool> {
        let advanced = self
            .state
            .write()
            .await
            .write_bookmark(stream, field, parent_id, value)?;
        if advanced {
            self.save().await?;
        }
        Ok(advanced)
    }

    pub async fn currently_syncing(&self) -> Option<String> {
        self.state().await.currently_syncing.clone()
    }

    /// Mark `stream` as in progress, or clear the marker with `None`
    pub async fn set_currently_syncing(&self, stream: Option<&str>) -> Result<()> {
        self.state.write().await.set_currently_syncing(stream);
        self.save().await
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn is_in_memory(&self) -> bool {
        self.file.is_none()
    }
}

fn parse_state(contents: &str, source: &str) -> Result<State> {
    if contents.trim().is_empty() {
        return Ok(State::new());
    }
    serde_json::from_str(contents).map_err(|e| Error::state(format!("Invalid {source}: {e}")))
}
