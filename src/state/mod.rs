//! State management module
//!
//! Handles bookmarks and resumability. State is persisted between sync runs
//! so incremental streams continue where the last run stopped.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - bookmarks per stream plus the currently syncing marker
//! - `StateManager` - shared handle with atomic file persistence
//! - `bookmark_key` - composite keys for bookmarks scoped to a parent

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{bookmark_key, State};

#[cfg(test)]
mod manager_tests;
