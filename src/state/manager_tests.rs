//! Tests for StateManager

use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::tempdir;

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_state_manager_new() {
    let manager = StateManager::new("/tmp/test-state.json");
    assert!(!manager.is_in_memory());
    assert_eq!(manager.path(), Some(std::path::Path::new("/tmp/test-state.json")));
}

#[test]
fn test_state_manager_in_memory() {
    let manager = StateManager::in_memory();
    assert!(manager.is_in_memory());
}

#[tokio::test]
async fn test_from_json() {
    let manager = StateManager::from_json(
        r#"{"bookmarks": {"campaign_report": {"date(parent:42)": "2024-02-01T00:00:00Z"}}}"#,
    )
    .unwrap();

    assert!(manager.is_in_memory());
    assert_eq!(
        manager
            .get_bookmark("campaign_report", "date", Some("42"))
            .await,
        Some("2024-02-01T00:00:00Z".to_string())
    );
}

#[tokio::test]
async fn test_from_empty_json() {
    let manager = StateManager::from_json("  ").unwrap();
    assert_eq!(manager.snapshot().await, State::new());
}

#[test]
fn test_load_invalid_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{not json").unwrap();

    let err = StateManager::from_file(&path).unwrap_err();
    assert!(matches!(err, crate::error::Error::State { .. }));
}

// ============================================================================
// Bookmark Tests
// ============================================================================

#[tokio::test]
async fn test_write_bookmark() {
    let manager = StateManager::in_memory();

    assert!(manager
        .get_bookmark("campaign_report", "date", Some("1"))
        .await
        .is_none());

    assert!(manager
        .write_bookmark("campaign_report", "date", Some("1"), "2024-01-06T00:00:00Z")
        .await
        .unwrap());
    assert!(!manager
        .write_bookmark("campaign_report", "date", Some("1"), "2024-01-02T00:00:00Z")
        .await
        .unwrap());

    assert_eq!(
        manager
            .get_bookmark("campaign_report", "date", Some("1"))
            .await,
        Some("2024-01-06T00:00:00Z".to_string())
    );
    assert!(manager
        .get_bookmark("campaign_report", "date", Some("2"))
        .await
        .is_none());
}

#[tokio::test]
async fn test_bookmark_auto_saves() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let manager = StateManager::new(&path);
    manager
        .write_bookmark("campaign_report", "date", Some("42"), "2024-01-06T00:00:00Z")
        .await
        .unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        saved,
        json!({"bookmarks": {"campaign_report": {"date(parent:42)": "2024-01-06T00:00:00Z"}}})
    );
    assert!(!path.with_extension("tmp").exists());
}

#[tokio::test]
async fn test_save_and_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    {
        let manager = StateManager::from_file(&path).unwrap();
        manager
            .write_bookmark("campaign_report", "date", Some("7"), "2024-01-10")
            .await
            .unwrap();
        manager.set_currently_syncing(Some("campaigns")).await.unwrap();
    }

    let reloaded = StateManager::from_file(&path).unwrap();
    assert_eq!(
        reloaded
            .get_bookmark("campaign_report", "date", Some("7"))
            .await,
        Some("2024-01-10".to_string())
    );
    assert_eq!(
        reloaded.currently_syncing().await,
        Some("campaigns".to_string())
    );
}

#[tokio::test]
async fn test_save_in_memory_noop() {
    let manager = StateManager::in_memory();
    manager.set_currently_syncing(Some("campaigns")).await.unwrap();
    manager.save().await.unwrap();
    assert_eq!(
        manager.currently_syncing().await,
        Some("campaigns".to_string())
    );
}

// ============================================================================
// Sharing Tests
// ============================================================================

#[tokio::test]
async fn test_clone_shares_state() {
    let manager = StateManager::in_memory();
    let clone = manager.clone();

    clone
        .write_bookmark("campaign_report", "date", None, "2024-01-01")
        .await
        .unwrap();

    let state = manager.state().await;
    assert_eq!(
        state.get_bookmark("campaign_report", "date", None),
        Some("2024-01-01")
    );
}

#[tokio::test]
async fn test_currently_syncing_cleared() {
    let manager = StateManager::in_memory();
    manager.set_currently_syncing(Some("campaigns")).await.unwrap();
    manager.set_currently_syncing(None).await.unwrap();

    assert!(manager.currently_syncing().await.is_none());
    let json = manager.to_json_pretty().await.unwrap();
    assert!(!json.contains("currently_syncing"));
}
