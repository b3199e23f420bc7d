//! Tests for argument parsing and the runner

use super::*;
use crate::error::Error;
use clap::Parser;
use pretty_assertions::assert_eq;
use test_case::test_case;

#[test]
fn test_parse_sync_with_globals() {
    let cli = Cli::try_parse_from([
        "tap-tradetracker",
        "sync",
        "--streams",
        "campaigns,campaign_report",
        "-C",
        "config.json",
        "--state",
        "state.json",
        "-v",
    ])
    .unwrap();

    assert_eq!(cli.config.unwrap().to_str(), Some("config.json"));
    assert_eq!(cli.state.unwrap().to_str(), Some("state.json"));
    assert!(cli.verbose);
    match cli.command {
        Commands::Sync { streams } => {
            assert_eq!(streams.as_deref(), Some("campaigns,campaign_report"));
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_parse_discover_with_catalog() {
    let cli =
        Cli::try_parse_from(["tap-tradetracker", "--catalog", "catalog.json", "discover"]).unwrap();
    assert!(matches!(cli.command, Commands::Discover));
    assert!(cli.catalog.is_some());
    assert!(!cli.verbose);
}

#[test]
fn test_unknown_command_rejected() {
    assert!(Cli::try_parse_from(["tap-tradetracker", "read"]).is_err());
}

#[test_case("campaigns", &["campaigns"] ; "single")]
#[test_case("campaigns, affiliate_sites", &["campaigns", "affiliate_sites"] ; "trims spaces")]
#[test_case("campaigns,,", &["campaigns"] ; "skips blanks")]
#[test_case("", &[] ; "empty")]
fn test_parse_stream_list(input: &str, expected: &[&str]) {
    assert_eq!(parse_stream_list(input), expected);
}

#[tokio::test]
async fn test_discover_runs_without_config() {
    let cli = Cli::try_parse_from(["tap-tradetracker", "discover"]).unwrap();
    Runner::new(cli).run().await.unwrap();
}

#[tokio::test]
async fn test_sync_requires_config() {
    let cli = Cli::try_parse_from(["tap-tradetracker", "sync"]).unwrap();
    let err = Runner::new(cli).run().await.unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[tokio::test]
async fn test_sync_requires_start_date() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"customer_id": "1", "passphrase": "secret"}"#).unwrap();

    let cli = Cli::try_parse_from([
        "tap-tradetracker",
        "sync",
        "-C",
        path.to_str().unwrap(),
    ])
    .unwrap();
    let err = Runner::new(cli).run().await.unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { .. }));
}
