//! Connector configuration
//!
//! The configuration is a flat JSON object supplied with `--config`.
//! Required keys are checked before deserialization so that a missing
//! credential is reported by name rather than as a serde error.

use crate::error::{Error, Result};
use crate::types::{parse_datetime, JsonValue, OptionStringExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::time::Duration;

/// Keys that must be present in every configuration
pub const REQUIRED_CONFIG_KEYS: &[&str] = &["customer_id", "passphrase"];

/// Official merchant web service endpoint
pub const DEFAULT_ENDPOINT_URL: &str = "https://ws.tradetracker.com/soap/merchant";

/// Default look-back for report windows, in days
pub const DEFAULT_ATTRIBUTION_WINDOW: i64 = 30;

/// Default transport timeout, in seconds
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 300;

/// Typed connector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// Merchant customer ID
    #[serde(deserialize_with = "string_or_number")]
    pub customer_id: String,

    /// Web service passphrase
    pub passphrase: String,

    /// Authenticate against the sandbox
    #[serde(default)]
    pub sandbox: bool,

    /// Locale for localized fields (e.g. `nl_NL`)
    #[serde(default)]
    pub locale: Option<String>,

    /// Use demo data
    #[serde(default)]
    pub demo: bool,

    /// Initial bookmark for incremental streams
    #[serde(default)]
    pub start_date: Option<String>,

    /// Report look-back in days
    #[serde(default = "default_attribution_window")]
    pub attribution_window: i64,

    /// SOAP endpoint override
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Transport timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_attribution_window() -> i64 {
    DEFAULT_ATTRIBUTION_WINDOW
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

impl TapConfig {
    /// Build a config from a raw JSON value, checking required keys first
    pub fn from_value(value: JsonValue) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::config("Config must be a JSON object"))?;

        for key in REQUIRED_CONFIG_KEYS {
            match obj.get(*key) {
                None | Some(JsonValue::Null) => return Err(Error::missing_field(*key)),
                Some(JsonValue::String(s)) if s.is_empty() => {
                    return Err(Error::missing_field(*key))
                }
                _ => {}
            }
        }

        let mut config: TapConfig = serde_json::from_value(value)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        config.locale = config.locale.none_if_empty();
        config.validate()?;
        Ok(config)
    }

    /// Parse a config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Load a config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::config(format!("Failed to read config file: {e}")))?;
        Self::from_json(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.attribution_window < 0 {
            return Err(Error::invalid_value(
                "attribution_window",
                "must not be negative",
            ));
        }
        let reachable = chrono::Duration::try_days(self.attribution_window)
            .and_then(|lookback| Utc::now().checked_sub_signed(lookback))
            .is_some();
        if !reachable {
            return Err(Error::invalid_value(
                "attribution_window",
                format!("{} days is out of range", self.attribution_window),
            ));
        }
        if let Some(start_date) = &self.start_date {
            parse_datetime(start_date)
                .map_err(|e| Error::invalid_value("start_date", e.to_string()))?;
        }
        if let Some(endpoint) = &self.endpoint_url {
            url::Url::parse(endpoint)?;
        }
        Ok(())
    }

    /// Parsed start date, required for sync
    pub fn start_datetime(&self) -> Result<DateTime<Utc>> {
        let raw = self
            .start_date
            .as_deref()
            .ok_or_else(|| Error::missing_field("start_date"))?;
        parse_datetime(raw).map_err(|e| Error::invalid_value("start_date", e.to_string()))
    }

    /// Endpoint the SOAP transport talks to
    pub fn endpoint(&self) -> &str {
        self.endpoint_url.as_deref().unwrap_or(DEFAULT_ENDPOINT_URL)
    }

    /// Transport timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}
