//! SOAP transport
//!
//! Posts envelopes to a single endpoint over a cookie-aware reqwest client.
//! The merchant service keeps the authenticated session in a cookie, so the
//! same client instance must be reused for every call after `authenticate`.
//! Requests are never retried.

use super::decode::{fault_from_body, parse_envelope};
use super::envelope::SoapRequest;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Service namespace used for operations and complex types
pub const DEFAULT_NAMESPACE: &str = "https://ws.tradetracker.com/soap/merchant";

/// Configuration for the SOAP client
#[derive(Debug, Clone)]
pub struct SoapClientConfig {
    /// Endpoint URL every envelope is posted to
    pub endpoint: String,
    /// Service namespace
    pub namespace: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for SoapClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_NAMESPACE.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            timeout: Duration::from_secs(300),
            user_agent: format!("tap-tradetracker/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl SoapClientConfig {
    /// Create a new config builder
    pub fn builder() -> SoapClientConfigBuilder {
        SoapClientConfigBuilder::default()
    }
}

/// Builder for SOAP client config
#[derive(Default)]
pub struct SoapClientConfigBuilder {
    config: SoapClientConfig,
}

impl SoapClientConfigBuilder {
    /// Set the endpoint URL
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> SoapClientConfig {
        self.config
    }
}

/// Session-holding SOAP client
pub struct SoapClient {
    client: Client,
    config: SoapClientConfig,
}

impl SoapClient {
    /// Create a client, validating the endpoint URL
    pub fn new(config: SoapClientConfig) -> Result<Self> {
        url::Url::parse(&config.endpoint)?;

        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, config })
    }

    /// Client configuration
    pub fn config(&self) -> &SoapClientConfig {
        &self.config
    }

    /// Invoke an operation and return its decoded result
    ///
    /// Faults come back as [`Error::SoapFault`], whatever the HTTP status.
    /// Other non-success statuses become [`Error::HttpStatus`].
    pub async fn call(&self, request: &SoapRequest) -> Result<JsonValue> {
        let body = request.to_envelope(&self.config.namespace);
        let action = request.action(&self.config.namespace);

        debug!("SOAP call: {} -> {}", request.operation, self.config.endpoint);

        let response = self
            .client
            .post(&self.config.endpoint)
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("text/xml; charset=utf-8"),
            )
            .header("SOAPAction", action)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(fault_from_body(&text)
                .unwrap_or_else(|| Error::http_status(status.as_u16(), text)));
        }

        let result = parse_envelope(&text)?;
        debug!("SOAP call {} succeeded", request.operation);
        Ok(result)
    }
}

impl std::fmt::Debug for SoapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoapClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
