//! Error types for tap-tradetracker
//!
//! One error enum for the whole connector, grouped by where failures start:
//! configuration, the remote service, record transformation, the stream
//! catalog and persisted state. Every variant is fatal to a sync run and
//! nothing is retried internally.

use thiserror::Error;

/// The main error type for tap-tradetracker
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Config is missing required key: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid value for config key '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Invalid stream definitions: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Invalid JSON document: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Remote Boundary Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("SOAP fault {code}: {message}")]
    SoapFault { code: String, message: String },

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Malformed SOAP response: {message}")]
    XmlParse { message: String },

    // ============================================================================
    // Transform Errors
    // ============================================================================
    #[error("Transform error in stream '{stream}': {message}")]
    Transform { stream: String, message: String },

    // ============================================================================
    // Catalog Errors
    // ============================================================================
    #[error("Catalog error: {message}")]
    Catalog { message: String },

    #[error("Unknown stream '{stream}'")]
    StreamNotFound { stream: String },

    // ============================================================================
    // State Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a SOAP fault error
    pub fn soap_fault(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SoapFault {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create an XML parse error
    pub fn xml(message: impl Into<String>) -> Self {
        Self::XmlParse {
            message: message.into(),
        }
    }

    /// Create a transform error
    pub fn transform(stream: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transform {
            stream: stream.into(),
            message: message.into(),
        }
    }

    /// Create a catalog error
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Whether the error came from the remote SOAP boundary
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::Auth { .. }
                | Error::Http(_)
                | Error::HttpStatus { .. }
                | Error::SoapFault { .. }
                | Error::XmlParse { .. }
        )
    }
}

/// Result type alias for tap-tradetracker
pub type Result<T> = std::result::Result<T, Error>;

/// Prefix an error with what was being attempted
pub trait ResultExt<T> {
    /// Prefix with a fixed message
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Prefix with a message built only on failure
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.with_context(|| message.into())
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| Error::Other(format!("{}: {}", f(), e.into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("customer_id");
        assert_eq!(err.to_string(), "Config is missing required key: customer_id");

        let err = Error::http_status(404, "Not found");
        assert_eq!(err.to_string(), "Service returned HTTP 404: Not found");

        let err = Error::soap_fault("SOAP-ENV:Server", "Access denied");
        assert_eq!(err.to_string(), "SOAP fault SOAP-ENV:Server: Access denied");

        let err = Error::transform("campaigns", "record is not an object");
        assert_eq!(
            err.to_string(),
            "Transform error in stream 'campaigns': record is not an object"
        );
    }

    #[test]
    fn test_is_remote() {
        assert!(Error::auth("bad passphrase").is_remote());
        assert!(Error::http_status(500, "").is_remote());
        assert!(Error::soap_fault("Client", "boom").is_remote());
        assert!(Error::xml("truncated").is_remote());

        assert!(!Error::config("test").is_remote());
        assert!(!Error::transform("s", "m").is_remote());
        assert!(!Error::state("m").is_remote());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
