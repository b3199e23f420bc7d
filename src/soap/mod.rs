//! SOAP module
//!
//! Minimal RPC/encoded SOAP 1.1 support for the merchant web service.
//!
//! # Features
//!
//! - **Envelopes**: Typed parameters rendered with `xsi:type` annotations
//! - **Transport**: Cookie-aware reqwest client, one endpoint, no retries
//! - **Decoding**: Responses and faults converted to JSON with quick-xml

mod client;
mod decode;
mod envelope;

pub use client::{SoapClient, SoapClientConfig, SoapClientConfigBuilder, DEFAULT_NAMESPACE};
pub use decode::{parse_envelope, xml_to_json};
pub use envelope::{SoapRequest, SoapValue};
