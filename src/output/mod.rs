//! Output module
//!
//! Singer messages and the sinks that write them.
//!
//! # Overview
//!
//! - `Message` - SCHEMA, RECORD and STATE messages, tagged by `type`
//! - `MessageSink` - destination trait used by the sync engine
//! - `JsonLinesWriter` - one JSON message per line on any `Write`

mod messages;
mod writer;

pub use messages::Message;
pub use writer::{JsonLinesWriter, MessageSink};
