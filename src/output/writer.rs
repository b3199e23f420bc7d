//! Message sinks
//!
//! The connector writes one JSON message per line to standard output.

use super::messages::Message;
use crate::error::Result;
use std::io::Write;
use tracing::error;

/// Destination for output messages
pub trait MessageSink {
    /// Write one message
    fn emit(&mut self, message: &Message) -> Result<()>;
}

/// Writes messages as newline-delimited JSON, flushing after each line
#[derive(Debug)]
pub struct JsonLinesWriter<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesWriter<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of messages written so far
    pub fn messages_written(&self) -> usize {
        self.written
    }

    /// Unwrap the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, message: &Message) -> Result<()> {
        serde_json::to_writer(&mut self.writer, message)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl JsonLinesWriter<std::io::Stdout> {
    /// Writer for standard output
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> MessageSink for JsonLinesWriter<W> {
    fn emit(&mut self, message: &Message) -> Result<()> {
        self.write_line(message).inspect_err(|e| {
            error!(
                "Error writing message for stream {}: {e}",
                message.stream().unwrap_or("-")
            );
        })?;
        self.written += 1;
        Ok(())
    }
}

/// Collects messages in memory
impl MessageSink for Vec<Message> {
    fn emit(&mut self, message: &Message) -> Result<()> {
        self.push(message.clone());
        Ok(())
    }
}
