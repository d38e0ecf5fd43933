//! Sink implementations
//!
//! Contains MemorySink, FileSink, WriterSink and LogSink.

mod file;
mod log;
mod memory;
mod writer;

pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;
pub use self::memory::MemorySink;
pub use self::writer::WriterSink;

use contracts::ContractError;
use serde::{Deserialize, Serialize};

/// Headers announced to a sink before its first byte
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeaders {
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl ResponseHeaders {
    pub fn new(mime_type: &str, filename: Option<&str>) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            filename: filename.map(str::to_string),
        }
    }
}

/// Tracks the header-before-body ordering shared by all sinks
#[derive(Debug, Default)]
pub(crate) struct HeaderGuard {
    headers_sent: bool,
    body_started: bool,
}

impl HeaderGuard {
    /// Accept headers once, and only before any body byte
    pub(crate) fn accept_headers(&mut self, sink_name: &str) -> Result<(), ContractError> {
        if self.headers_sent || self.body_started {
            return Err(ContractError::headers_already_sent(sink_name));
        }
        self.headers_sent = true;
        Ok(())
    }

    pub(crate) fn mark_body(&mut self, len: usize) {
        if len > 0 {
            self.body_started = true;
        }
    }
}
