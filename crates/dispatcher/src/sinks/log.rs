//! LogSink - logs response summary via tracing, discards the body

use contracts::{ContractError, OutputSink};
use tracing::{debug, info, instrument};

use super::{HeaderGuard, ResponseHeaders};

/// Sink that logs what would have been sent, for debugging
pub struct LogSink {
    name: String,
    headers: Option<ResponseHeaders>,
    guard: HeaderGuard,
    bytes: u64,
    writes: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            headers: None,
            guard: HeaderGuard::default(),
            bytes: 0,
            writes: 0,
        }
    }

    pub fn bytes_seen(&self) -> u64 {
        self.bytes
    }

    fn log_summary(&self) {
        info!(
            sink = %self.name,
            mime_type = self.headers.as_ref().map(|h| h.mime_type.as_str()),
            filename = self.headers.as_ref().and_then(|h| h.filename.as_deref()),
            writes = self.writes,
            bytes = self.bytes,
            "Response summary"
        );
    }
}

impl OutputSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_headers(
        &mut self,
        mime_type: &str,
        filename: Option<&str>,
    ) -> Result<(), ContractError> {
        self.guard.accept_headers(&self.name)?;
        self.headers = Some(ResponseHeaders::new(mime_type, filename));
        Ok(())
    }

    #[instrument(name = "log_sink_write", skip(self, bytes), fields(sink = %self.name, len = bytes.len()))]
    fn write(&mut self, bytes: &[u8]) -> Result<(), ContractError> {
        self.guard.mark_body(bytes.len());
        self.writes += 1;
        self.bytes += bytes.len() as u64;
        debug!(sink = %self.name, len = bytes.len(), "Chunk received");
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    fn flush(&mut self) -> Result<(), ContractError> {
        self.log_summary();
        Ok(())
    }
}
