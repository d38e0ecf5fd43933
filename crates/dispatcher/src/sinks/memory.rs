//! MemorySink - buffers the dispatched response in memory

use std::sync::Arc;

use contracts::{ContractError, OutputSink};
use tracing::{debug, instrument};

use super::{HeaderGuard, ResponseHeaders};
use crate::metrics::SinkMetrics;

/// Sink that keeps headers and body in memory
#[derive(Debug)]
pub struct MemorySink {
    name: String,
    headers: Option<ResponseHeaders>,
    body: Vec<u8>,
    guard: HeaderGuard,
    metrics: Arc<SinkMetrics>,
}

impl MemorySink {
    /// Create a new MemorySink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            headers: None,
            body: Vec::new(),
            guard: HeaderGuard::default(),
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    pub fn headers(&self) -> Option<&ResponseHeaders> {
        self.headers.as_ref()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as UTF-8 text (lossy)
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn into_parts(self) -> (Option<ResponseHeaders>, Vec<u8>) {
        (self.headers, self.body)
    }

    /// Shared metrics
    pub fn metrics(&self) -> Arc<SinkMetrics> {
        Arc::clone(&self.metrics)
    }
}

impl OutputSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "memory_sink_set_headers", skip(self), fields(sink = %self.name))]
    fn set_headers(
        &mut self,
        mime_type: &str,
        filename: Option<&str>,
    ) -> Result<(), ContractError> {
        self.guard.accept_headers(&self.name)?;
        self.headers = Some(ResponseHeaders::new(mime_type, filename));
        self.metrics.mark_headers_set();
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), ContractError> {
        self.guard.mark_body(bytes.len());
        self.body.extend_from_slice(bytes);
        self.metrics.record_write(bytes.len());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, bytes = self.body.len(), "MemorySink flushed");
        Ok(())
    }
}
