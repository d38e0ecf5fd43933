//! WriterSink - streams the response body into any `io::Write`

use contracts::{ContractError, OutputSink};
use std::io::{self, Stdout, Write};
use std::sync::Arc;
use tracing::{error, info, instrument};

use super::{HeaderGuard, ResponseHeaders};
use crate::metrics::SinkMetrics;

/// Sink over an arbitrary writer; headers are reported through tracing
pub struct WriterSink<W: Write> {
    name: String,
    writer: W,
    headers: Option<ResponseHeaders>,
    guard: HeaderGuard,
    metrics: Arc<SinkMetrics>,
}

impl WriterSink<Stdout> {
    /// Sink writing to the process stdout
    pub fn stdout(name: impl Into<String>) -> Self {
        Self::new(name, io::stdout())
    }
}

impl<W: Write> WriterSink<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer,
            headers: None,
            guard: HeaderGuard::default(),
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    pub fn headers(&self) -> Option<&ResponseHeaders> {
        self.headers.as_ref()
    }

    /// Shared metrics
    pub fn metrics(&self) -> Arc<SinkMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for WriterSink<W> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "writer_sink_set_headers", skip(self), fields(sink = %self.name))]
    fn set_headers(
        &mut self,
        mime_type: &str,
        filename: Option<&str>,
    ) -> Result<(), ContractError> {
        self.guard.accept_headers(&self.name)?;
        info!(sink = %self.name, mime_type, filename, "Response headers");
        self.headers = Some(ResponseHeaders::new(mime_type, filename));
        self.metrics.mark_headers_set();
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), ContractError> {
        self.guard.mark_body(bytes.len());
        self.writer.write_all(bytes).map_err(|e| {
            self.metrics.inc_failure_count();
            error!(sink = %self.name, error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })?;
        self.metrics.record_write(bytes.len());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }
}
