//! FileSink - writes the response body to disk with a headers sidecar

use contracts::{ContractError, OutputSink};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, instrument};

use super::{HeaderGuard, ResponseHeaders};
use crate::metrics::SinkMetrics;

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output body path
    pub path: PathBuf,
    /// Write announced headers to `<path>.headers.json`
    pub write_headers: bool,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output.bin"));
        let write_headers = params
            .get("write_headers")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(true);

        Self {
            path,
            write_headers,
        }
    }

    /// Sidecar path holding the headers document
    pub fn headers_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".headers.json");
        PathBuf::from(name)
    }
}

/// Sink that writes the dispatched body to a file
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writer: BufWriter<File>,
    guard: HeaderGuard,
    metrics: Arc<SinkMetrics>,
}

impl FileSink {
    /// Create a new FileSink, truncating any existing body file
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(&config.path)?);
        if config.write_headers {
            // Headers from an earlier body must not describe this one
            let headers_path = config.headers_path();
            match fs::remove_file(&headers_path) {
                Ok(()) => debug!(path = %headers_path.display(), "Stale headers removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }

        Ok(Self {
            name: name.into(),
            config,
            writer,
            guard: HeaderGuard::default(),
            metrics: Arc::new(SinkMetrics::new()),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params);
        Self::new(name, config)
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Shared metrics
    pub fn metrics(&self) -> Arc<SinkMetrics> {
        Arc::clone(&self.metrics)
    }

    fn write_headers_file(&self, headers: &ResponseHeaders) -> std::io::Result<()> {
        let file = File::create(self.config.headers_path())?;
        serde_json::to_writer_pretty(file, headers)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    fn io_error(&self, e: std::io::Error) -> ContractError {
        self.metrics.inc_failure_count();
        error!(sink = %self.name, path = %self.config.path.display(), error = %e, "Write failed");
        ContractError::sink_write(&self.name, e.to_string())
    }
}

impl OutputSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "file_sink_set_headers", skip(self), fields(sink = %self.name))]
    fn set_headers(
        &mut self,
        mime_type: &str,
        filename: Option<&str>,
    ) -> Result<(), ContractError> {
        self.guard.accept_headers(&self.name)?;
        self.metrics.mark_headers_set();
        if self.config.write_headers {
            let headers = ResponseHeaders::new(mime_type, filename);
            self.write_headers_file(&headers)
                .map_err(|e| self.io_error(e))?;
        }
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), ContractError> {
        self.guard.mark_body(bytes.len());
        if let Err(e) = self.writer.write_all(bytes) {
            return Err(self.io_error(e));
        }
        self.metrics.record_write(bytes.len());
        Ok(())
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    fn flush(&mut self) -> Result<(), ContractError> {
        if let Err(e) = self.writer.flush() {
            return Err(self.io_error(e));
        }
        debug!(sink = %self.name, bytes = self.metrics.bytes_written(), "FileSink flushed");
        Ok(())
    }
}
