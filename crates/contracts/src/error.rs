//! Layered error definitions
//!
//! Categorized by source: config / file / serialization / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Produced File Errors =====
    /// Produced file could not be opened
    #[error("cannot open produced file '{location}': {message}")]
    FileOpen { location: String, message: String },

    /// Produced file could not be read while streaming
    #[error("cannot read produced file '{location}': {message}")]
    FileRead { location: String, message: String },

    /// Files strategy selected but the result carries no files
    #[error("no produced files found in execution result")]
    NoProducedFiles,

    // ===== Serialization Errors =====
    /// Structured serializer rejected the value
    #[error("serialization error for {target}: {message}")]
    Serialization { target: String, message: String },

    /// Nothing to render for a scalar result
    #[error("empty result: {message}")]
    EmptyResult { message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Headers set twice or after the first byte
    #[error("sink '{sink_name}' headers already sent")]
    HeadersAlreadySent { sink_name: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create file open error
    pub fn file_open(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileOpen {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create file read error
    pub fn file_read(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileRead {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Create serialization error
    pub fn serialization(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialization {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create empty result error
    pub fn empty_result(message: impl Into<String>) -> Self {
        Self::EmptyResult {
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create headers-already-sent error
    pub fn headers_already_sent(sink_name: impl Into<String>) -> Self {
        Self::HeadersAlreadySent {
            sink_name: sink_name.into(),
        }
    }

    /// Whether this error comes from moving bytes (file or sink I/O)
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            Self::FileOpen { .. } | Self::FileRead { .. } | Self::SinkWrite { .. } | Self::Io(_)
        )
    }
}
