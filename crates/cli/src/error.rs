//! Error types for CLI operations.

use contracts::OutputStrategy;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Dispatcher accepted the request but wrote nothing usable
    #[error("Dispatch {status} for strategy {strategy}: {message}")]
    DispatchFailed {
        strategy: OutputStrategy,
        status: &'static str,
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn dispatch_failed(
        strategy: OutputStrategy,
        status: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::DispatchFailed {
            strategy,
            status,
            message: message.into(),
        }
    }
}
