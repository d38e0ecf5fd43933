//! Dispatcher error types
//!
//! Only lifecycle misuse surfaces as an error; strategy failures are
//! reported through `DispatchOutcome`.

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Dispatch called a second time on the same instance
    #[error("dispatcher '{execution}' already dispatched")]
    AlreadyDispatched { execution: String },

    /// Dispatch called before the execution result was set
    #[error("dispatcher '{execution}' has no execution result")]
    ResultNotSet { execution: String },

    /// Execution result handed over twice
    #[error("dispatcher '{execution}' already has an execution result")]
    ResultAlreadySet { execution: String },
}

impl DispatcherError {
    pub fn already_dispatched(execution: impl Into<String>) -> Self {
        Self::AlreadyDispatched {
            execution: execution.into(),
        }
    }

    pub fn result_not_set(execution: impl Into<String>) -> Self {
        Self::ResultNotSet {
            execution: execution.into(),
        }
    }

    pub fn result_already_set(execution: impl Into<String>) -> Self {
        Self::ResultAlreadySet {
            execution: execution.into(),
        }
    }

    /// Lifecycle misuse by the caller
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::AlreadyDispatched { .. } | Self::ResultNotSet { .. } | Self::ResultAlreadySet { .. }
        )
    }
}
