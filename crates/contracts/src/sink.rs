//! OutputSink trait - Dispatcher output interface
//!
//! Defines the abstract byte destination the dispatcher writes to.

use crate::ContractError;

/// Byte-stream destination for a dispatched result
///
/// The header operation may happen at most once and only before the first
/// write. Implementations reject a violation with
/// [`ContractError::HeadersAlreadySent`].
pub trait OutputSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Announce MIME type and an optional suggested download filename
    ///
    /// # Errors
    /// Returns `HeadersAlreadySent` when called twice or after a write
    fn set_headers(&mut self, mime_type: &str, filename: Option<&str>)
        -> Result<(), ContractError>;

    /// Write raw bytes, in order
    ///
    /// # Errors
    /// Returns write error (should include context)
    fn write(&mut self, bytes: &[u8]) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    fn flush(&mut self) -> Result<(), ContractError>;
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn set_headers(
        &mut self,
        mime_type: &str,
        filename: Option<&str>,
    ) -> Result<(), ContractError> {
        (**self).set_headers(mime_type, filename)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), ContractError> {
        (**self).write(bytes)
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        (**self).flush()
    }
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn set_headers(
        &mut self,
        mime_type: &str,
        filename: Option<&str>,
    ) -> Result<(), ContractError> {
        (**self).set_headers(mime_type, filename)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), ContractError> {
        (**self).write(bytes)
    }

    fn flush(&mut self) -> Result<(), ContractError> {
        (**self).flush()
    }
}
