//! Collaborator traits the dispatcher depends on
//!
//! MIME lookup, produced-file resolution and structured serialization.

use std::io::Read;

use crate::{ContractError, ExecutionResult, ProducedFile, RowSet};

/// Fallback MIME type for unknown extensions
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Maps a file extension to a MIME type
pub trait MimeLookup {
    /// Must return a safe default (octet-stream) for unknown extensions
    fn mime_type_for(&self, extension: &str) -> &str;
}

/// Opens produced files for streaming
pub trait FileResolver {
    /// Yield a readable byte stream for the descriptor
    ///
    /// # Errors
    /// Returns `FileOpen` when the location cannot be opened
    fn open(&self, file: &ProducedFile) -> Result<Box<dyn Read + '_>, ContractError>;
}

/// Encodes results into a structured document
///
/// Implementations must fail with [`ContractError::Serialization`] on content
/// they cannot encode instead of returning partial output.
pub trait StructuredSerializer {
    fn serialize_result(&self, result: &ExecutionResult) -> Result<Vec<u8>, ContractError>;

    fn serialize_rows(&self, rows: &RowSet) -> Result<Vec<u8>, ContractError>;
}
