//! ExecutionResult - what the execution engine hands back
//!
//! Mirrors the engine's result counters plus the files produced as side effects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Kind of executable unit that produced the result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Yields a pass/fail result and optional files
    Job,
    /// Yields rows and optional files
    Transformation,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Job => f.write_str("job"),
            Self::Transformation => f.write_str("transformation"),
        }
    }
}

/// File artifact generated during execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducedFile {
    /// Resolvable location (path or `file://` URI)
    pub location: String,
    /// File name including extension (e.g. "report.csv")
    pub base_name: String,
    /// Extension without the dot, used for MIME inference
    #[serde(default)]
    pub extension: String,
}

impl ProducedFile {
    pub fn new(
        location: impl Into<String>,
        base_name: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            base_name: base_name.into(),
            extension: extension.into(),
        }
    }

    /// Derive base name and extension from a filesystem path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let base_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            location: path.to_string_lossy().into_owned(),
            base_name,
            extension,
        }
    }
}

/// Result of a completed job or transformation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Overall success flag (not used for output selection)
    pub success: bool,

    #[serde(default)]
    pub exit_status: i32,

    #[serde(default)]
    pub nr_errors: u64,

    #[serde(default)]
    pub lines_read: u64,

    #[serde(default)]
    pub lines_written: u64,

    #[serde(default)]
    pub lines_input: u64,

    #[serde(default)]
    pub lines_output: u64,

    #[serde(default)]
    pub lines_updated: u64,

    #[serde(default)]
    pub lines_rejected: u64,

    #[serde(default)]
    pub stopped: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_text: Option<String>,

    /// Files produced as a side effect, in engine order
    #[serde(default)]
    pub produced_files: Vec<ProducedFile>,
}

impl ExecutionResult {
    /// Successful result without files
    pub fn success() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// Failed result with the given error count
    pub fn failure(nr_errors: u64) -> Self {
        Self {
            success: false,
            exit_status: 1,
            nr_errors,
            ..Self::default()
        }
    }

    pub fn with_file(mut self, file: ProducedFile) -> Self {
        self.produced_files.push(file);
        self
    }

    pub fn file_count(&self) -> usize {
        self.produced_files.len()
    }
}
