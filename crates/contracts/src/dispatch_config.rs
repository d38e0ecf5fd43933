//! Dispatcher configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::ContractError;

/// Step whose rows are collected unless configured otherwise
pub const DEFAULT_OUTPUT_STEP_NAME: &str = "OUTPUT";

/// How the dispatcher picks an output strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Classify from files, kind and row count
    #[default]
    #[serde(alias = "infered")]
    Inferred,
    /// Always serialize the execution result
    ResultOnly,
    /// Always stream produced files
    ResultFiles,
    /// Always write the first cell as text
    SingleCell,
    /// Always serialize the row set
    Json,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inferred => "inferred",
            Self::ResultOnly => "result_only",
            Self::ResultFiles => "result_files",
            Self::SingleCell => "single_cell",
            Self::Json => "json",
        }
    }

    /// Whether rows from the output step must be collected in this mode
    pub fn needs_rows(&self) -> bool {
        !matches!(self, Self::ResultOnly | Self::ResultFiles)
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "inferred" | "infered" => Ok(Self::Inferred),
            "result_only" | "resultonly" => Ok(Self::ResultOnly),
            "result_files" | "resultfiles" => Ok(Self::ResultFiles),
            "single_cell" | "singlecell" => Ok(Self::SingleCell),
            "json" => Ok(Self::Json),
            other => Err(ContractError::config_validation(
                "output_mode",
                format!("unknown output mode '{other}'"),
            )),
        }
    }
}

/// Concrete output strategy chosen for one dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStrategy {
    /// Stream the produced file(s)
    Files,
    /// Serialize the whole execution result
    JobResult,
    /// Write a single cell as UTF-8 text
    ScalarCell,
    /// Serialize all rows
    RowSetJson,
}

impl OutputStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Files => "files",
            Self::JobResult => "job_result",
            Self::ScalarCell => "scalar_cell",
            Self::RowSetJson => "row_set_json",
        }
    }
}

impl fmt::Display for OutputStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispatcher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Output strategy selection
    #[serde(default)]
    pub output_mode: OutputMode,

    /// Step whose rows are collected
    #[serde(default = "default_output_step_name")]
    pub output_step_name: String,

    /// Caller asked for download semantics (suggested filename header)
    #[serde(default)]
    pub download_requested: bool,

    /// Pretty-print structured documents
    #[serde(default)]
    pub pretty_json: bool,

    /// Extension -> MIME type overrides
    #[serde(default)]
    pub mime_overrides: HashMap<String, String>,
}

fn default_output_step_name() -> String {
    DEFAULT_OUTPUT_STEP_NAME.to_string()
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            output_mode: OutputMode::default(),
            output_step_name: default_output_step_name(),
            download_requested: false,
            pretty_json: false,
            mime_overrides: HashMap::new(),
        }
    }
}

impl DispatcherConfig {
    /// Create config from request parameters
    ///
    /// Unknown or unparseable values fall back to defaults.
    pub fn from_params(params: &RequestParams) -> Self {
        let output_mode = params
            .get("output_mode")
            .and_then(|m| m.parse().ok())
            .unwrap_or_default();
        let output_step_name = params
            .get("step_name")
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(default_output_step_name);

        Self {
            output_mode,
            output_step_name,
            download_requested: params.download_requested(),
            ..Self::default()
        }
    }
}

/// Request parameters supplied by the hosting layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    values: HashMap<String, String>,
}

impl RequestParams {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Boolean parameter; only a case-insensitive "true" is true
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    /// The `download` flag, false when absent or unparseable
    pub fn download_requested(&self) -> bool {
        self.get_bool("download")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
