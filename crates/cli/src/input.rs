//! Execution record input format.

use anyhow::{Context, Result};
use contracts::{ExecutionResult, JobKind, Row, RowSchema};
use serde::Deserialize;
use std::path::Path;

/// A finished execution as read from disk
///
/// ```json
/// {
///   "kind": "transformation",
///   "result": { "success": true },
///   "fields": ["count"],
///   "rows": [[42]]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionRecord {
    pub kind: JobKind,

    #[serde(default = "ExecutionResult::success")]
    pub result: ExecutionResult,

    /// Field names shared by every row
    #[serde(default)]
    pub fields: Vec<String>,

    #[serde(default)]
    pub rows: Vec<Row>,

    /// Step that emitted the rows; the configured output step when absent
    #[serde(default)]
    pub step: Option<String>,
}

impl ExecutionRecord {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read execution record {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid execution record {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Schema for a row, inferred from the declared field names
    pub fn schema_for(&self, row: &[contracts::CellValue]) -> RowSchema {
        let names: Vec<&str> = self.fields.iter().map(String::as_str).collect();
        RowSchema::infer(&names, row)
    }
}
