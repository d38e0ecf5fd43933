//! JsonSerializer - structured serialization via serde_json

use contracts::{ContractError, ExecutionResult, RowSet, StructuredSerializer};
use serde::Serialize;

/// JSON document serializer (compact or pretty)
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn compact() -> Self {
        Self::new(false)
    }

    pub fn pretty() -> Self {
        Self::new(true)
    }

    /// Encode fully into a buffer so nothing partial ever reaches a sink
    fn encode<T: Serialize + ?Sized>(&self, target: &str, value: &T) -> Result<Vec<u8>, ContractError> {
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };
        encoded.map_err(|e| ContractError::serialization(target, e.to_string()))
    }
}

impl StructuredSerializer for JsonSerializer {
    fn serialize_result(&self, result: &ExecutionResult) -> Result<Vec<u8>, ContractError> {
        self.encode("execution result", result)
    }

    fn serialize_rows(&self, rows: &RowSet) -> Result<Vec<u8>, ContractError> {
        self.encode("row set", rows)
    }
}
