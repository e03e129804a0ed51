use anyhow::Result;
use serde_json::Value;
use std::path::PathBuf;

/// One unit of input, typically one JSON file
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub name: String,
    pub records: Vec<Value>,
}

/// Supplies record batches to a use case
pub trait RecordSource {
    /// All readable batches, in a stable order. Unreadable inputs are skipped.
    fn read_batches(&self) -> Result<Vec<SourceBatch>>;
}

/// Persists documents produced by a use case
pub trait RecordSink {
    /// Write `document` under `name` and return where it went
    fn write_document(&self, name: &str, document: &Value) -> Result<PathBuf>;
}
