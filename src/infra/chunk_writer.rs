use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};

use crate::app::ports::RecordSink;

/// Writes a record sequence as `{prefix}1.json`, `{prefix}2.json`, ...
pub struct ChunkWriter<'a> {
    sink: &'a dyn RecordSink,
    chunk_size: usize,
}

impl<'a> ChunkWriter<'a> {
    pub fn new(sink: &'a dyn RecordSink, chunk_size: usize) -> Self {
        Self {
            sink,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Returns the files actually written. A chunk that fails to write is
    /// logged and left out; empty input writes nothing.
    pub fn write<T: Serialize>(&self, prefix: &str, items: &[T]) -> Vec<PathBuf> {
        if items.is_empty() {
            info!("Nothing to write for '{}'", prefix);
            return Vec::new();
        }

        let mut written = Vec::new();
        for (index, chunk) in items.chunks(self.chunk_size).enumerate() {
            let name = format!("{}{}.json", prefix, index + 1);
            let result = serde_json::to_value(chunk)
                .map_err(anyhow::Error::from)
                .and_then(|document| self.sink.write_document(&name, &document));
            match result {
                Ok(path) => {
                    info!("Wrote {} records to {}", chunk.len(), path.display());
                    written.push(path);
                }
                Err(e) => error!("Failed to write {}: {:#}", name, e),
            }
        }
        written
    }
}
