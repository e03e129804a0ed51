use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::app::decode_records;
use crate::app::ports::{RecordSink, RecordSource};
use crate::infra::ChunkWriter;
use crate::pipeline::processing::dedupe::{self, ResolutionSummary};
use crate::types::ProductRecord;

pub const UNIQUE_PREFIX: &str = "unique_data_";
pub const DUPLICATE_PREFIX: &str = "duplicate_data_";

/// Use case for resolving duplicates across every cleaned batch
pub struct DedupeUseCase {
    source: Box<dyn RecordSource>,
    unique_output: Box<dyn RecordSink>,
    duplicate_output: Box<dyn RecordSink>,
    chunk_size: usize,
}

impl DedupeUseCase {
    pub fn new(
        source: Box<dyn RecordSource>,
        unique_output: Box<dyn RecordSink>,
        duplicate_output: Box<dyn RecordSink>,
        chunk_size: usize,
    ) -> Self {
        Self {
            source,
            unique_output,
            duplicate_output,
            chunk_size,
        }
    }

    /// Concatenate all batches, resolve, and write both sets in chunks
    #[instrument(skip_all)]
    pub fn run(&self) -> Result<ResolutionSummary> {
        let batches = self.source.read_batches().context("reading dedupe input")?;
        let total_files = batches.len();

        let mut records: Vec<ProductRecord> = Vec::new();
        let mut total_products = 0;
        for batch in batches {
            total_products += batch.records.len();
            records.extend(decode_records::<ProductRecord>(batch.records, &batch.name));
        }
        let undecodable_count = total_products - records.len();
        if undecodable_count > 0 {
            warn!("{} entries could not be read as products", undecodable_count);
        }
        info!("Loaded {} products from {} files", records.len(), total_files);

        let outcome = dedupe::resolve(records);

        let unique_files =
            ChunkWriter::new(self.unique_output.as_ref(), self.chunk_size).write(UNIQUE_PREFIX, &outcome.unique);
        let duplicate_files = ChunkWriter::new(self.duplicate_output.as_ref(), self.chunk_size)
            .write(DUPLICATE_PREFIX, &outcome.duplicates_flattened());

        let summary = ResolutionSummary {
            unique_files: unique_files.len(),
            duplicate_files: duplicate_files.len(),
            undecodable_count,
            ..ResolutionSummary::from_outcome(&outcome, total_files, total_products)
        };
        info!(
            "Dedupe finished: {} unique in {} files, {} duplicate in {} files",
            summary.unique_products, summary.unique_files, summary.duplicate_products, summary.duplicate_files
        );
        Ok(summary)
    }
}
