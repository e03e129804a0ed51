use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, instrument, warn};

use crate::app::ports::{RecordSink, RecordSource};
use crate::app::{batch_suffix, decode_records};
use crate::pipeline::processing::normalize::{self, CleaningReport, FieldNormalizer, Normalizer};
use crate::types::RawRecord;

/// Totals of one cleaning run over every input batch
#[derive(Debug, Clone, Default)]
pub struct CleanRun {
    pub files_processed: usize,
    pub cleaned: usize,
    pub failed: usize,
    pub cleaned_files: Vec<PathBuf>,
    pub error_files: Vec<PathBuf>,
}

impl CleanRun {
    pub fn report(&self) -> CleaningReport {
        CleaningReport::from_counts(self.cleaned, self.failed)
    }
}

/// Use case for normalizing validated rows batch by batch
pub struct CleanUseCase {
    normalizer: Box<dyn Normalizer>,
    source: Box<dyn RecordSource>,
    cleaned_output: Box<dyn RecordSink>,
    error_output: Box<dyn RecordSink>,
}

impl CleanUseCase {
    pub fn new(
        normalizer: Box<dyn Normalizer>,
        source: Box<dyn RecordSource>,
        cleaned_output: Box<dyn RecordSink>,
        error_output: Box<dyn RecordSink>,
    ) -> Self {
        Self {
            normalizer,
            source,
            cleaned_output,
            error_output,
        }
    }

    /// Create a use case with every column transform registered
    pub fn with_default_normalizer(
        source: Box<dyn RecordSource>,
        cleaned_output: Box<dyn RecordSink>,
        error_output: Box<dyn RecordSink>,
    ) -> Self {
        Self::new(Box::new(FieldNormalizer::default()), source, cleaned_output, error_output)
    }

    /// Clean every batch. Each batch writes `cleaned_data_{suffix}.json` and,
    /// when something failed, `cleaning_errors_{suffix}.json`.
    #[instrument(skip_all)]
    pub fn run(&self) -> Result<CleanRun> {
        let batches = self.source.read_batches().context("reading cleaning input")?;
        let mut run = CleanRun::default();

        for batch in batches {
            if batch.records.is_empty() {
                warn!("{} is empty, skipped", batch.name);
                continue;
            }
            let records: Vec<RawRecord> = decode_records(batch.records, &batch.name);
            info!("Cleaning {} ({} records)", batch.name, records.len());

            let outcome = normalize::clean(self.normalizer.as_ref(), &records);
            let suffix = batch_suffix(&batch.name);

            let name = format!("cleaned_data_{}.json", suffix);
            let path = self
                .cleaned_output
                .write_document(&name, &serde_json::to_value(&outcome.cleaned)?)
                .with_context(|| format!("writing {}", name))?;
            run.cleaned_files.push(path);

            if !outcome.errors.is_empty() {
                let name = format!("cleaning_errors_{}.json", suffix);
                let path = self
                    .error_output
                    .write_document(&name, &serde_json::to_value(&outcome.errors)?)
                    .with_context(|| format!("writing {}", name))?;
                run.error_files.push(path);
            }

            info!("{}: {}", batch.name, outcome.report());
            run.files_processed += 1;
            run.cleaned += outcome.success_count();
            run.failed += outcome.error_count();
        }

        info!("Cleaning run finished: {}", run.report());
        Ok(run)
    }
}
