use chrono::Local;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::pipeline::processing::format_rate;
use crate::types::{IncompleteRecord, RawRecord};

/// Whether a raw cell counts as missing: null, blank text, empty list or empty mapping
pub fn is_none_or_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Required fields that are absent or empty in `record`, in required-list order
pub fn missing_fields(record: &RawRecord, required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|field| record.get(field.as_str()).map_or(true, is_none_or_empty))
        .cloned()
        .collect()
}

/// Result of one completeness pass
#[derive(Debug, Clone, Default)]
pub struct CompletenessOutcome {
    pub complete: Vec<RawRecord>,
    pub incomplete: Vec<IncompleteRecord>,
    /// Field name to number of records missing it, in required-list order
    pub missing_field_stats: IndexMap<String, usize>,
}

impl CompletenessOutcome {
    pub fn total(&self) -> usize {
        self.complete.len() + self.incomplete.len()
    }

    pub fn report(&self, required: &[String]) -> CompletenessReport {
        let total = self.total();
        let missing_field_rates = self
            .missing_field_stats
            .iter()
            .map(|(field, count)| (field.clone(), format_rate(*count, total)))
            .collect();

        CompletenessReport {
            total,
            complete: self.complete.len(),
            incomplete: self.incomplete.len(),
            completeness_rate: format_rate(self.complete.len(), total),
            missing_field_stats: self.missing_field_stats.clone(),
            missing_field_rates,
            required_fields: required.to_vec(),
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Summary written next to the validated data
#[derive(Debug, Clone, Serialize)]
pub struct CompletenessReport {
    pub total: usize,
    pub complete: usize,
    pub incomplete: usize,
    pub completeness_rate: String,
    pub missing_field_stats: IndexMap<String, usize>,
    pub missing_field_rates: IndexMap<String, String>,
    pub required_fields: Vec<String>,
    pub generated_at: String,
}

impl std::fmt::Display for CompletenessReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "total: {}", self.total)?;
        writeln!(f, "complete: {}", self.complete)?;
        writeln!(f, "incomplete: {}", self.incomplete)?;
        writeln!(f, "completeness: {}", self.completeness_rate)?;
        for (field, count) in &self.missing_field_stats {
            let rate = self.missing_field_rates.get(field).map(String::as_str).unwrap_or("0%");
            writeln!(f, "  {}: {} ({})", field, count, rate)?;
        }
        Ok(())
    }
}

/// Split raw records into complete and incomplete sets.
///
/// Every input record lands in exactly one of the two sets.
#[instrument(skip_all, fields(records = records.len()))]
pub fn filter(records: Vec<RawRecord>, required: &[String]) -> CompletenessOutcome {
    let mut outcome = CompletenessOutcome::default();

    for (row_index, record) in records.into_iter().enumerate() {
        let missing = missing_fields(&record, required);
        if missing.is_empty() {
            outcome.complete.push(record);
            continue;
        }

        for field in &missing {
            *outcome.missing_field_stats.entry(field.clone()).or_insert(0) += 1;
        }
        outcome.incomplete.push(IncompleteRecord {
            record,
            missing_fields: missing,
            row_index,
        });
    }

    // Keep the stats in required-list order regardless of which field was seen first
    let position = |field: &String| required.iter().position(|r| r == field);
    outcome
        .missing_field_stats
        .sort_by(|a, _, b, _| position(a).cmp(&position(b)));

    info!(
        "Completeness check finished: {} complete, {} incomplete",
        outcome.complete.len(),
        outcome.incomplete.len()
    );
    metrics::counter!("quotation_records_complete_total").increment(outcome.complete.len() as u64);
    metrics::counter!("quotation_records_incomplete_total").increment(outcome.incomplete.len() as u64);

    outcome
}

/// True when no record is missing a required field
pub fn check_integrity(records: &[RawRecord], required: &[String]) -> bool {
    records.iter().all(|record| missing_fields(record, required).is_empty())
}
