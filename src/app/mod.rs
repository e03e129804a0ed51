// Use cases sequencing read -> engine -> write through the ports
pub mod clean_use_case;
pub mod dedupe_use_case;
pub mod ports;
pub mod validate_use_case;

pub use clean_use_case::{CleanRun, CleanUseCase};
pub use dedupe_use_case::DedupeUseCase;
pub use validate_use_case::{ValidateUseCase, ValidationRun};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Decode JSON values into records, skipping (and logging) values of the wrong shape
pub fn decode_records<T: DeserializeOwned>(values: Vec<Value>, source: &str) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("{}: skipping entry {}: {}", source, index, e);
                None
            }
        })
        .collect()
}

/// Output file suffix taken from an input name: the part after the last `_`
/// of the file stem, or `unknown`
pub fn batch_suffix(name: &str) -> String {
    let stem = std::path::Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.rsplit_once('_') {
        Some((_, suffix)) if !suffix.is_empty() => suffix.to_string(),
        _ => "unknown".to_string(),
    }
}
