use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::json_store::{read_array, write_json};
use crate::error::{CleanerError, Result};

/// How a record count divides into fixed-size files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitInfo {
    pub total_count: usize,
    pub chunk_size: usize,
    pub total_files: usize,
    pub last_file_size: usize,
}

impl SplitInfo {
    pub fn new(total_count: usize, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let remainder = total_count % chunk_size;
        Self {
            total_count,
            chunk_size,
            total_files: total_count.div_ceil(chunk_size),
            last_file_size: if remainder == 0 { chunk_size } else { remainder },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitResult {
    pub input_file: PathBuf,
    pub output_dir: PathBuf,
    pub total_data_count: usize,
    pub chunk_size: usize,
    pub split_files: Vec<PathBuf>,
}

impl std::fmt::Display for SplitResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "input: {}", self.input_file.display())?;
        writeln!(f, "output: {}", self.output_dir.display())?;
        writeln!(f, "records: {}", self.total_data_count)?;
        writeln!(f, "chunk size: {}", self.chunk_size)?;
        write!(f, "files: {}", self.split_files.len())
    }
}

/// `{stem}_part_{NN}.json`, the part number padded to the width of `total_parts`
pub fn split_filename(stem: &str, part: usize, total_parts: usize) -> String {
    let width = total_parts.to_string().len();
    format!("{}_part_{:0width$}.json", stem, part, width = width)
}

/// Default destination: a `split_data` directory next to the input's directory
pub fn default_split_dir(input: &Path) -> PathBuf {
    input
        .parent()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new("."))
        .join("split_data")
}

/// Split one JSON array file into parts of at most `chunk_size` records
pub fn split_json_file(
    input: &Path,
    output_dir: Option<&Path>,
    chunk_size: usize,
    indent: usize,
) -> Result<SplitResult> {
    if !input.exists() {
        return Err(CleanerError::InvalidInput {
            message: format!("input file does not exist: {}", input.display()),
        });
    }
    let records = read_array(input)?;
    let info = SplitInfo::new(records.len(), chunk_size);
    let output_dir = output_dir.map(Path::to_path_buf).unwrap_or_else(|| default_split_dir(input));
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data".to_string());

    debug!(
        "Splitting {} records from {} into {} files",
        info.total_count,
        input.display(),
        info.total_files
    );

    let mut split_files = Vec::with_capacity(info.total_files);
    for (index, chunk) in records.chunks(info.chunk_size).enumerate() {
        let path = output_dir.join(split_filename(&stem, index + 1, info.total_files));
        write_json(&path, chunk, indent)?;
        split_files.push(path);
    }

    info!("Split {} into {} files", input.display(), split_files.len());
    Ok(SplitResult {
        input_file: input.to_path_buf(),
        output_dir,
        total_data_count: info.total_count,
        chunk_size: info.chunk_size,
        split_files,
    })
}
