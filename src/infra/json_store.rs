use glob::{glob, Pattern};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::app::ports::{RecordSink, RecordSource, SourceBatch};
use crate::error::{CleanerError, Result};

/// Directory of JSON array files, used both as input and output
pub struct JsonRecordStore {
    dir: PathBuf,
    indent: usize,
}

impl JsonRecordStore {
    pub fn new(dir: impl Into<PathBuf>, indent: usize) -> Self {
        Self {
            dir: dir.into(),
            indent,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `*.json` files directly inside the directory, sorted by path
    pub fn list_files(&self) -> Result<Vec<PathBuf>> {
        let pattern = format!("{}/*.json", Pattern::escape(&self.dir.to_string_lossy()));
        debug!("Listing {}", pattern);

        let mut files: Vec<PathBuf> = glob(&pattern)?.filter_map(|entry| entry.ok()).collect();
        files.sort();
        Ok(files)
    }
}

impl RecordSource for JsonRecordStore {
    fn read_batches(&self) -> anyhow::Result<Vec<SourceBatch>> {
        let files = self.list_files()?;
        if files.is_empty() {
            info!("No JSON files found in {}", self.dir.display());
        }

        let mut batches = Vec::with_capacity(files.len());
        for path in files {
            match read_array(&path) {
                Ok(records) => {
                    debug!("Loaded {} records from {}", records.len(), path.display());
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    batches.push(SourceBatch { name, records });
                }
                Err(e) => error!("Skipping {}: {}", path.display(), e),
            }
        }
        Ok(batches)
    }
}

impl RecordSink for JsonRecordStore {
    fn write_document(&self, name: &str, document: &Value) -> anyhow::Result<PathBuf> {
        let path = self.dir.join(name);
        write_json(&path, document, self.indent)?;
        Ok(path)
    }
}

/// Read a file holding one JSON array
pub fn read_array(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&content)? {
        Value::Array(items) => Ok(items),
        _ => Err(CleanerError::InvalidInput {
            message: format!("{} does not contain a JSON array", path.display()),
        }),
    }
}

/// Write `value` as indented UTF-8 JSON, creating parent directories.
/// Non-ASCII text is written as is.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, indent: usize) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let indent = vec![b' '; indent];
    let mut writer = BufWriter::new(fs::File::create(path)?);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(&indent));
    value.serialize(&mut serializer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_write_keeps_non_ascii_and_indent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");

        write_json(&path, &json!([{"商品标题": "猫窝"}]), 2).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("猫窝"));
        assert!(text.contains("\n    \"商品标题\""));
    }

    #[test]
    fn test_batches_are_sorted_and_bad_files_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.json"), r#"[{"x": 2}]"#).unwrap();
        fs::write(dir.path().join("a.json"), r#"[{"x": 1}, {"x": 3}]"#).unwrap();
        fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        fs::write(dir.path().join("object.json"), r#"{"x": 1}"#).unwrap();
        fs::write(dir.path().join("notes.txt"), "[]").unwrap();

        let store = JsonRecordStore::new(dir.path(), 2);
        let batches = store.read_batches().unwrap();

        let names: Vec<&str> = batches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
        assert_eq!(batches[0].records.len(), 2);
    }

    #[test]
    fn test_sink_writes_into_directory() {
        let dir = tempdir().unwrap();
        let store = JsonRecordStore::new(dir.path().join("out"), 2);

        let path = store.write_document("report.json", &json!({"total": 1})).unwrap();
        assert_eq!(path, dir.path().join("out").join("report.json"));
        assert!(read_array(&path).is_err());
    }
}
