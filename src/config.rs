use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_REQUIRED_FIELDS;
use crate::error::{CleanerError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const CONFIG_PATH_ENV: &str = "QUOTATION_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub required_fields: Vec<String>,
    pub output: OutputConfig,
    pub split: SplitConfig,
    pub dedupe: DedupeConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Indent width of written JSON files
    pub indent: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Records per part file when splitting the validated complete set
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DedupeConfig {
    /// Records per unique/duplicate output chunk
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: PathBuf,
    pub file_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub validated_dir: PathBuf,
    pub split_dir: PathBuf,
    pub cleaned_dir: PathBuf,
    pub cleaning_error_dir: PathBuf,
    pub unique_dir: PathBuf,
    pub duplicate_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            required_fields: DEFAULT_REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
            output: OutputConfig::default(),
            split: SplitConfig::default(),
            dedupe: DedupeConfig::default(),
            logging: LoggingConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self { chunk_size: 1000 }
    }
}

impl Default for DedupeConfig {
    fn default() -> Self {
        Self { chunk_size: 300 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: PathBuf::from("logs"),
            file_name: "quotation_cleaner.log".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let base = PathBuf::from("data").join("output");
        Self {
            validated_dir: base.join("step1_data_validator"),
            split_dir: base.join("step1_data_validator").join("split_data"),
            cleaned_dir: base.join("step2_cleandata").join("complete"),
            cleaning_error_dir: base.join("step2_cleandata").join("error"),
            unique_dir: base.join("step3_unique").join("complete"),
            duplicate_dir: base.join("step3_unique").join("duplicate"),
        }
    }
}

impl Config {
    /// Load from an explicit path, then `$QUOTATION_CONFIG`, then `config.toml`.
    /// A missing default file yields the built-in defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));

        match explicit {
            Some(path) => Self::from_file(&path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CleanerError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.required_fields.is_empty() {
            return Err(CleanerError::Config("required_fields must not be empty".to_string()));
        }
        if self.split.chunk_size == 0 || self.dedupe.chunk_size == 0 {
            return Err(CleanerError::Config("chunk sizes must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_constants() {
        let config = Config::default();
        assert_eq!(config.required_fields.len(), 10);
        assert_eq!(config.required_fields[0], "商品标题");
        assert_eq!(config.output.indent, 2);
        assert_eq!(config.split.chunk_size, 1000);
        assert_eq!(config.dedupe.chunk_size, 300);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            required_fields = ["商品标题", "价格"]

            [dedupe]
            chunk_size = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.required_fields, vec!["商品标题", "价格"]);
        assert_eq!(config.dedupe.chunk_size, 50);
        assert_eq!(config.split.chunk_size, 1000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let result = Config::from_toml_str("[split]\nchunk_size = 0\n");
        assert!(matches!(result, Err(CleanerError::Config(_))));
    }
}
