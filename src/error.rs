use thiserror::Error;

#[derive(Error, Debug)]
pub enum CleanerError {
    #[error("JSON (de)serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

pub type Result<T> = std::result::Result<T, CleanerError>;

/// Failure of a single field transform. Never fatal to the record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("field '{field}' has unsupported shape: {shape}")]
    UnsupportedShape { field: &'static str, shape: &'static str },

    #[error("field '{field}' is malformed: {reason}")]
    Malformed { field: &'static str, reason: String },
}

impl FieldError {
    pub fn field(&self) -> &'static str {
        match self {
            FieldError::UnsupportedShape { field, .. } => field,
            FieldError::Malformed { field, .. } => field,
        }
    }
}
