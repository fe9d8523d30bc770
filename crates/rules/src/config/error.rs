//! Error types and load result structures for engine documents.

use std::path::PathBuf;

/// Errors that can occur while loading or validating engine documents.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Semantically invalid values (inverted thresholds, bad cooldowns...).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Document declares a `kind` this engine does not understand.
    #[error("Unknown document kind: {0}")]
    UnknownKind(String),
}

/// Result alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Outcome of loading a single document file.
#[derive(Debug)]
pub struct LoadResult {
    pub path: PathBuf,
    pub status: LoadStatus,
}

/// Status of a single file load attempt.
#[derive(Debug, PartialEq)]
pub enum LoadStatus {
    Loaded { id: String, kind: String },
    Skipped { reason: String },
    Failed { error: String },
}
