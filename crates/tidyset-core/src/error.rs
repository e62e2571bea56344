//! Error types for the tidyset pipeline.
//!
//! Errors are organized by stage so every message carries the file it is
//! about. Per-file errors are collected by the orchestrator; only
//! [`PipelineError::BatchFailed`] and configuration errors end a run.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for tidyset operations.
#[derive(Error, Debug)]
pub enum TidysetError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// A single file that failed during a run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

impl std::fmt::Display for FileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The expected input file vanished mid-run
    #[error("Source file missing: {0}")]
    SourceMissing(PathBuf),

    /// Permission errors persisted through every retry
    #[error("Permission denied for {path} after {attempts} attempt(s)")]
    PermissionDenied { path: PathBuf, attempts: u32 },

    /// A rule-based rename target already exists
    #[error("Cannot rename {from}: target {target} already exists")]
    NameCollision { from: PathBuf, target: PathBuf },

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Image encoding failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Decoding would exceed the decompression safety limits
    #[error("Image too large: {path} ({message})")]
    ImageTooLarge { path: PathBuf, message: String },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// Filesystem error not covered by a more specific variant
    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required directory does not exist
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// A worker task panicked or was cancelled
    #[error("Worker failed: {0}")]
    Worker(String),

    /// One or more files failed during the parallel transform phase
    #[error("{} of {total} file(s) failed to process; nothing was renamed", failures.len())]
    BatchFailed {
        total: usize,
        failures: Vec<FileFailure>,
    },
}

impl PipelineError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience type alias for tidyset results.
pub type Result<T> = std::result::Result<T, TidysetError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_failed_message_counts_failures() {
        let err = PipelineError::BatchFailed {
            total: 5,
            failures: vec![
                FileFailure {
                    path: PathBuf::from("a.png"),
                    message: "bad header".into(),
                },
                FileFailure {
                    path: PathBuf::from("b.png"),
                    message: "truncated".into(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "2 of 5 file(s) failed to process; nothing was renamed"
        );
    }

    #[test]
    fn pipeline_error_converts_to_top_level() {
        let err: TidysetError = PipelineError::SourceMissing(PathBuf::from("gone.jpg")).into();
        assert!(err.to_string().contains("gone.jpg"));
    }
}
