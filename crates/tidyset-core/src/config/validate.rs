//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::{Config, RESIZE_TARGETS};

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if self.pipeline.buffer_size == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.buffer_size must be > 0".into(),
            ));
        }
        if self.pipeline.retry_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.retry_attempts must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.max_alloc_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_alloc_mb must be > 0".into(),
            ));
        }
        if self.limits.oversize_envelope == 0 {
            return Err(ConfigError::ValidationError(
                "limits.oversize_envelope must be > 0".into(),
            ));
        }
        if let Some(size) = self.transform.resize {
            if !RESIZE_TARGETS.contains(&size) {
                return Err(ConfigError::ValidationError(format!(
                    "transform.resize must be one of {RESIZE_TARGETS:?}, got {size}"
                )));
            }
        }
        if self.transform.jpeg_quality == 0 || self.transform.jpeg_quality > 100 {
            return Err(ConfigError::ValidationError(
                "transform.jpeg_quality must be between 1 and 100".into(),
            ));
        }
        if self.sidecar.extension.is_empty() || self.sidecar.extension.contains('.') {
            return Err(ConfigError::ValidationError(
                "sidecar.extension must be a non-empty extension without a dot".into(),
            ));
        }
        if self.naming.numbering && self.naming.has_rules() {
            return Err(ConfigError::ValidationError(
                "naming.numbering cannot be combined with prefix, suffix or replace".into(),
            ));
        }
        Ok(())
    }
}
