//! Empty label files next to images.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::config::SidecarConfig;
use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone)]
pub struct SidecarWriter {
    extension: String,
}

impl SidecarWriter {
    pub fn new(config: &SidecarConfig) -> Self {
        Self {
            extension: config.extension.clone(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Label path for `image`: same stem, label extension.
    pub fn label_path(&self, image: &Path) -> PathBuf {
        image.with_extension(&self.extension)
    }

    /// Create an empty label for `image` unless one exists.
    ///
    /// Returns `true` when a file was created. An existing label is never
    /// touched.
    pub fn ensure_label_file(&self, image: &Path) -> PipelineResult<bool> {
        let label = self.label_path(image);
        match OpenOptions::new().write(true).create_new(true).open(&label) {
            Ok(_) => {
                tracing::debug!("Created label {:?}", label);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(PipelineError::io(label, e)),
        }
    }
}
