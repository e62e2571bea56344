//! File discovery for finding images in directories.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;
use crate::types::WorkItem;

use super::naming::is_staging;

/// How far below the root discovery looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    /// The whole tree (transform modes)
    Recursive,
    /// Direct children only (text, dedup and rename modes)
    Shallow,
}

/// Discovers image files in directories.
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    config: ProcessingConfig,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// List supported image files under `root`, sorted by path.
    pub fn list(&self, root: &Path, depth: Depth) -> Vec<PathBuf> {
        let mut walker = WalkDir::new(root).follow_links(true).min_depth(1);
        if depth == Depth::Shallow {
            walker = walker.max_depth(1);
        }

        let mut files: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry under {:?}: {}", root, err);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && self.is_supported(entry.path()))
            .map(|entry| entry.into_path())
            .collect();

        // Sort by path for deterministic ordering
        files.sort();
        files
    }

    /// Like [`list`](Self::list), without files still under a staging name.
    pub fn list_settled(&self, root: &Path, depth: Depth) -> Vec<PathBuf> {
        let mut files = self.list(root, depth);
        files.retain(|path| !is_staging(path));
        files
    }

    /// Enumerate the work items of a run.
    pub fn discover(&self, root: &Path, depth: Depth) -> Vec<WorkItem> {
        self.list(root, depth)
            .into_iter()
            .enumerate()
            .map(|(discovery_index, source_path)| WorkItem {
                source_path,
                discovery_index,
            })
            .collect()
    }

    /// Check if a file has a supported extension.
    pub fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}
