//! Duplicate detection by pixel fingerprint.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::types::{DuplicateReport, FingerprintGroup};

use super::discovery::{Depth, FileDiscovery};
use super::hash::Hasher;
use super::progress::ProgressTracker;
use super::sidecar::SidecarWriter;

/// Groups and removes pixel-identical images in one directory.
#[derive(Debug, Clone)]
pub struct DuplicateDetector {
    discovery: FileDiscovery,
    hasher: Hasher,
    sidecar: SidecarWriter,
}

impl DuplicateDetector {
    pub fn new(discovery: FileDiscovery, hasher: Hasher, sidecar: SidecarWriter) -> Self {
        Self {
            discovery,
            hasher,
            sidecar,
        }
    }

    /// Groups of two or more files sharing a fingerprint.
    ///
    /// Groups are ordered by first appearance in the sorted listing and
    /// their members keep listing order.
    pub fn find_duplicates(
        &self,
        dir: &Path,
        progress: &ProgressTracker,
    ) -> PipelineResult<Vec<FingerprintGroup>> {
        let files = self.list(dir)?;
        progress.set_total(files.len() as u64);
        Ok(self.group(&files, progress))
    }

    /// Delete every group member except the first, with its label file.
    ///
    /// Deletion is best effort: a file that cannot be removed is logged and
    /// left out of `removed`.
    pub fn remove_duplicates(
        &self,
        dir: &Path,
        progress: &ProgressTracker,
    ) -> PipelineResult<DuplicateReport> {
        let files = self.list(dir)?;
        progress.set_total(files.len() as u64 * 2);
        let groups = self.group(&files, progress);

        let mut removed = Vec::new();
        for group in &groups {
            for path in group.redundant() {
                progress.update(1, Some(&format!("Removing {}", display_name(path))));
                match std::fs::remove_file(path) {
                    Ok(()) => {
                        tracing::debug!("Removed duplicate {:?}", path);
                        removed.push(path.clone());
                    }
                    Err(e) => {
                        tracing::warn!("Could not remove duplicate {:?}: {}", path, e);
                        continue;
                    }
                }

                let label = self.sidecar.label_path(path);
                if label.exists() {
                    if let Err(e) = std::fs::remove_file(&label) {
                        tracing::warn!("Could not remove label {:?}: {}", label, e);
                    }
                }
            }
        }

        progress.complete(Some("Duplicate check finished"));
        tracing::info!(
            "Removed {} duplicate(s) across {} group(s)",
            removed.len(),
            groups.len()
        );
        Ok(DuplicateReport {
            scanned: files.len(),
            groups,
            removed,
        })
    }

    fn list(&self, dir: &Path) -> PipelineResult<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(PipelineError::DirectoryNotFound(dir.to_path_buf()));
        }
        Ok(self.discovery.list_settled(dir, Depth::Shallow))
    }

    fn group(&self, files: &[PathBuf], progress: &ProgressTracker) -> Vec<FingerprintGroup> {
        let mut groups: Vec<FingerprintGroup> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for path in files {
            progress.update(1, Some(&format!("Hashing {}", display_name(path))));
            let fingerprint = match self.hasher.fingerprint_file(path) {
                Ok(fp) => fp,
                Err(e) => {
                    tracing::warn!("Skipping {:?} in duplicate check: {}", path, e);
                    continue;
                }
            };
            match index.get(&fingerprint) {
                Some(&i) => groups[i].paths.push(path.clone()),
                None => {
                    index.insert(fingerprint.clone(), groups.len());
                    groups.push(FingerprintGroup {
                        fingerprint,
                        paths: vec![path.clone()],
                    });
                }
            }
        }

        groups.retain(|g| g.paths.len() > 1);
        groups
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
