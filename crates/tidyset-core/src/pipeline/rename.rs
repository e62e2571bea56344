//! The serialized rename pass.
//!
//! A move is a copy followed by a delete of the original. A failed delete
//! leaves an extra file behind but still counts as a successful rename.

use std::io;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::types::{ProcessedFile, RenameOutcome};

use super::naming::{free_stem, is_staging, staging_name, NameAllocator, RuleSet};
use super::retry::RetryPolicy;

/// Filesystem operations used by the rename pass.
pub trait FileOps {
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn remove(&self, path: &Path) -> io::Result<()>;
    fn exists(&self, path: &Path) -> bool;
}

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileOps for LocalFs {
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::copy(from, to).map(|_| ())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Moves files to their final names, one at a time.
#[derive(Debug, Clone)]
pub struct Renamer<F: FileOps = LocalFs> {
    ops: F,
    retry: RetryPolicy,
    /// Extension of label files that travel with their image
    sidecar_extension: Option<String>,
}

impl Renamer<LocalFs> {
    pub fn new(retry: RetryPolicy) -> Self {
        Self::with_ops(LocalFs, retry)
    }
}

impl<F: FileOps> Renamer<F> {
    pub fn with_ops(ops: F, retry: RetryPolicy) -> Self {
        Self {
            ops,
            retry,
            sidecar_extension: None,
        }
    }

    /// Move a same-stem label file along with each renamed image.
    pub fn carry_sidecars(mut self, extension: impl Into<String>) -> Self {
        self.sidecar_extension = Some(extension.into());
        self
    }

    /// Copy `from` to `to`, then delete `from`.
    ///
    /// Permission errors on the copy are retried with a fixed delay. A
    /// missing source is never retried.
    pub fn move_file(&self, from: &Path, to: &Path) -> PipelineResult<()> {
        let mut attempt = 1;
        loop {
            match self.ops.copy(from, to) {
                Ok(()) => break,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Err(PipelineError::SourceMissing(from.to_path_buf()));
                }
                Err(e) if self.retry.should_retry(attempt, e.kind()) => {
                    tracing::warn!(
                        "Copy {:?} -> {:?} failed (attempt {}/{}): {}",
                        from,
                        to,
                        attempt,
                        self.retry.max_attempts,
                        e
                    );
                    std::thread::sleep(self.retry.backoff);
                    attempt += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    return Err(PipelineError::PermissionDenied {
                        path: from.to_path_buf(),
                        attempts: attempt,
                    });
                }
                Err(e) => return Err(PipelineError::io(from, e)),
            }
        }

        if let Err(e) = self.ops.remove(from) {
            tracing::warn!("Copied {:?} but could not delete it: {}", from, e);
        }
        Ok(())
    }

    /// Number `files` in name order, each taking the smallest free number.
    /// A path listed twice is numbered once.
    ///
    /// Per-file failures become [`RenameOutcome::Failed`]; a vanished source
    /// aborts the pass.
    pub fn rename_sequential(
        &self,
        mut files: Vec<ProcessedFile>,
        dir: &Path,
        start: u64,
    ) -> PipelineResult<Vec<RenameOutcome>> {
        files.sort_by(|a, b| {
            a.file_name()
                .cmp(&b.file_name())
                .then_with(|| a.output_path.cmp(&b.output_path))
        });
        files.dedup_by(|a, b| a.output_path == b.output_path);
        let allocator = NameAllocator::new(start);

        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            let number = allocator.next_available(dir)?;
            let target = dir.join(with_extension_of(&number.to_string(), &file.output_path));
            outcomes.push(self.finish(file, target)?);
        }
        Ok(outcomes)
    }

    /// Apply `rules` to each file's current stem.
    ///
    /// An unchanged stem is skipped. An existing target is a collision and
    /// is never overwritten.
    pub fn rename_by_rules(
        &self,
        mut files: Vec<ProcessedFile>,
        rules: &RuleSet,
    ) -> PipelineResult<Vec<RenameOutcome>> {
        files.sort_by_key(|f| f.file_name());

        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            let stem = file_stem(&file.output_path);
            let new_stem = rules.apply(&stem);
            if new_stem == stem {
                tracing::debug!("Skipping {:?}: name unchanged", file.output_path);
                outcomes.push(RenameOutcome::Skipped {
                    path: file.output_path,
                });
                continue;
            }

            let target = file
                .output_path
                .with_file_name(with_extension_of(&new_stem, &file.output_path));
            if self.ops.exists(&target) {
                let error = PipelineError::NameCollision {
                    from: file.output_path.clone(),
                    target,
                };
                tracing::error!("{}", error);
                outcomes.push(RenameOutcome::Failed {
                    path: file.output_path,
                    error,
                });
                continue;
            }
            outcomes.push(self.finish(file, target)?);
        }
        Ok(outcomes)
    }

    /// Move existing files to staging names so they can be renumbered.
    ///
    /// Files that already carry a staging name are left where they are. A
    /// staging name that is taken, for the image or its label, gets a
    /// `_2`, `_3`, ... suffix.
    pub fn stage_in_place(&self, paths: &[PathBuf]) -> PipelineResult<Vec<RenameOutcome>> {
        let mut outcomes = Vec::with_capacity(paths.len());
        for path in paths {
            if is_staging(path) {
                outcomes.push(RenameOutcome::Skipped { path: path.clone() });
                continue;
            }
            let extension = path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            let staged = |stem: &str| path.with_file_name(staging_name(stem, &extension));
            let stem = free_stem(&file_stem(path), |candidate| {
                let target = staged(candidate);
                self.ops.exists(&target) || self.blocked_label(path, &target).is_some()
            });
            let target = staged(&stem);
            let file = ProcessedFile {
                output_path: path.clone(),
                original_stem: file_stem(path),
            };
            outcomes.push(self.finish(file, target)?);
        }
        Ok(outcomes)
    }

    // Move one file and its label, folding the result into an outcome.
    fn finish(&self, file: ProcessedFile, target: PathBuf) -> PipelineResult<RenameOutcome> {
        if let Some((label, label_target)) = self.blocked_label(&file.output_path, &target) {
            let error = PipelineError::NameCollision {
                from: label,
                target: label_target,
            };
            tracing::error!("{}", error);
            return Ok(RenameOutcome::Failed {
                path: file.output_path,
                error,
            });
        }

        match self.move_file(&file.output_path, &target) {
            Ok(()) => {
                tracing::debug!(
                    "Renamed {:?} -> {:?} (originally {})",
                    file.output_path,
                    target,
                    file.original_stem
                );
                self.move_sidecar(&file.output_path, &target);
                Ok(RenameOutcome::Renamed {
                    from: file.output_path,
                    to: target,
                })
            }
            Err(e @ PipelineError::SourceMissing(_)) => Err(e),
            Err(error) => {
                tracing::error!("Failed to rename {:?}: {}", file.output_path, error);
                Ok(RenameOutcome::Failed {
                    path: file.output_path,
                    error,
                })
            }
        }
    }

    // The label of `from` and its destination, when that destination is taken.
    fn blocked_label(&self, from: &Path, to: &Path) -> Option<(PathBuf, PathBuf)> {
        let extension = self.sidecar_extension.as_deref()?;
        let label = from.with_extension(extension);
        if label == from || !self.ops.exists(&label) {
            return None;
        }
        let target = to.with_extension(extension);
        self.ops.exists(&target).then_some((label, target))
    }

    fn move_sidecar(&self, from: &Path, to: &Path) {
        let Some(extension) = &self.sidecar_extension else {
            return;
        };
        let label = from.with_extension(extension);
        if label == from || !self.ops.exists(&label) {
            return;
        }
        if let Err(e) = self.move_file(&label, &to.with_extension(extension)) {
            tracing::warn!("Label {:?} did not follow its image: {}", label, e);
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn with_extension_of(stem: &str, path: &Path) -> String {
    match path.extension() {
        Some(ext) => format!("{}.{}", stem, ext.to_string_lossy()),
        None => stem.to_string(),
    }
}
