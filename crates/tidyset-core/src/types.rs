//! Core data types shared by the pipeline stages.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{FileFailure, PipelineError};

/// What a run does. Each mode is one arm of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Transform inputs into the output directory and rename them
    CopyOnly,
    /// As `CopyOnly`, then create an empty label file for every output
    CopyAndText,
    /// Only ensure label files for images already in the output directory
    TextOnly,
    /// Find and remove pixel-identical images in the output directory
    CheckDuplicates,
    /// Only rename images already in the output directory
    RenameOnly,
}

impl RunMode {
    /// Whether this mode runs the parallel transform stage.
    pub fn transforms(self) -> bool {
        matches!(self, RunMode::CopyOnly | RunMode::CopyAndText)
    }

    /// Whether renamed outputs get a label file.
    pub fn writes_sidecars(self) -> bool {
        matches!(self, RunMode::CopyAndText | RunMode::TextOnly)
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunMode::CopyOnly => "copy_only",
            RunMode::CopyAndText => "copy_and_text",
            RunMode::TextOnly => "text_only",
            RunMode::CheckDuplicates => "check_duplicates",
            RunMode::RenameOnly => "rename_only",
        };
        f.write_str(name)
    }
}

/// The directories and mode of one run.
#[derive(Debug, Clone)]
pub struct Job {
    /// Source tree (read recursively by the transform modes)
    pub input_dir: PathBuf,
    /// Destination directory; the working directory of every other mode
    pub output_dir: PathBuf,
    pub mode: RunMode,
}

/// A discovered input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub source_path: PathBuf,
    /// Position in the sorted discovery listing
    pub discovery_index: usize,
}

/// A transformed file waiting for the rename pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedFile {
    /// Where the worker wrote it
    pub output_path: PathBuf,
    /// Stem used for rule-based naming
    pub original_stem: String,
}

impl ProcessedFile {
    /// Current file name, used to order the rename pass.
    pub fn file_name(&self) -> String {
        self.output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Result of renaming one file.
#[derive(Debug)]
pub enum RenameOutcome {
    Renamed { from: PathBuf, to: PathBuf },
    /// The computed name equals the current one
    Skipped { path: PathBuf },
    Failed { path: PathBuf, error: PipelineError },
}

impl RenameOutcome {
    /// Path of the file after this outcome, if it still exists under a known name.
    pub fn final_path(&self) -> Option<&PathBuf> {
        match self {
            RenameOutcome::Renamed { to, .. } => Some(to),
            RenameOutcome::Skipped { path } => Some(path),
            RenameOutcome::Failed { .. } => None,
        }
    }
}

/// A rename recorded in the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedFile {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Images that share a fingerprint. The first path is the one kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintGroup {
    pub fingerprint: String,
    pub paths: Vec<PathBuf>,
}

impl FingerprintGroup {
    pub fn retained(&self) -> Option<&PathBuf> {
        self.paths.first()
    }

    pub fn redundant(&self) -> &[PathBuf] {
        self.paths.get(1..).unwrap_or(&[])
    }
}

/// Outcome of a duplicate removal pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DuplicateReport {
    /// Images listed for fingerprinting
    pub scanned: usize,
    pub groups: Vec<FingerprintGroup>,
    /// Files actually deleted
    pub removed: Vec<PathBuf>,
}

impl DuplicateReport {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: RunMode,

    /// Files found by discovery
    pub discovered: usize,

    /// Files written by the transform stage
    pub processed: usize,

    pub renamed: Vec<RenamedFile>,

    /// Files left under their current name
    pub skipped: Vec<PathBuf>,

    /// Per-file failures that did not stop the run
    pub errors: Vec<FileFailure>,

    pub sidecars_created: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicates: Option<DuplicateReport>,

    pub elapsed_seconds: f64,
}

impl RunReport {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            discovered: 0,
            processed: 0,
            renamed: Vec::new(),
            skipped: Vec::new(),
            errors: Vec::new(),
            sidecars_created: 0,
            duplicates: None,
            elapsed_seconds: 0.0,
        }
    }

    /// Fold one rename outcome into the report.
    pub fn record_rename(&mut self, outcome: &RenameOutcome) {
        match outcome {
            RenameOutcome::Renamed { from, to } => self.renamed.push(RenamedFile {
                from: from.clone(),
                to: to.clone(),
            }),
            RenameOutcome::Skipped { path } => self.skipped.push(path.clone()),
            RenameOutcome::Failed { path, error } => self.errors.push(FileFailure {
                path: path.clone(),
                message: error.to_string(),
            }),
        }
    }
}
