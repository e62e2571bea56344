//! Batch orchestrator.
//!
//! A transform run moves through
//! `Discovering -> Transforming -> Barrier -> Renaming -> SidecarGeneration -> Done`.
//! Only `Transforming` is parallel: a fixed pool of workers drains a bounded
//! queue and writes each output under a unique staging path. Every other
//! phase runs on one thread, so number allocation and duplicate grouping
//! are deterministic.
//!
//! Duplicate checks, label-only and rename-only runs skip the transform
//! phase but share the progress tracker and the rename pass.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{Config, PipelineConfig};
use crate::error::{ConfigError, FileFailure, PipelineError, PipelineResult, Result};
use crate::types::{
    FingerprintGroup, Job, ProcessedFile, RenameOutcome, RunMode, RunReport, WorkItem,
};

use super::channel::{bounded_channel, next_item, share};
use super::decode::ImageDecoder;
use super::dedup::DuplicateDetector;
use super::discovery::{Depth, FileDiscovery};
use super::hash::Hasher;
use super::naming::{free_stem, is_staging, staging_name, NamingPolicy};
use super::progress::ProgressTracker;
use super::rename::Renamer;
use super::retry::RetryPolicy;
use super::sidecar::SidecarWriter;
use super::transform::ImageTransformer;

/// Phases of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Discovering,
    Transforming,
    Barrier,
    Renaming,
    SidecarGeneration,
    DuplicateCheck,
    Done,
    Failed,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunState::Discovering => "Discovering",
            RunState::Transforming => "Transforming",
            RunState::Barrier => "Waiting for workers",
            RunState::Renaming => "Renaming",
            RunState::SidecarGeneration => "Creating label files",
            RunState::DuplicateCheck => "Checking duplicates",
            RunState::Done => "Done",
            RunState::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// A work item paired with the path its worker writes to.
type Assignment = (WorkItem, PathBuf);

/// Per-worker results, merged at the barrier.
type WorkerOutput = (Vec<ProcessedFile>, Vec<FileFailure>);

/// Runs one [`Job`] to completion.
pub struct BatchPipeline {
    job: Job,
    workers: usize,
    pipeline: PipelineConfig,
    discovery: FileDiscovery,
    transformer: Arc<ImageTransformer>,
    detector: DuplicateDetector,
    sidecar: SidecarWriter,
    policy: NamingPolicy,
    renamer: Renamer,
    progress: Arc<ProgressTracker>,
}

impl BatchPipeline {
    /// Validate `config` and build every stage for `job`.
    pub fn new(config: &Config, job: Job) -> Result<Self> {
        config.validate()?;
        let policy = NamingPolicy::from_config(&config.naming)?;

        let discovery = FileDiscovery::new(config.processing.clone());
        let decoder = ImageDecoder::new(config.limits.clone());
        let sidecar = SidecarWriter::new(&config.sidecar);
        let renamer = Renamer::new(RetryPolicy::from_config(&config.pipeline))
            .carry_sidecars(sidecar.extension());

        Ok(Self {
            workers: config.processing.parallel_workers,
            pipeline: config.pipeline.clone(),
            transformer: Arc::new(ImageTransformer::new(&config.transform, decoder.clone())),
            detector: DuplicateDetector::new(
                discovery.clone(),
                Hasher::new(decoder),
                sidecar.clone(),
            ),
            discovery,
            sidecar,
            policy,
            renamer,
            progress: Arc::new(ProgressTracker::default()),
            job,
        })
    }

    /// Shared progress, for an optional display poller.
    pub fn progress(&self) -> Arc<ProgressTracker> {
        Arc::clone(&self.progress)
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Execute the job.
    ///
    /// A transform run in which any file fails ends with
    /// [`PipelineError::BatchFailed`] once every worker has finished, and
    /// nothing is renamed.
    pub async fn run(&self) -> Result<RunReport> {
        let started = Instant::now();
        tracing::info!(
            "Starting {} run on {:?}",
            self.job.mode,
            self.job.output_dir
        );

        let result = match self.job.mode {
            RunMode::CopyOnly | RunMode::CopyAndText => self.run_transform().await,
            RunMode::TextOnly => self.run_text_only().await,
            RunMode::CheckDuplicates => self.run_duplicate_check().await,
            RunMode::RenameOnly => self.run_rename_only().await,
        };

        match result {
            Ok(mut report) => {
                report.elapsed_seconds = started.elapsed().as_secs_f64();
                self.progress.complete(None);
                self.enter(RunState::Done);
                tracing::info!(
                    "Finished in {:.2}s: {} renamed, {} skipped, {} error(s)",
                    report.elapsed_seconds,
                    report.renamed.len(),
                    report.skipped.len(),
                    report.errors.len()
                );
                Ok(report)
            }
            Err(e) => {
                self.enter(RunState::Failed);
                Err(e)
            }
        }
    }

    /// List duplicate groups in the output directory without deleting anything.
    pub async fn find_duplicates(&self) -> Result<Vec<FingerprintGroup>> {
        let detector = self.detector.clone();
        let progress = self.progress();
        let dir = self.job.output_dir.clone();
        let groups = blocking(move || detector.find_duplicates(&dir, &progress)).await?;
        Ok(groups)
    }

    async fn run_transform(&self) -> Result<RunReport> {
        let mut report = RunReport::new(self.job.mode);
        let input = &self.job.input_dir;
        let output = &self.job.output_dir;

        self.enter(RunState::Discovering);
        if !input.is_dir() {
            return Err(PipelineError::DirectoryNotFound(input.clone()).into());
        }
        std::fs::create_dir_all(output).map_err(|e| PipelineError::io(output, e))?;
        if same_directory(input, output) {
            return Err(ConfigError::ValidationError(format!(
                "input and output directory are the same: {}",
                output.display()
            ))
            .into());
        }

        let items = self.discovery.discover(input, Depth::Recursive);
        report.discovered = items.len();
        self.progress.set_total(items.len() as u64);
        tracing::info!("Found {} image(s) under {:?}", items.len(), input);

        let assignments = assign_destinations(
            items,
            output,
            self.policy.is_sequential(),
            &self.transformer,
        );

        self.enter(RunState::Transforming);
        let (processed, failures) = self.transform_all(assignments).await?;

        if !failures.is_empty() {
            for failure in &failures {
                tracing::error!("Failed: {}", failure);
            }
            if self.policy.is_sequential() {
                discard_staged(&processed);
            }
            return Err(PipelineError::BatchFailed {
                total: report.discovered,
                failures,
            }
            .into());
        }
        report.processed = processed.len();

        let mut to_rename = processed;
        if self.policy.is_sequential() {
            let ours: HashSet<PathBuf> = to_rename.iter().map(|f| f.output_path.clone()).collect();
            for leftover in self.staged_in(output) {
                if !ours.contains(&leftover) {
                    tracing::warn!("Adopting staging file {:?} from an earlier run", leftover);
                    to_rename.push(processed_file(leftover));
                }
            }
        }

        let outcomes = self.rename(to_rename).await?;
        self.finish_outcomes(outcomes, &mut report);
        Ok(report)
    }

    /// The parallel phase: fan out to the worker pool, then join every worker.
    async fn transform_all(
        &self,
        assignments: Vec<Assignment>,
    ) -> PipelineResult<(Vec<ProcessedFile>, Vec<FileFailure>)> {
        let (tx, rx) = bounded_channel::<Assignment>(&self.pipeline);
        let rx = share(rx);
        let workers = self.workers.clamp(1, assignments.len().max(1));
        tracing::debug!("Spawning {} worker(s)", workers);

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let rx = Arc::clone(&rx);
            let transformer = Arc::clone(&self.transformer);
            let progress = Arc::clone(&self.progress);

            handles.push(tokio::spawn(async move {
                let mut output: WorkerOutput = (Vec::new(), Vec::new());
                // TODO: check a cancellation token here between items once runs can be cancelled.
                while let Some((item, dest)) = next_item(&rx).await {
                    let source = item.source_path.clone();
                    let t = Arc::clone(&transformer);
                    let result = tokio::task::spawn_blocking(move || t.process(&source, &dest))
                        .await
                        .unwrap_or_else(|e| Err(PipelineError::Worker(e.to_string())));

                    match result {
                        Ok(written) => {
                            progress.update(1, Some(&format!("Processed {}", file_name(&written))));
                            output.0.push(ProcessedFile {
                                output_path: written,
                                original_stem: stem_of(&item.source_path),
                            });
                        }
                        Err(e) => {
                            tracing::error!("{}", e);
                            output.1.push(FileFailure {
                                path: item.source_path,
                                message: e.to_string(),
                            });
                        }
                    }
                }
                output
            }));
        }

        for assignment in assignments {
            if tx.send(assignment).await.is_err() {
                tracing::warn!("All workers stopped early; not queueing more files");
                break;
            }
        }
        drop(tx);

        self.enter(RunState::Barrier);
        let mut processed = Vec::new();
        let mut failures = Vec::new();
        let mut join_error = None;
        for handle in handles {
            match handle.await {
                Ok((done, failed)) => {
                    processed.extend(done);
                    failures.extend(failed);
                }
                Err(e) => {
                    tracing::error!("Transform worker panicked: {}", e);
                    if join_error.is_none() {
                        join_error = Some(e.to_string());
                    }
                }
            }
        }

        if let Some(message) = join_error {
            if self.policy.is_sequential() {
                discard_staged(&processed);
            }
            return Err(PipelineError::Worker(message));
        }
        Ok((processed, failures))
    }

    async fn run_text_only(&self) -> Result<RunReport> {
        let mut report = RunReport::new(self.job.mode);
        let dir = self.existing_output_dir()?;

        self.enter(RunState::Discovering);
        let files = self.discovery.list_settled(dir, Depth::Shallow);
        report.discovered = files.len();
        self.progress.set_total(files.len() as u64);

        self.enter(RunState::SidecarGeneration);
        for image in &files {
            match self.sidecar.ensure_label_file(image) {
                Ok(created) => report.sidecars_created += usize::from(created),
                Err(e) => {
                    tracing::error!("{}", e);
                    report.errors.push(FileFailure {
                        path: image.clone(),
                        message: e.to_string(),
                    });
                }
            }
            self.progress.update(1, Some(&format!("Labelled {}", file_name(image))));
        }
        Ok(report)
    }

    async fn run_duplicate_check(&self) -> Result<RunReport> {
        let mut report = RunReport::new(self.job.mode);
        let dir = self.existing_output_dir()?.to_path_buf();

        self.enter(RunState::DuplicateCheck);
        let detector = self.detector.clone();
        let progress = self.progress();
        let duplicates = blocking(move || detector.remove_duplicates(&dir, &progress)).await?;

        report.discovered = duplicates.scanned;
        report.duplicates = Some(duplicates);
        Ok(report)
    }

    async fn run_rename_only(&self) -> Result<RunReport> {
        let mut report = RunReport::new(self.job.mode);
        let dir = self.existing_output_dir()?;

        self.enter(RunState::Discovering);
        // Sequential passes finish what an interrupted run staged; rules never touch it.
        let files = if self.policy.is_sequential() {
            self.discovery.list(dir, Depth::Shallow)
        } else {
            self.discovery.list_settled(dir, Depth::Shallow)
        };
        report.discovered = files.len();
        self.progress.set_total(files.len() as u64);

        let to_rename = match self.policy {
            NamingPolicy::Sequential { .. } => {
                // Move everything out of the numbered namespace first so
                // existing numbers do not block their own slots.
                let renamer = self.renamer.clone();
                let staged = blocking(move || renamer.stage_in_place(&files)).await?;

                let mut to_rename = Vec::with_capacity(staged.len());
                for outcome in staged {
                    match outcome {
                        RenameOutcome::Renamed { to: path, .. } | RenameOutcome::Skipped { path } => {
                            to_rename.push(processed_file(path))
                        }
                        failed @ RenameOutcome::Failed { .. } => report.record_rename(&failed),
                    }
                }
                to_rename
            }
            NamingPolicy::RuleBased(_) => files.into_iter().map(processed_file).collect(),
        };

        let outcomes = self.rename(to_rename).await?;
        self.finish_outcomes(outcomes, &mut report);
        Ok(report)
    }

    /// The serialized rename pass, off the async threads.
    async fn rename(&self, files: Vec<ProcessedFile>) -> PipelineResult<Vec<RenameOutcome>> {
        self.enter(RunState::Renaming);
        let renamer = self.renamer.clone();
        let dir = self.job.output_dir.clone();
        let policy = self.policy.clone();
        blocking(move || match policy {
            NamingPolicy::Sequential { start } => renamer.rename_sequential(files, &dir, start),
            NamingPolicy::RuleBased(rules) => renamer.rename_by_rules(files, &rules),
        })
        .await
    }

    /// Record rename outcomes and create label files at the final paths.
    fn finish_outcomes(&self, outcomes: Vec<RenameOutcome>, report: &mut RunReport) {
        let labels = self.job.mode.writes_sidecars();
        if labels {
            self.enter(RunState::SidecarGeneration);
        }

        for outcome in &outcomes {
            report.record_rename(outcome);
            if !labels {
                continue;
            }
            if let Some(path) = outcome.final_path() {
                match self.sidecar.ensure_label_file(path) {
                    Ok(created) => report.sidecars_created += usize::from(created),
                    Err(e) => {
                        tracing::error!("{}", e);
                        report.errors.push(FileFailure {
                            path: path.clone(),
                            message: e.to_string(),
                        });
                    }
                }
            }
        }
    }

    fn existing_output_dir(&self) -> PipelineResult<&Path> {
        let dir = self.job.output_dir.as_path();
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(PipelineError::DirectoryNotFound(dir.to_path_buf()))
        }
    }

    fn staged_in(&self, dir: &Path) -> Vec<PathBuf> {
        self.discovery
            .list(dir, Depth::Shallow)
            .into_iter()
            .filter(|p| is_staging(p))
            .collect()
    }

    fn enter(&self, state: RunState) {
        tracing::debug!("Run state: {}", state);
        self.progress.set_status(state.to_string());
    }
}

/// Give every item a destination no other item shares and no existing
/// file occupies.
///
/// Stems are deduplicated case-insensitively (`cat`, `cat_2`, ...) so a
/// later format change cannot make two outputs collide. The existence check
/// uses the path the transformer will actually write.
fn assign_destinations(
    items: Vec<WorkItem>,
    output: &Path,
    staged: bool,
    transformer: &ImageTransformer,
) -> Vec<Assignment> {
    let mut taken: HashSet<String> = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .map(|item| {
            let extension = item
                .source_path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            let destination = |stem: &str| {
                let name = if staged {
                    staging_name(stem, &extension)
                } else {
                    format!("{stem}.{extension}")
                };
                output.join(name)
            };

            let stem = free_stem(&stem_of(&item.source_path), |candidate| {
                taken.contains(&candidate.to_lowercase())
                    || transformer.output_path(&destination(candidate)).exists()
            });
            taken.insert(stem.to_lowercase());
            (item, destination(&stem))
        })
        .collect()
}

/// Remove this run's staging copies after a failed transform phase.
fn discard_staged(processed: &[ProcessedFile]) {
    for file in processed {
        if let Err(e) = std::fs::remove_file(&file.output_path) {
            tracing::warn!("Could not remove staged {:?}: {}", file.output_path, e);
        }
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn processed_file(path: PathBuf) -> ProcessedFile {
    ProcessedFile {
        original_stem: stem_of(&path),
        output_path: path,
    }
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Run blocking filesystem work on the blocking pool.
async fn blocking<T, F>(f: F) -> PipelineResult<T>
where
    F: FnOnce() -> PipelineResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| PipelineError::Worker(e.to_string()))?
}
