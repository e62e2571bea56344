//! Progress display, summary table and JSON report.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tidyset_core::{ProgressTracker, RunReport};

/// Mirrors a [`ProgressTracker`] onto a progress bar until stopped.
///
/// Display only: the run does not depend on it.
pub struct Poller {
    bar: ProgressBar,
    handle: tokio::task::JoinHandle<()>,
}

impl Poller {
    pub fn spawn(tracker: Arc<ProgressTracker>, interval: Duration) -> Self {
        let bar = create_progress_bar();
        let task_bar = bar.clone();
        let interval = interval.max(Duration::from_millis(10));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let state = tracker.snapshot();
                task_bar.set_length(state.total);
                task_bar.set_position(state.current);
                task_bar.set_message(state.status);
            }
        });

        Self { bar, handle }
    }

    pub fn stop(self) {
        self.handle.abort();
        self.bar.finish_and_clear();
    }
}

/// Create the progress bar used for runs.
fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after a run.
pub fn print_summary(report: &RunReport) {
    let rate = if report.elapsed_seconds > 0.0 {
        report.processed as f64 / report.elapsed_seconds
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("         Summary ({})", report.mode);
    eprintln!("  ====================================");
    eprintln!("    Discovered:   {:>8}", report.discovered);
    if report.processed > 0 {
        eprintln!("    Processed:    {:>8}", report.processed);
    }
    eprintln!("    Renamed:      {:>8}", report.renamed.len());
    if !report.skipped.is_empty() {
        eprintln!("    Skipped:      {:>8}", report.skipped.len());
    }
    if report.sidecars_created > 0 {
        eprintln!("    Labels:       {:>8}", report.sidecars_created);
    }
    if let Some(duplicates) = &report.duplicates {
        eprintln!("    Dup groups:   {:>8}", duplicates.groups.len());
        eprintln!("    Removed:      {:>8}", duplicates.removed_count());
    }
    if !report.errors.is_empty() {
        eprintln!("    Errors:       {:>8}", report.errors.len());
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Duration:     {:>7.1}s", report.elapsed_seconds);
    if report.processed > 0 {
        eprintln!("    Rate:         {:>7.1} img/sec", rate);
    }
    eprintln!("  ====================================");

    for failure in &report.errors {
        eprintln!("    ! {}", failure);
    }
}

/// Write the report as pretty JSON.
pub fn write_report(report: &RunReport, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(report)?)?;
    Ok(())
}
