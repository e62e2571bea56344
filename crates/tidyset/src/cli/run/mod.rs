//! The `tidyset run` command.

mod progress;
mod setup;
pub mod types;

pub use types::{Mode, Padding, Size};

use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

use progress::{print_summary, write_report, Poller};
use setup::setup_run;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Source directory (read recursively by the copy modes)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output directory; defaults to INPUT for modes that work in place
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// What to do
    #[arg(short, long, value_enum, default_value = "copy-only")]
    pub mode: Mode,

    /// Number of parallel transform workers
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Letterbox every image into a square of this size
    #[arg(long, value_enum)]
    pub resize: Option<Size>,

    /// Fill color around letterboxed images
    #[arg(long, value_enum)]
    pub padding: Option<Padding>,

    /// Write every output as PNG
    #[arg(long)]
    pub png: bool,

    /// Keep names instead of numbering; required for --prefix, --suffix and --replace
    #[arg(long)]
    pub no_numbering: bool,

    /// First number used by sequential naming
    #[arg(long)]
    pub start: Option<u64>,

    /// Prepend this to every name
    #[arg(long)]
    pub prefix: Option<String>,

    /// Append this to every name
    #[arg(long)]
    pub suffix: Option<String>,

    /// Replace FROM with TO in every name
    #[arg(long, num_args = 2, value_names = ["FROM", "TO"])]
    pub replace: Option<Vec<String>>,

    /// Write the run report as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the run command.
pub async fn execute(args: RunArgs) -> anyhow::Result<()> {
    let (config, job) = setup_run(&args)?;
    let pipeline = tidyset_core::BatchPipeline::new(&config, job)?;

    let poller = (!args.quiet).then(|| {
        Poller::spawn(
            pipeline.progress(),
            Duration::from_millis(config.pipeline.progress_interval_ms),
        )
    });
    let result = pipeline.run().await;
    if let Some(poller) = poller {
        poller.stop();
    }

    let report = result?;
    print_summary(&report);
    if let Some(path) = &args.report {
        write_report(&report, path)?;
        tracing::info!("Report written to {:?}", path);
    }
    Ok(())
}
