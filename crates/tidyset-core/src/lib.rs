//! Tidyset Core - Embeddable batch image pipeline for dataset preparation.
//!
//! Tidyset normalizes a directory of images into a training-ready folder:
//! it copies or letterboxes every image, gives the outputs collision-free
//! names, creates empty label files next to them and removes
//! pixel-identical duplicates.
//!
//! # Architecture
//!
//! ```text
//! Discover → Transform (worker pool) → Barrier → Rename (serial) → Labels
//!                       Discover → Fingerprint → Remove duplicates
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use tidyset_core::{Config, Job, RunMode, Tidyset};
//!
//! #[tokio::main]
//! async fn main() -> tidyset_core::Result<()> {
//!     let tidyset = Tidyset::new(Config::load()?)?;
//!     let report = tidyset
//!         .run(Job {
//!             input_dir: "./raw".into(),
//!             output_dir: "./dataset".into(),
//!             mode: RunMode::CopyAndText,
//!         })
//!         .await?;
//!     println!("Renamed {} files", report.renamed.len());
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, FileFailure, PipelineError, PipelineResult, Result, TidysetError};
pub use pipeline::{BatchPipeline, ProgressState, ProgressTracker};
pub use types::{
    DuplicateReport, FingerprintGroup, Job, RenameOutcome, RenamedFile, RunMode, RunReport,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Entry point holding a validated configuration.
pub struct Tidyset {
    config: Config,
}

impl Tidyset {
    /// Create a new instance, rejecting invalid configuration up front.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        tracing::debug!("Initializing Tidyset v{}", VERSION);
        Ok(Self { config })
    }

    /// Create an instance from the config file, or defaults if there is none.
    pub fn with_defaults() -> Result<Self> {
        Self::new(Config::load()?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the pipeline for `job` without starting it.
    ///
    /// Use this to grab [`BatchPipeline::progress`] before calling `run`.
    pub fn pipeline(&self, job: Job) -> Result<BatchPipeline> {
        BatchPipeline::new(&self.config, job)
    }

    /// Build and run `job`.
    pub async fn run(&self, job: Job) -> Result<RunReport> {
        self.pipeline(job)?.run().await
    }
}
