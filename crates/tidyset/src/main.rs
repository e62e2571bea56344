//! Tidyset CLI - Batch image preparation for training datasets.
//!
//! Tidyset copies a folder of images into a dataset folder, optionally
//! letterboxing them to a fixed square, numbers or renames the outputs,
//! creates empty label files and removes pixel-identical duplicates.
//!
//! # Usage
//!
//! ```bash
//! # Copy, letterbox to 512px and number the outputs, with label files
//! tidyset run ./raw -o ./dataset -m copy-and-text --resize 512
//!
//! # Remove duplicates from a dataset folder
//! tidyset run ./dataset -m check-duplicates
//!
//! # List duplicates without deleting anything
//! tidyset dupes ./dataset
//!
//! # View configuration
//! tidyset config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Tidyset - Batch image preparation for training datasets.
#[derive(Parser, Debug)]
#[command(name = "tidyset")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy, letterbox, rename, label or dedupe a folder of images
    Run(cli::run::RunArgs),

    /// List duplicate images in a folder without deleting them
    Dupes(cli::dupes::DupesArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match tidyset_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default logging settings. Check your config file with `tidyset config path`."
            );
            tidyset_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Tidyset v{}", tidyset_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute(args).await,
        Commands::Dupes(args) => cli::dupes::execute(args).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
