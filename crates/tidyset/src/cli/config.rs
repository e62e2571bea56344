//! The `tidyset config` command for configuration management.

use clap::{Args, Subcommand};
use std::path::Path;
use tidyset_core::pipeline::NamingPolicy;
use tidyset_core::Config;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show {
        /// Print built-in defaults instead of the config file
        #[arg(long)]
        defaults: bool,
    },

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Validate the config file and describe the naming it selects
    Check,
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show { defaults } => {
            let config = if defaults {
                Config::default()
            } else {
                Config::load()?
            };
            println!("{}", config.to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", Config::default_path().display());
        }

        ConfigCommand::Init { force } => {
            let path = Config::default_path();
            write_default(&path, force)?;
            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }

        ConfigCommand::Check => {
            // load() validates; the policy is built the same way a run builds it
            let config = Config::load()?;
            let policy = NamingPolicy::from_config(&config.naming)?;
            println!("Configuration OK: {}", describe_policy(&policy));
        }
    }

    Ok(())
}

/// Write the default configuration to `path`, refusing to clobber unless `force`.
fn write_default(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, Config::default().to_toml()?)?;
    Ok(())
}

fn describe_policy(policy: &NamingPolicy) -> String {
    match policy {
        NamingPolicy::Sequential { start } => format!("sequential numbering from {start}"),
        NamingPolicy::RuleBased(rules) if rules.is_empty() => {
            "names kept as they are".to_string()
        }
        NamingPolicy::RuleBased(rules) => {
            format!("rule-based naming (e.g. \"photo\" -> \"{}\")", rules.apply("photo"))
        }
    }
}
