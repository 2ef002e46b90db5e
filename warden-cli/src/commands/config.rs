//! `warden config` — show the effective supervisor configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;

use warden_core::{config, SupervisorConfig};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration as YAML.
    Show {
        /// Config file to read instead of ~/.warden/config.yaml.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the default config file location.
    Path,
}

pub fn run(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show { config } => {
            let config = load(config.as_deref())?;
            print!("{}", config.to_yaml().context("failed to render config")?);
        }
        ConfigCommand::Path => {
            let path = config::config_path().context("could not determine home directory")?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Explicit file if given (must exist), else `~/.warden/config.yaml` or defaults.
pub fn load(path: Option<&Path>) -> Result<SupervisorConfig> {
    match path {
        Some(path) => SupervisorConfig::load_at(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => SupervisorConfig::load_or_default().context("failed to load ~/.warden/config.yaml"),
    }
}
