//! `warden run` — start a daemon, then execute + sync each command in turn.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde_json::json;

use warden_core::{DaemonId, SupervisorConfig};
use warden_daemon::{DaemonError, DaemonRegistry, SyncOutcome};

/// Arguments for `warden run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Command line that starts the daemon.
    #[arg(long)]
    pub daemon: String,

    /// Run the daemon as this user through the privilege-switch shell.
    #[arg(long)]
    pub user: Option<String>,

    /// Registry identity for the daemon (defaults to the daemon command).
    #[arg(long)]
    pub id: Option<String>,

    /// Seconds to wait for each output line; 0 waits forever.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Config file to read instead of ~/.warden/config.yaml.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit one JSON object per output line and per command result.
    #[arg(long)]
    pub json: bool,

    /// Commands to send, each followed by a sync.
    #[arg(required = true)]
    pub commands: Vec<String>,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let config = super::config::load(self.config.as_deref())?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start tokio runtime")?;
        runtime.block_on(self.drive(config))
    }

    async fn drive(self, config: SupervisorConfig) -> Result<()> {
        let sync_timeout = match self.timeout {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => config.sync_timeout(),
        };
        let registry = DaemonRegistry::from_config(&config).with_sync_timeout(sync_timeout);
        let identity = DaemonId::from(self.id.clone().unwrap_or_else(|| self.daemon.clone()));

        let daemon = registry
            .get_or_create(identity, &self.daemon, self.user.as_deref())
            .await
            .with_context(|| format!("failed to start daemon `{}`", self.daemon))?;

        for command in &self.commands {
            daemon
                .execute(command)
                .await
                .with_context(|| format!("failed to send `{command}`"))?;

            let result = daemon
                .sync_with(|line| self.print_line(command, line))
                .await;
            self.print_outcome(command, &result);

            match result {
                Ok(SyncOutcome::Completed) => {}
                Ok(SyncOutcome::StreamClosed) => {
                    bail!("daemon exited before `{command}` reported completion")
                }
                Err(err) => return Err(err).with_context(|| format!("`{command}` did not complete")),
            }
        }

        daemon
            .close_input()
            .await
            .context("failed to close daemon stdin")?;
        Ok(())
    }

    fn print_line(&self, command: &str, line: &str) {
        if self.json {
            println!("{}", json!({ "command": command, "line": line }));
        } else {
            println!("{line}");
        }
    }

    fn print_outcome(&self, command: &str, result: &Result<SyncOutcome, DaemonError>) {
        let outcome = match result {
            Ok(SyncOutcome::Completed) => "completed",
            Ok(SyncOutcome::StreamClosed) => "stream_closed",
            Err(DaemonError::CommandFailed { .. }) => "failed",
            Err(DaemonError::Timeout { .. }) => "timeout",
            Err(_) => "error",
        };

        if self.json {
            println!("{}", json!({ "command": command, "outcome": outcome }));
            return;
        }

        let mark = match outcome {
            "completed" => "✓".green(),
            "stream_closed" => "?".yellow(),
            _ => "✗".red(),
        };
        eprintln!("{mark} {command}");
    }
}
