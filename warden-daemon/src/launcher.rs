//! Spawning daemon processes.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;

use warden_core::{SupervisorConfig, SwitchUserConfig};

use crate::channel::PipeChannel;
use crate::error::DaemonError;

/// What the launcher is asked to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnTarget {
    /// Run this command line directly.
    Command(String),
    /// Open a privilege-switch shell for this user, with no command. The
    /// caller feeds the real command through stdin afterwards.
    SwitchUser(String),
}

impl fmt::Display for SpawnTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpawnTarget::Command(command) => write!(f, "command `{command}`"),
            SpawnTarget::SwitchUser(user) => write!(f, "user {user}"),
        }
    }
}

/// Start-a-process capability. Must not block; the process runs on its own.
pub trait Launcher: Send + Sync {
    fn spawn(&self, target: &SpawnTarget) -> Result<PipeChannel, DaemonError>;
}

/// OS launcher: tokio child processes with stdin, stdout and stderr piped.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    shell: PathBuf,
    switch_user: SwitchUserConfig,
}

impl ProcessLauncher {
    pub fn new(config: &SupervisorConfig) -> Self {
        Self {
            shell: config.shell.clone(),
            switch_user: config.switch_user.clone(),
        }
    }

    fn command_for(&self, target: &SpawnTarget) -> (String, Command) {
        match target {
            SpawnTarget::Command(line) => {
                let mut cmd = Command::new(&self.shell);
                cmd.arg("-c").arg(line);
                (self.shell.display().to_string(), cmd)
            }
            SpawnTarget::SwitchUser(user) => {
                let mut cmd = Command::new(&self.switch_user.program);
                cmd.args(self.switch_user.args_for(user));
                (self.switch_user.program.clone(), cmd)
            }
        }
    }
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        Self::new(&SupervisorConfig::default())
    }
}

impl Launcher for ProcessLauncher {
    fn spawn(&self, target: &SpawnTarget) -> Result<PipeChannel, DaemonError> {
        let (program, mut cmd) = self.command_for(target);
        let child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| DaemonError::Spawn {
                program,
                target: target.to_string(),
                source,
            })?;

        tracing::debug!(pid = ?child.id(), %target, "spawned daemon process");
        PipeChannel::from_child(child)
    }
}
