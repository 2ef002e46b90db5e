use std::time::Duration;

use thiserror::Error;

/// Error surface for launching daemons and talking to them.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("failed to spawn `{program}` for {target}: {source}")]
    Spawn {
        program: String,
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("spawned process has no {0} pipe")]
    MissingPipe(&'static str),

    #[error("I/O error on daemon {stream}: {source}")]
    Io {
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("command in daemon {daemon} failed")]
    CommandFailed { daemon: String },

    #[error("daemon {daemon} produced no output for {after:?}")]
    Timeout { daemon: String, after: Duration },
}

impl DaemonError {
    /// `true` when the daemon printed the failure sentinel.
    pub fn is_command_failed(&self) -> bool {
        matches!(self, DaemonError::CommandFailed { .. })
    }
}

pub(crate) fn io_err(stream: &'static str, source: std::io::Error) -> DaemonError {
    DaemonError::Io { stream, source }
}
