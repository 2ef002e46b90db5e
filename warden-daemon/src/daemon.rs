//! One supervised child process and the command/sync exchange over its pipes.

use std::fmt;
use std::sync::{Mutex as StdMutex, MutexGuard};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Child;
use tokio::sync::Mutex;

use warden_core::{DaemonId, Frame, LaunchRequest};

use crate::channel::{FrameStream, InputStream, OutputStream, PipeChannel};
use crate::error::{io_err, DaemonError};
use crate::launcher::{Launcher, SpawnTarget};

/// How a `sync` call ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The daemon printed the success sentinel.
    Completed,
    /// The daemon closed its output before printing either sentinel.
    /// Nothing is known about the command's result.
    StreamClosed,
}

/// A long-running child process driven line by line.
///
/// One task writes through [`Daemon::execute`] and one task reads through
/// [`Daemon::sync`]; each side is serialized by its own lock.
pub struct Daemon<K = DaemonId> {
    identity: K,
    label: String,
    request: LaunchRequest,
    input: Mutex<Option<InputStream>>,
    frames: Mutex<FrameStream>,
    child: StdMutex<Option<Child>>,
    sync_timeout: Option<Duration>,
}

impl<K: fmt::Debug> Daemon<K> {
    /// Spawn the process for `request` and wrap it.
    ///
    /// With a user, a privilege-switch shell is spawned first and the command
    /// is then written to it as its first line of input.
    pub async fn launch(
        identity: K,
        request: LaunchRequest,
        launcher: &dyn Launcher,
        sync_timeout: Option<Duration>,
    ) -> Result<Self, DaemonError> {
        let target = match &request.user {
            Some(user) => SpawnTarget::SwitchUser(user.clone()),
            None => SpawnTarget::Command(request.command.clone()),
        };
        let channel = launcher.spawn(&target)?;
        let daemon = Self::from_channel(identity, request, channel, sync_timeout);

        if daemon.request.user.is_some() {
            daemon.execute(&daemon.request.command).await?;
        }
        Ok(daemon)
    }

    /// Wrap an already connected channel. Must be called inside a tokio
    /// runtime: stderr is drained by a background task.
    pub fn from_channel(
        identity: K,
        request: LaunchRequest,
        channel: PipeChannel,
        sync_timeout: Option<Duration>,
    ) -> Self {
        let label = format!("{identity:?}");
        drain_stderr(label.clone(), channel.error);

        Self {
            identity,
            label,
            request,
            input: Mutex::new(Some(channel.input)),
            frames: Mutex::new(FrameStream::new("stdout", channel.output)),
            child: StdMutex::new(channel.child),
            sync_timeout,
        }
    }

    pub fn identity(&self) -> &K {
        &self.identity
    }

    /// The command and user this daemon was created with.
    pub fn request(&self) -> &LaunchRequest {
        &self.request
    }

    pub fn sync_timeout(&self) -> Option<Duration> {
        self.sync_timeout
    }

    /// Write `command` plus a newline to the daemon's stdin.
    ///
    /// Fails with a `BrokenPipe` I/O error once [`Daemon::close_input`] ran.
    pub async fn execute(&self, command: &str) -> Result<(), DaemonError> {
        let mut line = String::with_capacity(command.len() + 1);
        line.push_str(command);
        line.push('\n');

        let mut guard = self.input.lock().await;
        let input = guard.as_mut().ok_or_else(input_closed)?;
        input
            .write_all(line.as_bytes())
            .await
            .map_err(|e| io_err("stdin", e))?;
        input.flush().await.map_err(|e| io_err("stdin", e))?;
        tracing::debug!(daemon = %self.label, command, "sent command");
        Ok(())
    }

    /// Close the daemon's stdin. The child sees end of input.
    ///
    /// The writer is dropped, which releases the pipe. Closing twice is a no-op.
    pub async fn close_input(&self) -> Result<(), DaemonError> {
        let Some(mut input) = self.input.lock().await.take() else {
            return Ok(());
        };
        input.shutdown().await.map_err(|e| io_err("stdin", e))?;
        drop(input);
        tracing::debug!(daemon = %self.label, "closed daemon stdin");
        Ok(())
    }

    /// [`Daemon::sync_with`] without a line observer.
    pub async fn sync(&self) -> Result<SyncOutcome, DaemonError> {
        self.sync_with(|_| {}).await
    }

    /// Read output until the daemon reports the end of a command.
    ///
    /// Every non-sentinel line goes to `on_line`, in arrival order. Returns
    /// `Completed` on the success sentinel, `CommandFailed` on the failure
    /// sentinel (nothing after it is consumed), `StreamClosed` when output
    /// ends first, and `Timeout` when no line arrives within the idle
    /// timeout. Sentinel lines are never passed to `on_line`.
    pub async fn sync_with<F>(&self, mut on_line: F) -> Result<SyncOutcome, DaemonError>
    where
        F: FnMut(&str),
    {
        let mut frames = self.frames.lock().await;
        loop {
            let next = match self.sync_timeout {
                Some(after) => tokio::time::timeout(after, frames.next_line())
                    .await
                    .map_err(|_| DaemonError::Timeout {
                        daemon: self.label.clone(),
                        after,
                    })?,
                None => frames.next_line().await,
            };

            let Some(line) = next? else {
                tracing::debug!(daemon = %self.label, "daemon output closed before a sentinel");
                return Ok(SyncOutcome::StreamClosed);
            };
            tracing::debug!(daemon = %self.label, line = %line, "daemon output");

            match Frame::classify(&line) {
                Frame::Success => return Ok(SyncOutcome::Completed),
                Frame::Failure => {
                    return Err(DaemonError::CommandFailed {
                        daemon: self.label.clone(),
                    })
                }
                Frame::Data(data) => on_line(data),
            }
        }
    }

    /// OS process id, if this daemon wraps a real process that is still known.
    pub fn pid(&self) -> Option<u32> {
        self.child_guard().as_ref().and_then(Child::id)
    }

    /// `true` once the wrapped process has exited. Always `false` for
    /// daemons built from in-memory channels.
    pub fn has_exited(&self) -> bool {
        match self.child_guard().as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(Some(_))),
            None => false,
        }
    }

    fn child_guard(&self) -> MutexGuard<'_, Option<Child>> {
        self.child.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<K: fmt::Debug> fmt::Debug for Daemon<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Daemon")
            .field("identity", &self.identity)
            .field("request", &self.request)
            .field("sync_timeout", &self.sync_timeout)
            .finish_non_exhaustive()
    }
}

fn input_closed() -> DaemonError {
    io_err(
        "stdin",
        std::io::Error::new(std::io::ErrorKind::BrokenPipe, "daemon stdin already closed"),
    )
}

fn drain_stderr(label: String, error: OutputStream) {
    tokio::spawn(async move {
        let mut lines = FrameStream::new("stderr", error);
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => tracing::debug!(daemon = %label, line = %line, "daemon stderr"),
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(daemon = %label, error = %err, "daemon stderr read failed");
                    break;
                }
            }
        }
    });
}
