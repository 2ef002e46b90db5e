//! In-memory launcher: records what it is asked to do and hands the test the
//! far ends of each fake child's stdout/stderr.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncWrite, BufReader, DuplexStream};
use warden_daemon::{DaemonError, Launcher, PipeChannel, SpawnTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Spawn(SpawnTarget),
    Write(Vec<u8>),
    Shutdown,
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

/// Stdin stand-in: every `poll_write` call becomes one `Event::Write`.
pub struct RecordingInput {
    log: EventLog,
}

impl AsyncWrite for RecordingInput {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.log.lock().unwrap().push(Event::Write(buf.to_vec()));
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.log.lock().unwrap().push(Event::Shutdown);
        Poll::Ready(Ok(()))
    }
}

/// The child's side of its output pipes. Dropping `stdout` closes the stream.
pub struct FakeChild {
    pub stdout: DuplexStream,
    pub stderr: DuplexStream,
}

#[derive(Clone, Default)]
pub struct FakeLauncher {
    log: EventLog,
    children: Arc<Mutex<VecDeque<FakeChild>>>,
    spawns: Arc<AtomicUsize>,
    spawn_delay: Option<Duration>,
    fail: bool,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every spawn fails like a missing program would.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Block inside `spawn` to widen race windows.
    pub fn with_spawn_delay(mut self, delay: Duration) -> Self {
        self.spawn_delay = Some(delay);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.lock().unwrap().clone()
    }

    pub fn spawn_count(&self) -> usize {
        self.spawns.load(Ordering::SeqCst)
    }

    /// Oldest fake child not yet handed out.
    pub fn take_child(&self) -> FakeChild {
        self.children
            .lock()
            .unwrap()
            .pop_front()
            .expect("no fake child was spawned")
    }
}

impl Launcher for FakeLauncher {
    fn spawn(&self, target: &SpawnTarget) -> Result<PipeChannel, DaemonError> {
        if let Some(delay) = self.spawn_delay {
            std::thread::sleep(delay);
        }
        if self.fail {
            return Err(DaemonError::Spawn {
                program: "fake".to_string(),
                target: target.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such program"),
            });
        }

        self.spawns.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(Event::Spawn(target.clone()));

        let (stdout, output) = tokio::io::duplex(4096);
        let (stderr, error) = tokio::io::duplex(4096);
        self.children
            .lock()
            .unwrap()
            .push_back(FakeChild { stdout, stderr });

        Ok(PipeChannel::new(
            RecordingInput {
                log: Arc::clone(&self.log),
            },
            BufReader::new(output),
            BufReader::new(error),
        ))
    }
}
