//! Daemon supervision: spawn long-running processes, push commands into their
//! stdin, and block until their stdout reports success or failure.

pub mod channel;
mod daemon;
mod error;
pub mod launcher;
mod logging;
mod registry;

pub use channel::{FrameStream, PipeChannel};
pub use daemon::{Daemon, SyncOutcome};
pub use error::DaemonError;
pub use launcher::{Launcher, ProcessLauncher, SpawnTarget};
pub use logging::init_tracing;
pub use registry::DaemonRegistry;
