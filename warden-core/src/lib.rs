//! Warden core library — identities, the sentinel line protocol, configuration.
//!
//! - [`types`] — [`DaemonId`] and the launch request a daemon is built from
//! - [`protocol`] — sentinel lines and [`Frame`] classification
//! - [`config`] — [`SupervisorConfig`] loading
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod protocol;
pub mod types;

pub use config::{SupervisorConfig, SwitchUserConfig, DEFAULT_SYNC_TIMEOUT};
pub use error::ConfigError;
pub use protocol::{Frame, FAILURE_SENTINEL, PROTOCOL_VERSION, SUCCESS_SENTINEL};
pub use types::{DaemonId, LaunchRequest};
