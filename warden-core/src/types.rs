//! Domain types shared by the daemon registry and the CLI.

use std::fmt;

/// Default registry key: an opaque, caller-chosen name for one logical daemon.
///
/// The registry itself is generic over any hashable key; this newtype is what
/// the CLI uses.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DaemonId(pub String);

// Logged and quoted in errors as a plain string, not `DaemonId("..")`.
impl fmt::Debug for DaemonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for DaemonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for DaemonId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DaemonId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// The construction arguments a daemon was first created with.
///
/// Only honored on first creation: later requests for the same identity get
/// the existing daemon no matter what command or user they name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub command: String,
    pub user: Option<String>,
}

impl LaunchRequest {
    pub fn new(command: impl Into<String>, user: Option<&str>) -> Self {
        Self {
            command: command.into(),
            user: user.map(str::to_owned),
        }
    }

    /// `true` when `command`/`user` name something other than this request.
    pub fn differs_from(&self, command: &str, user: Option<&str>) -> bool {
        self.command != command || self.user.as_deref() != user
    }
}

impl fmt::Display for LaunchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.user {
            Some(user) => write!(f, "`{}` as {user}", self.command),
            None => write!(f, "`{}`", self.command),
        }
    }
}
