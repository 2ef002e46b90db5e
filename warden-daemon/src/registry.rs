//! Process-wide table of running daemons, keyed by identity.
//!
//! # First request wins
//!
//! [`DaemonRegistry::get_or_create`] looks only at the identity. If a daemon
//! is already registered it is returned as is, even when the caller names a
//! different command or user: construction arguments take effect on first
//! creation only. A mismatch is logged at `warn`.
//!
//! # Staleness
//!
//! Entries are never removed and never respawned. [`DaemonRegistry::is_running`]
//! reports membership, not liveness; use [`Daemon::has_exited`] to check the
//! process itself.
//!
//! # Teardown
//!
//! Dropping the registry drops every daemon and with it their pipes. Children
//! see end of input on stdin; they are not killed.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use warden_core::{DaemonId, LaunchRequest, SupervisorConfig};

use crate::daemon::Daemon;
use crate::error::DaemonError;
use crate::launcher::{Launcher, ProcessLauncher};

pub struct DaemonRegistry<K = DaemonId> {
    launcher: Arc<dyn Launcher>,
    sync_timeout: Option<Duration>,
    entries: Mutex<HashMap<K, Arc<Daemon<K>>>>,
}

impl<K> DaemonRegistry<K>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync,
{
    /// Empty registry spawning through `launcher`, with the default sync timeout.
    pub fn new(launcher: impl Launcher + 'static) -> Self {
        Self {
            launcher: Arc::new(launcher),
            sync_timeout: Some(warden_core::DEFAULT_SYNC_TIMEOUT),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Empty registry spawning real processes as `config` describes.
    pub fn from_config(config: &SupervisorConfig) -> Self {
        Self::new(ProcessLauncher::new(config)).with_sync_timeout(config.sync_timeout())
    }

    /// Idle timeout handed to every daemon created from now on.
    pub fn with_sync_timeout(mut self, sync_timeout: Option<Duration>) -> Self {
        self.sync_timeout = sync_timeout;
        self
    }

    /// Return the daemon registered for `identity`, spawning it first if
    /// there is none. `command` and `user` are ignored on a hit.
    ///
    /// Check, spawn and insert happen under one lock, so concurrent callers
    /// for a new identity spawn exactly one process.
    pub async fn get_or_create(
        &self,
        identity: K,
        command: &str,
        user: Option<&str>,
    ) -> Result<Arc<Daemon<K>>, DaemonError> {
        let mut entries = self.entries.lock().await;
        if let Some(existing) = entries.get(&identity) {
            if existing.request().differs_from(command, user) {
                tracing::warn!(
                    daemon = ?identity,
                    running = %existing.request(),
                    requested = %LaunchRequest::new(command, user),
                    "daemon already registered; ignoring new command/user",
                );
            }
            return Ok(Arc::clone(existing));
        }

        let request = LaunchRequest::new(command, user);
        tracing::info!(daemon = ?identity, launch = %request, "starting daemon");
        let daemon = Arc::new(
            Daemon::launch(
                identity.clone(),
                request,
                self.launcher.as_ref(),
                self.sync_timeout,
            )
            .await?,
        );
        entries.insert(identity, Arc::clone(&daemon));
        Ok(daemon)
    }

    /// The daemon registered for `identity`, if any.
    pub async fn daemon_for(&self, identity: &K) -> Option<Arc<Daemon<K>>> {
        self.entries.lock().await.get(identity).cloned()
    }

    /// `true` iff a daemon is registered for `identity`. Does not check
    /// whether its process is still alive.
    pub async fn is_running(&self, identity: &K) -> bool {
        self.entries.lock().await.contains_key(identity)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Registered identities, in no particular order.
    pub async fn identities(&self) -> Vec<K> {
        self.entries.lock().await.keys().cloned().collect()
    }
}

impl<K> Default for DaemonRegistry<K>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync,
{
    fn default() -> Self {
        Self::from_config(&SupervisorConfig::default())
    }
}

impl<K> fmt::Debug for DaemonRegistry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DaemonRegistry")
            .field("sync_timeout", &self.sync_timeout)
            .finish_non_exhaustive()
    }
}
