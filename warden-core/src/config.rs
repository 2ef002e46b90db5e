//! Supervisor configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.warden/
//!   config.yaml   (optional — defaults apply when absent)
//! ```
//!
//! Every loader has an `_at` form taking an explicit path or home and a
//! convenience form that resolves `dirs::home_dir()`. Tests use the `_at`
//! forms only.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How long `sync` waits for the next output line before giving up.
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(120);

/// Placeholder substituted with the target user in [`SwitchUserConfig::args`].
pub const USER_PLACEHOLDER: &str = "{user}";

/// How daemons are launched and how long callers wait on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupervisorConfig {
    /// Shell used to run a daemon command when no user switch is requested.
    pub shell: PathBuf,

    /// Privilege-switch shell used when a daemon must run as another user.
    pub switch_user: SwitchUserConfig,

    /// Idle timeout for `sync`, in seconds. `null` waits forever.
    pub sync_timeout_secs: Option<u64>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            shell: PathBuf::from("/bin/sh"),
            switch_user: SwitchUserConfig::default(),
            sync_timeout_secs: Some(DEFAULT_SYNC_TIMEOUT.as_secs()),
        }
    }
}

/// Program plus arguments that open a login shell for `{user}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwitchUserConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for SwitchUserConfig {
    fn default() -> Self {
        Self {
            program: "su".to_string(),
            args: vec!["-".to_string(), USER_PLACEHOLDER.to_string()],
        }
    }
}

impl SwitchUserConfig {
    /// Arguments with every `{user}` placeholder replaced by `user`.
    pub fn args_for(&self, user: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(USER_PLACEHOLDER, user))
            .collect()
    }
}

impl SupervisorConfig {
    /// `sync_timeout_secs` as a `Duration`.
    pub fn sync_timeout(&self) -> Option<Duration> {
        self.sync_timeout_secs.map(Duration::from_secs)
    }

    /// Load config from an explicit file. The file must exist.
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load `<home>/.warden/config.yaml`, falling back to defaults when absent.
    pub fn load_or_default_at(home: &Path) -> Result<Self, ConfigError> {
        let path = config_path_at(home);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_at(&path)
    }

    /// `load_or_default_at` convenience wrapper.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Self::load_or_default_at(&home()?)
    }

    /// Render as YAML, e.g. for `warden config show`.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// `<home>/.warden/config.yaml` — pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".warden").join("config.yaml")
}

/// `config_path_at` convenience wrapper.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_path_at(&home()?))
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}
