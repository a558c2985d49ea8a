//! Resolver settings loaded from TOML.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::parse_config;
use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_LPASS_COMMAND, DEFAULT_STORE_TIMEOUT};
use crate::resolver::UnresolvedPolicy;

/// Settings that shape one resolver run.
///
/// Every key is optional in the file; absent keys keep their defaults.
/// Unknown keys are rejected so typos do not pass silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Credential store executable, looked up on `PATH` unless absolute.
    pub lpass_command: String,

    /// Per-fetch timeout in seconds. `0` disables the timeout.
    pub timeout_secs: u64,

    /// Whether an empty secret counts as cached.
    ///
    /// With `false`, entries whose secret is empty are fetched again on every
    /// reference.
    pub cache_empty_values: bool,

    /// What to do when a placeholder cannot be resolved.
    pub on_error: UnresolvedPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            lpass_command: DEFAULT_LPASS_COMMAND.to_string(),
            timeout_secs: DEFAULT_STORE_TIMEOUT.as_secs(),
            cache_empty_values: true,
            on_error: UnresolvedPolicy::default(),
        }
    }
}

impl ResolverConfig {
    /// Load from the default location, falling back to defaults if the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined, or the
    /// file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_with_optional(None)
    }

    /// Load from `path` if given, otherwise from the default location.
    ///
    /// The path goes through `~` and `$VAR` expansion. A file that does not
    /// exist yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be expanded, or the file exists but
    /// cannot be read or parsed.
    pub fn load_with_optional(path: Option<&str>) -> Result<Self> {
        let path = match path {
            Some(raw) => expand_path(raw)?,
            None => Self::default_path()?,
        };

        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            Self::load_from(&path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// contains unknown keys.
    pub fn load_from(path: &Path) -> Result<Self> {
        parse_config(path)
    }

    /// `~/.lpass-resolve/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
            .join(CONFIG_DIR_NAME);

        Ok(config_dir.join(CONFIG_FILE_NAME))
    }

    /// The fetch timeout, or `None` when disabled.
    #[must_use]
    pub const fn store_timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

/// Expand `~` and environment variables in a user-supplied path.
///
/// # Errors
///
/// Returns an error naming the variable when one is referenced but not set.
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .with_context(|| format!("Failed to expand path: {raw}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}
