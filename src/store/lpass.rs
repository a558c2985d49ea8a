//! LastPass CLI credential store.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ResolverConfig;
use crate::constants::{DEFAULT_LPASS_COMMAND, DEFAULT_STORE_TIMEOUT};
use crate::core::ResolveError;
use crate::store::{CredentialStore, LpassCommand};

/// Map a field name to the `lpass show` flag that prints it.
///
/// `Password`, `Username`, `URL` and `Notes` have dedicated flags; every other
/// name is treated as a custom field.
///
/// ```rust
/// use lpass_resolve::store::field_flag;
///
/// assert_eq!(field_flag("URL"), "--url");
/// assert_eq!(field_flag("Private Key"), "--field=Private Key");
/// ```
#[must_use]
pub fn field_flag(field: &str) -> String {
    match field {
        "Password" => "--password".to_string(),
        "Username" => "--username".to_string(),
        "URL" => "--url".to_string(),
        "Notes" => "--notes".to_string(),
        other => format!("--field={other}"),
    }
}

/// [`CredentialStore`] backed by the `lpass` command-line tool.
#[derive(Debug, Clone)]
pub struct LpassStore {
    command: String,
    timeout: Option<Duration>,
}

impl Default for LpassStore {
    fn default() -> Self {
        Self {
            command: DEFAULT_LPASS_COMMAND.to_string(),
            timeout: Some(DEFAULT_STORE_TIMEOUT),
        }
    }
}

impl LpassStore {
    /// Store that runs `command` with the default timeout.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// Store configured from a [`ResolverConfig`].
    #[must_use]
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            command: config.lpass_command.clone(),
            timeout: config.store_timeout(),
        }
    }

    /// Override the per-fetch timeout (None disables it).
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The command this store runs.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Locate the store command on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::StoreUnavailable`] if it cannot be found.
    pub fn ensure_available(&self) -> Result<PathBuf, ResolveError> {
        which::which(&self.command).map_err(|_| ResolveError::StoreUnavailable {
            command: self.command.clone(),
        })
    }
}

impl CredentialStore for LpassStore {
    async fn fetch(&self, entry: &str, field: &str) -> Result<String, ResolveError> {
        LpassCommand::show(&self.command, entry, field)
            .with_timeout(self.timeout)
            .execute_stdout()
            .await
    }
}
