//! Global constants used throughout the lpass-resolve codebase.
//!
//! This module contains timeout durations, command names, and marker strings
//! shared by the resolver, the store client, and the CLI.

use std::time::Duration;

/// Default timeout for a single `lpass show` invocation (300 seconds).
///
/// Long enough for an interactive `lpass` login prompt to be answered, short
/// enough that unattended runs do not hang forever.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(300);

/// Default name of the LastPass CLI executable.
pub const DEFAULT_LPASS_COMMAND: &str = "lpass";

/// Directory under the home directory that holds the global config file.
pub const CONFIG_DIR_NAME: &str = ".lpass-resolve";

/// File name of the global config file.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "LPASS_RESOLVE_CONFIG";

/// Prefix written in place of a placeholder that failed to resolve when the
/// run uses the marker policy. The full marker is `((!unresolved HANDLE))`.
pub const UNRESOLVED_MARKER_PREFIX: &str = "!unresolved ";
