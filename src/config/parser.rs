//! Generic TOML configuration parsing.
//!
//! Reads a file and deserializes it into any [`serde::de::DeserializeOwned`]
//! type, attaching the file path to read and parse failures.
//!
//! Example error output:
//! ```text
//! Failed to parse config file: /home/me/.lpass-resolve/config.toml
//! Caused by:
//!     unknown field `timeout`, expected one of `lpass_command`, `timeout_secs`, ...
//! ```

use anyhow::{Context, Result};
use std::path::Path;

/// Parse a TOML configuration file into the specified type.
///
/// # Examples
///
/// ```rust,no_run
/// use lpass_resolve::config::parse_config;
/// use serde::Deserialize;
/// use std::path::Path;
///
/// #[derive(Deserialize)]
/// struct Config {
///     lpass_command: String,
/// }
///
/// # fn example() -> anyhow::Result<()> {
/// let config: Config = parse_config(Path::new("config.toml"))?;
/// println!("Using {}", config.lpass_command);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid TOML, or does
/// not match the shape of `T`. The path is included in the error context.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}
