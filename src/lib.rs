//! lpass-resolve - LastPass placeholder resolution for configuration files
//!
//! Configuration documents reference secrets with placeholders instead of
//! embedding them:
//!
//! ```yaml
//! database:
//!   user: ((prod-db/Username))
//!   password: ((prod-db/Password))
//!   port: ((prod-db/Notes/port))
//! ```
//!
//! lpass-resolve replaces each placeholder with the JSON encoding of the
//! secret, fetched through the LastPass CLI (`lpass show`). JSON scalars are
//! valid YAML, so the result can be fed to either kind of parser.
//!
//! # Placeholder grammar
//!
//! - `((entry/field))` - the whole value of `field` in `entry`
//! - `((entry/field/subfield))` - `field` holds a YAML mapping; substitute the
//!   value of its top-level key `subfield` (string, number, boolean, list or map)
//!
//! `Password`, `Username`, `URL` and `Notes` are the built-in LastPass fields;
//! any other field name is read as a custom field.
//!
//! # Core Modules
//!
//! - [`placeholder`] - scanning documents and parsing handles
//! - [`fragment`] - YAML fragment extraction and JSON encoding
//! - [`cache`] - per-resolver credential cache with single-flight fetches
//! - [`store`] - the [`store::CredentialStore`] trait and the `lpass` client
//! - [`resolver`] - the engine tying the above together
//!
//! ## Supporting Modules
//! - [`cli`] - command-line interface
//! - [`config`] - TOML configuration (`~/.lpass-resolve/config.toml`)
//! - [`constants`] - shared defaults
//! - [`core`] - error types and user-facing error reporting
//!
//! # Library usage
//!
//! ```rust,no_run
//! use lpass_resolve::config::ResolverConfig;
//! use lpass_resolve::resolver::Resolver;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ResolverConfig::load()?;
//! let resolver = Resolver::from_config(&config);
//!
//! let rendered = resolver.process("token: ((ci/Notes/github_token))\n").await?;
//! print!("{rendered}");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod fragment;
pub mod placeholder;
pub mod resolver;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
