//! Configuration for lpass-resolve.
//!
//! Settings come from an optional TOML file, by default
//! `~/.lpass-resolve/config.toml`:
//!
//! ```toml
//! lpass_command = "lpass"        # store binary
//! timeout_secs = 300             # 0 disables the timeout
//! cache_empty_values = true      # treat empty secrets as cached
//! on_error = "abort"             # or "marker"
//! ```
//!
//! A missing file yields [`ResolverConfig::default`]. Command-line flags are
//! applied on top of the loaded values by the CLI.
//!
//! # Modules
//!
//! - `parser` - generic TOML file parsing with path context
//! - `resolver` - [`ResolverConfig`] and its loading rules

mod parser;
mod resolver;

pub use parser::parse_config;
pub use resolver::{ResolverConfig, expand_path};
