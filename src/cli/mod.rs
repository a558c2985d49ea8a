//! Command-line interface for lpass-resolve.
//!
//! ```text
//! lpass-resolve [OPTIONS] [INPUT]
//! ```
//!
//! Reads a document from `INPUT` (or stdin when it is omitted or `-`),
//! replaces every `((entry/field[/subfield]))` placeholder with the
//! JSON-encoded secret from LastPass, and writes the result to stdout or
//! `--output`.
//!
//! # Output streams
//!
//! stdout carries only the document. Logs, unresolved-placeholder reports and
//! errors go to stderr, so `lpass-resolve app.yml > app.resolved.yml` is safe.
//!
//! # Exit status
//!
//! `0` when every placeholder resolved, `1` on any error. With
//! `--keep-going` the document is still written, but the status is `1` if any
//! placeholder was left unresolved.
//!
//! # Settings precedence
//!
//! 1. Command-line flags (`--timeout`, `--lpass-command`, `--keep-going`)
//! 2. The config file (`--config`, `LPASS_RESOLVE_CONFIG`, or `~/.lpass-resolve/config.toml`)
//! 3. Built-in defaults

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::EnvFilter;

use crate::config::ResolverConfig;
use crate::constants::CONFIG_PATH_ENV;
use crate::placeholder::{find_placeholders, has_placeholders};
use crate::resolver::{ProcessReport, Resolver, UnresolvedPolicy};

/// Runtime settings derived from the global flags.
///
/// Kept separate from [`Cli`] so tests can drive
/// [`Cli::execute_with_config`] without touching the process-wide logger.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,

    /// Explicit config file path, if any
    pub config_path: Option<String>,
}

impl CliConfig {
    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// `RUST_LOG` takes precedence over [`CliConfig::log_level`]. Calling this
    /// twice is harmless; the second call is ignored.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init();
    }
}

/// Resolve LastPass placeholders in a configuration document.
#[derive(Parser, Debug)]
#[command(
    name = "lpass-resolve",
    about = "Replace ((entry/field)) placeholders with secrets from LastPass",
    version,
    long_about = "Reads a document, replaces every ((entry/field)) or ((entry/field/subfield)) \
                  placeholder with the JSON-encoded secret fetched through the LastPass CLI, \
                  and writes the result. Each entry/field pair is fetched once per run."
)]
pub struct Cli {
    /// Input document; omit or use `-` to read stdin
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Write the resolved document here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Print the placeholder handles in the document, one per line, without
    /// contacting LastPass
    #[arg(long)]
    list: bool,

    /// Replace failing placeholders with ((!unresolved HANDLE)) instead of
    /// aborting; exits 1 if any failed
    #[arg(long)]
    keep_going: bool,

    /// Seconds to wait for each lpass invocation (0 disables the limit)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// LastPass CLI executable to run
    #[arg(long, value_name = "CMD")]
    lpass_command: Option<String>,

    /// Path to the config file
    #[arg(short, long, value_name = "PATH", env = CONFIG_PATH_ENV)]
    config: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Run the CLI: set up logging, then resolve.
    ///
    /// # Errors
    ///
    /// Returns any input, config, resolution or output error, and an error when
    /// placeholders were left unresolved under `--keep-going`.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    ///
    /// - `--verbose` logs at `debug`
    /// - `--quiet` logs at `error`
    /// - otherwise `warn`
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig {
            log_level: log_level.to_string(),
            config_path: self.config.clone(),
        }
    }

    /// Run with an explicit [`CliConfig`] and no logging setup.
    ///
    /// # Errors
    ///
    /// See [`Cli::execute`].
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        let document = self.read_input().await?;

        if self.list {
            let listing: String =
                find_placeholders(&document).map(|placeholder| format!("{}\n", placeholder.handle)).collect();
            return self.write_output(&listing).await;
        }

        let settings = self.resolver_config(&config)?;
        let resolver = Resolver::from_config(&settings);

        if has_placeholders(&document) {
            let path = resolver.store().ensure_available()?;
            tracing::debug!(target: "lpass", "Using {}", path.display());
        }

        let report = resolver
            .process_with_report(&document)
            .await
            .with_context(|| format!("Failed to resolve {}", self.input_name()))?;

        tracing::debug!(
            target: "resolver",
            "Resolved {} placeholders from {} distinct credentials in {} store fetches",
            report.resolved,
            resolver.cache().len(),
            resolver.cache().fetch_count()
        );

        self.write_output(&report.output).await?;
        report_unresolved(&report)
    }

    /// Load the config file and apply command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn resolver_config(&self, config: &CliConfig) -> Result<ResolverConfig> {
        let mut settings = ResolverConfig::load_with_optional(config.config_path.as_deref())?;

        if let Some(command) = &self.lpass_command {
            settings.lpass_command.clone_from(command);
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_secs = timeout;
        }
        if self.keep_going {
            settings.on_error = UnresolvedPolicy::Marker;
        }

        Ok(settings)
    }

    fn reads_stdin(&self) -> bool {
        self.input.as_deref().is_none_or(|path| path == Path::new("-"))
    }

    fn input_name(&self) -> String {
        match &self.input {
            Some(path) if !self.reads_stdin() => path.display().to_string(),
            _ => "<stdin>".to_string(),
        }
    }

    async fn read_input(&self) -> Result<String> {
        match &self.input {
            Some(path) if !self.reads_stdin() => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read input file: {}", path.display())),
            _ => {
                let mut document = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut document)
                    .await
                    .context("Failed to read document from stdin")?;
                Ok(document)
            }
        }
    }

    async fn write_output(&self, text: &str) -> Result<()> {
        if let Some(path) = &self.output {
            tokio::fs::write(path, text)
                .await
                .with_context(|| format!("Failed to write output file: {}", path.display()))
        } else {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(text.as_bytes()).await.context("Failed to write to stdout")?;
            stdout.flush().await.context("Failed to write to stdout")
        }
    }
}

/// Print each unresolved placeholder to stderr and fail if there were any.
fn report_unresolved(report: &ProcessReport) -> Result<()> {
    if report.is_complete() {
        return Ok(());
    }

    for failure in &report.failures {
        eprintln!("{}: (({})): {}", "unresolved".yellow().bold(), failure.handle, failure.error);
    }

    anyhow::bail!(
        "{} of {} placeholders could not be resolved",
        report.failures.len(),
        report.failures.len() + report.resolved
    )
}
