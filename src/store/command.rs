//! Builder for a single `lpass show` invocation.
//!
//! This module runs the LastPass CLI with the stdio layout the tool needs:
//! stdin and stderr are inherited so `lpass` can prompt for the master
//! password, and stdout is captured as the secret.

use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

use crate::constants::DEFAULT_STORE_TIMEOUT;
use crate::core::ResolveError;
use crate::store::lpass::field_flag;

/// One `lpass show <flag> <entry>` command.
///
/// # Examples
///
/// ```rust,no_run
/// use lpass_resolve::store::LpassCommand;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), lpass_resolve::core::ResolveError> {
/// let password = LpassCommand::show("lpass", "db", "Password")
///     .with_timeout(Some(Duration::from_secs(30)))
///     .execute_stdout()
///     .await?;
/// # Ok(())
/// # }
/// ```
///
/// # Default Configuration
///
/// - **Timeout**: 5 minutes
/// - **stdin / stderr**: inherited from the current process
/// - **stdout**: captured
#[derive(Debug, Clone)]
pub struct LpassCommand {
    /// Executable to run (usually `lpass`)
    program: String,

    /// Arguments passed to the executable
    args: Vec<String>,

    /// Entry being fetched, for error messages
    entry: String,

    /// Field being fetched, for error messages
    field: String,

    /// Maximum duration to wait for the command (None = no timeout)
    timeout_duration: Option<Duration>,
}

impl LpassCommand {
    /// Build `program show <flag> <entry>` for one field of an entry.
    pub fn show(program: impl Into<String>, entry: &str, field: &str) -> Self {
        Self {
            program: program.into(),
            args: vec!["show".to_string(), field_flag(field), entry.to_string()],
            entry: entry.to_string(),
            field: field.to_string(),
            timeout_duration: Some(DEFAULT_STORE_TIMEOUT),
        }
    }

    /// Set a custom timeout for the command (None for no timeout).
    #[must_use]
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Arguments the command will run with.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Execute the command and return its stdout, trimmed.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::StoreUnavailable`] if the program cannot be found
    /// - [`ResolveError::StoreFetch`] if spawning fails or the exit status is non-zero
    /// - [`ResolveError::StoreTimeout`] if the timeout expires; the child is killed
    pub async fn execute_stdout(self) -> Result<String, ResolveError> {
        let start = Instant::now();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::inherit())
            .stderr(Stdio::inherit())
            .stdout(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            target: "lpass",
            "Executing command: {} {}",
            self.program,
            self.args.join(" ")
        );

        let child = cmd.spawn().map_err(|e| self.spawn_error(&e))?;
        let output_future = child.wait_with_output();

        let output = if let Some(duration) = self.timeout_duration {
            if let Ok(result) = timeout(duration, output_future).await {
                result.map_err(|e| self.fetch_error(e.to_string()))?
            } else {
                tracing::warn!(
                    target: "lpass",
                    "Command timed out after {} seconds: {} {}",
                    duration.as_secs(),
                    self.program,
                    self.args.join(" ")
                );
                return Err(ResolveError::StoreTimeout {
                    entry: self.entry,
                    field: self.field,
                    seconds: duration.as_secs(),
                });
            }
        } else {
            output_future.await.map_err(|e| self.fetch_error(e.to_string()))?
        };

        if !output.status.success() {
            tracing::debug!(
                target: "lpass",
                "Command failed with exit code: {:?}",
                output.status.code()
            );
            return Err(self.fetch_error(format!("{} exited with {}", self.program, output.status)));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| self.fetch_error("output is not valid UTF-8".to_string()))?;

        let elapsed = start.elapsed();
        if elapsed.as_secs() > 1 {
            tracing::info!(target: "lpass::perf", "Fetching {}/{} took {:.2}s", self.entry, self.field, elapsed.as_secs_f64());
        } else {
            tracing::debug!(target: "lpass::perf", "Fetching {}/{} took {}ms", self.entry, self.field, elapsed.as_millis());
        }

        Ok(stdout.trim().to_string())
    }

    fn spawn_error(&self, error: &std::io::Error) -> ResolveError {
        if error.kind() == std::io::ErrorKind::NotFound {
            ResolveError::StoreUnavailable {
                command: self.program.clone(),
            }
        } else {
            self.fetch_error(format!("failed to run {}: {error}", self.program))
        }
    }

    fn fetch_error(&self, reason: String) -> ResolveError {
        ResolveError::StoreFetch {
            entry: self.entry.clone(),
            field: self.field.clone(),
            reason,
        }
    }
}
