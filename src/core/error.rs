//! Error handling for lpass-resolve
//!
//! This module provides the typed error returned by every resolution operation
//! and the user-friendly wrapper the CLI prints. The error system follows two
//! principles:
//! 1. **Strongly-typed errors** so callers can decide per placeholder whether a
//!    failure aborts the whole document or is replaced with a marker
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`ResolveError`] - Enumerated failure modes of the resolution engine
//! - [`ErrorContext`] - Wrapper that adds details and a suggestion for display
//! - [`user_friendly_error`] - Convert any [`anyhow::Error`] into an [`ErrorContext`]
//!
//! Library code never terminates the process. Every failure travels back to
//! the caller as a value; only the binary decides to exit.
//!
//! # Examples
//!
//! ```rust,no_run
//! use lpass_resolve::core::{ResolveError, user_friendly_error};
//!
//! let error = ResolveError::MalformedHandle {
//!     handle: "secrets".to_string(),
//!     reason: "expected entry/field or entry/field/subfield".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // colored error, details and suggestion on stderr
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The error type for all resolution operations.
///
/// # Error Categories
///
/// ## Placeholder grammar
/// - [`MalformedHandle`](ResolveError::MalformedHandle) - handle does not split into 2 or 3 usable parts
///
/// ## Structured fragments
/// - [`FragmentParse`](ResolveError::FragmentParse) - secret is not a YAML mapping
/// - [`MissingFragmentKey`](ResolveError::MissingFragmentKey) - requested key is absent
/// - [`Encoding`](ResolveError::Encoding) - resolved value has no JSON representation
///
/// ## Credential store
/// - [`StoreFetch`](ResolveError::StoreFetch) - the store command failed
/// - [`StoreTimeout`](ResolveError::StoreTimeout) - the store command did not finish in time
/// - [`StoreUnavailable`](ResolveError::StoreUnavailable) - the store command is not installed
///
/// Secret values never appear in any variant; only entry, field and key names do.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A placeholder handle could not be split into `entry/field[/subfield]`.
    ///
    /// Raised for handles with fewer than two components, more than three
    /// components, or an empty entry or field name.
    #[error("Malformed credential handle '{handle}': {reason}")]
    MalformedHandle {
        /// The raw handle text found between the delimiters
        handle: String,
        /// Why the handle was rejected
        reason: String,
    },

    /// A subfield was requested but the secret is not a structured mapping.
    #[error("Credential '{entry}/{field}' is not a valid structured document: {reason}")]
    FragmentParse {
        /// Store entry name
        entry: String,
        /// Field of the entry holding the document
        field: String,
        /// Parser message (never contains the secret itself)
        reason: String,
    },

    /// The requested subfield does not exist in the parsed mapping.
    #[error("Could not find key '{key}' in credential '{entry}/{field}'")]
    MissingFragmentKey {
        /// Store entry name
        entry: String,
        /// Field of the entry holding the document
        field: String,
        /// The missing top-level key
        key: String,
    },

    /// The credential store command failed to run or exited non-zero.
    #[error("Failed to fetch '{entry}/{field}' from the credential store: {reason}")]
    StoreFetch {
        /// Store entry name
        entry: String,
        /// Requested field
        field: String,
        /// Spawn error or exit status description
        reason: String,
    },

    /// The credential store command exceeded the configured timeout.
    #[error("Fetching '{entry}/{field}' timed out after {seconds} seconds")]
    StoreTimeout {
        /// Store entry name
        entry: String,
        /// Requested field
        field: String,
        /// Timeout that expired
        seconds: u64,
    },

    /// The credential store executable could not be located.
    #[error("Credential store command '{command}' is not installed or not found in PATH")]
    StoreUnavailable {
        /// The command that was looked up
        command: String,
    },

    /// The resolved value could not be serialized as JSON.
    #[error("Failed to encode value for '{handle}' as JSON: {reason}")]
    Encoding {
        /// Handle whose value failed to encode
        handle: String,
        /// Serializer message
        reason: String,
    },

    /// Any other failure, used by [`user_friendly_error`] for foreign errors.
    #[error("{message}")]
    Other {
        /// Full error message including its cause chain
        message: String,
    },
}

impl ResolveError {
    /// Whether this failure came from talking to the credential store rather
    /// than from the document or the secret's contents.
    #[must_use]
    pub const fn is_store_error(&self) -> bool {
        matches!(
            self,
            Self::StoreFetch { .. } | Self::StoreTimeout { .. } | Self::StoreUnavailable { .. }
        )
    }
}

/// Error wrapper with user-facing details and a suggestion.
///
/// The binary converts every error into an `ErrorContext` before printing it,
/// so users see what failed, why it usually fails, and what to try next.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ResolveError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with no suggestion or details.
    #[must_use]
    pub const fn new(error: ResolveError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors.
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`].
///
/// Recognizes:
/// - [`ResolveError`] variants (also when wrapped in `anyhow` context)
/// - [`std::io::Error`] with filesystem guidance
/// - [`toml::de::Error`] with config syntax guidance
///
/// Anything else becomes [`ResolveError::Other`] carrying the full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(resolve_error) = error.downcast_ref::<ResolveError>() {
        return create_error_context(resolve_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        let message = chain_message(&error);
        match io_error.kind() {
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(ResolveError::Other {
                    message,
                })
                .with_suggestion("Check that the input file exists and the path is correct");
            }
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(ResolveError::Other {
                    message,
                })
                .with_suggestion("Check the permissions of the input and output files");
            }
            _ => {}
        }
    }

    if error.downcast_ref::<toml::de::Error>().is_some() {
        return ErrorContext::new(ResolveError::Other {
            message: chain_message(&error),
        })
        .with_suggestion("Check the TOML syntax in your lpass-resolve config file")
        .with_details(
            "Supported keys: lpass_command, timeout_secs, cache_empty_values, on_error",
        );
    }

    ErrorContext::new(ResolveError::Other {
        message: chain_message(&error),
    })
}

/// Render an error and its causes as one message.
fn chain_message(error: &anyhow::Error) -> String {
    let mut message = error.to_string();

    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    message
}

/// Map each [`ResolveError`] variant to tailored details and suggestions.
fn create_error_context(error: ResolveError) -> ErrorContext {
    match &error {
        ResolveError::MalformedHandle { .. } => ErrorContext::new(error)
            .with_suggestion("Write placeholders as ((entry/field)) or ((entry/field/subfield))")
            .with_details("The text between (( and )) must name a store entry and a field separated by '/'"),

        ResolveError::FragmentParse { field, .. } => {
            let suggestion = format!(
                "Make sure the '{field}' field holds 'key: value' lines, or drop the subfield to use the whole value"
            );
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("A third handle component asks for one key of a YAML document stored in the field")
        }

        ResolveError::MissingFragmentKey { entry, field, .. } => {
            let suggestion = format!(
                "Run 'lpass show {} {entry}' to see the available keys",
                crate::store::lpass::field_flag(field)
            );
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("Keys are matched exactly and only at the top level of the document")
        }

        ResolveError::StoreFetch { .. } => ErrorContext::new(error)
            .with_suggestion("Check that you are logged in with 'lpass login' and that the entry name is correct")
            .with_details("The credential store command exited with an error"),

        ResolveError::StoreTimeout { .. } => ErrorContext::new(error)
            .with_suggestion("Log in with 'lpass login' before running, or raise the limit with --timeout")
            .with_details("lpass may be waiting for a password prompt that nobody is answering"),

        ResolveError::StoreUnavailable { .. } => ErrorContext::new(error)
            .with_suggestion("Install lastpass-cli (e.g. 'brew install lastpass-cli', 'apt install lastpass-cli') or set lpass_command in the config")
            .with_details("lpass-resolve shells out to the LastPass CLI to read secrets"),

        ResolveError::Encoding { .. } => ErrorContext::new(error)
            .with_details("Structured values must use string keys to be representable as JSON"),

        ResolveError::Other { .. } => ErrorContext::new(error),
    }
}
