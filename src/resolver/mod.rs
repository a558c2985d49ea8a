//! Placeholder resolution engine.
//!
//! A [`Resolver`] scans a document for `((entry/field[/subfield]))`
//! placeholders and replaces each with the JSON encoding of its secret:
//!
//! ```text
//! document ─► scan ─► parse handle ─► cache / store fetch ─► fragment extraction ─► JSON ─► output
//! ```
//!
//! Each distinct `(entry, field)` pair is fetched at most once per resolver,
//! however many placeholders or documents reference it. The resolver is
//! `Send + Sync` when its store is, so one instance can serve concurrent
//! documents (see [`Resolver::process_all`]).
//!
//! # Failure handling
//!
//! [`UnresolvedPolicy::Abort`] stops at the first failing placeholder and
//! returns its error; no partial output is produced.
//! [`UnresolvedPolicy::Marker`] replaces each failing placeholder with
//! `((!unresolved HANDLE))` and records the failure in the [`ProcessReport`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use lpass_resolve::resolver::Resolver;
//! use lpass_resolve::store::LpassStore;
//!
//! # async fn example() -> Result<(), lpass_resolve::core::ResolveError> {
//! let resolver = Resolver::new(LpassStore::default());
//! let output = resolver.process("password: ((db/Password))\n").await?;
//! println!("{output}");
//! # Ok(())
//! # }
//! ```

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cache::CredentialCache;
use crate::config::ResolverConfig;
use crate::constants::UNRESOLVED_MARKER_PREFIX;
use crate::core::ResolveError;
use crate::fragment;
use crate::placeholder::{Handle, Placeholder, find_placeholders};
use crate::store::{CredentialStore, LpassStore};

/// What to do with a placeholder that fails to resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Return the first error; produce no output.
    #[default]
    Abort,
    /// Substitute `((!unresolved HANDLE))` and keep going.
    Marker,
}

impl fmt::Display for UnresolvedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Marker => write!(f, "marker"),
        }
    }
}

/// A placeholder that could not be resolved under [`UnresolvedPolicy::Marker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedPlaceholder {
    /// Raw handle text between the delimiters
    pub handle: String,
    /// Why it failed
    pub error: ResolveError,
}

/// Result of processing one document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessReport {
    /// The document with every placeholder substituted or marked
    pub output: String,
    /// Number of placeholders replaced with a value
    pub resolved: usize,
    /// Placeholders replaced with a marker, in document order
    pub failures: Vec<UnresolvedPlaceholder>,
}

impl ProcessReport {
    /// Whether every placeholder resolved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The text substituted for a failing placeholder under the marker policy.
#[must_use]
pub fn unresolved_marker(handle: &str) -> String {
    format!("(({UNRESOLVED_MARKER_PREFIX}{handle}))")
}

/// Resolves credential placeholders against a [`CredentialStore`].
#[derive(Debug)]
pub struct Resolver<S> {
    store: S,
    cache: CredentialCache,
    policy: UnresolvedPolicy,
}

impl Resolver<LpassStore> {
    /// Resolver backed by `lpass`, configured from `config`.
    #[must_use]
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::with_config(LpassStore::from_config(config), config)
    }
}

impl<S: CredentialStore> Resolver<S> {
    /// Resolver with an empty cache and the abort policy.
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: CredentialCache::default(),
            policy: UnresolvedPolicy::default(),
        }
    }

    /// Resolver using the cache and failure settings from `config`.
    pub fn with_config(store: S, config: &ResolverConfig) -> Self {
        Self {
            store,
            cache: CredentialCache::new(config.cache_empty_values),
            policy: config.on_error,
        }
    }

    /// Replace the failure policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: UnresolvedPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The active failure policy.
    #[must_use]
    pub const fn policy(&self) -> UnresolvedPolicy {
        self.policy
    }

    /// The credential cache owned by this resolver.
    #[must_use]
    pub const fn cache(&self) -> &CredentialCache {
        &self.cache
    }

    /// The underlying credential store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Trimmed secret for `(entry, field)`, fetched at most once.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the fetch fails.
    pub async fn credential(&self, entry: &str, field: &str) -> Result<String, ResolveError> {
        self.cache.get_or_fetch(entry, field, || self.store.fetch(entry, field)).await
    }

    /// Resolve one raw handle to its JSON-encoded replacement text.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::MalformedHandle`] before any store access
    /// - store errors from [`Resolver::credential`]
    /// - fragment and encoding errors from the subfield lookup
    pub async fn resolve_handle(&self, raw: &str) -> Result<String, ResolveError> {
        let handle = Handle::parse(raw)?;
        let credential = self.credential(handle.entry(), handle.field()).await?;
        let rendered = fragment::render(&handle, &credential)?;

        tracing::debug!(target: "resolver", "Resolved {}", handle);
        Ok(rendered)
    }

    /// Substitute every placeholder in `document`.
    ///
    /// Under the marker policy failing placeholders become markers and this
    /// still returns `Ok`; use [`Resolver::process_with_report`] to see them.
    ///
    /// # Errors
    ///
    /// Under [`UnresolvedPolicy::Abort`], the first placeholder error.
    pub async fn process(&self, document: &str) -> Result<String, ResolveError> {
        self.process_with_report(document).await.map(|report| report.output)
    }

    /// Substitute every placeholder in `document` and report what failed.
    ///
    /// Placeholders are resolved one at a time, left to right.
    ///
    /// # Errors
    ///
    /// Under [`UnresolvedPolicy::Abort`], the first placeholder error.
    pub async fn process_with_report(&self, document: &str) -> Result<ProcessReport, ResolveError> {
        let placeholders: Vec<Placeholder<'_>> = find_placeholders(document).collect();
        tracing::debug!(target: "resolver", "Found {} placeholders", placeholders.len());

        let mut report = ProcessReport {
            output: String::with_capacity(document.len()),
            ..ProcessReport::default()
        };
        let mut copied_up_to = 0;

        for placeholder in placeholders {
            report.output.push_str(&document[copied_up_to..placeholder.span.0]);

            match self.resolve_handle(placeholder.handle).await {
                Ok(value) => {
                    report.output.push_str(&value);
                    report.resolved += 1;
                }
                Err(error) => match self.policy {
                    UnresolvedPolicy::Abort => return Err(error),
                    UnresolvedPolicy::Marker => {
                        tracing::warn!(target: "resolver", "Leaving (({})) unresolved: {}", placeholder.handle, error);
                        report.output.push_str(&unresolved_marker(placeholder.handle));
                        report.failures.push(UnresolvedPlaceholder {
                            handle: placeholder.handle.to_string(),
                            error,
                        });
                    }
                },
            }

            copied_up_to = placeholder.span.1;
        }

        report.output.push_str(&document[copied_up_to..]);
        Ok(report)
    }

    /// Process several documents concurrently against this resolver's cache.
    ///
    /// One [`ProcessReport`] is returned per document, in input order, so
    /// marker-policy failures stay attributable to their document. A key
    /// shared between documents is still fetched only once.
    ///
    /// # Errors
    ///
    /// Under [`UnresolvedPolicy::Abort`], the first error from any document.
    pub async fn process_all<D: AsRef<str>>(
        &self,
        documents: &[D],
    ) -> Result<Vec<ProcessReport>, ResolveError> {
        try_join_all(documents.iter().map(|document| self.process_with_report(document.as_ref())))
            .await
    }
}
