//! Per-resolver credential cache with single-flight fetching.
//!
//! Every distinct `(entry, field)` pair is fetched from the credential store at
//! most once per [`CredentialCache`] instance. The cache lives as long as the
//! resolver that owns it: one document run for the CLI, or longer when a
//! resolver is reused across documents.
//!
//! # Concurrency
//!
//! - Values live in a [`DashMap`] so concurrent readers never block each other
//! - Fetches are guarded by a per-key async mutex. The first caller for a key
//!   performs the fetch; concurrent callers for the same key wait on the mutex
//!   and then find the value already cached
//! - A failed fetch stores nothing, so the next caller retries
//!
//! # Empty values
//!
//! With `cache_empty_values` enabled (the default), an empty secret counts as
//! cached like any other value. With it disabled, an empty cached value is
//! treated as never fetched and the store is asked again on the next access.

use dashmap::DashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

use crate::core::ResolveError;

/// Composite cache key for one `(entry, field)` pair.
///
/// Stored as a pair rather than a joined string, so no separator can make two
/// different pairs collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    entry: String,
    field: String,
}

impl CacheKey {
    /// Build a key from an entry and field name.
    pub fn new(entry: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.entry, self.field)
    }
}

/// Memoizes credential fetches per `(entry, field)` pair.
#[derive(Debug)]
pub struct CredentialCache {
    /// Trimmed secret per key
    values: DashMap<CacheKey, String>,

    /// Per-key barrier that keeps at most one fetch in flight for each key
    fetch_locks: DashMap<CacheKey, Arc<Mutex<()>>>,

    /// Whether an empty secret counts as cached
    cache_empty_values: bool,

    /// Store fetches started, including failed ones
    fetches: AtomicUsize,
}

impl Default for CredentialCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CredentialCache {
    /// Create an empty cache.
    ///
    /// `cache_empty_values = false` keeps re-fetching secrets that came back
    /// empty instead of caching them.
    #[must_use]
    pub fn new(cache_empty_values: bool) -> Self {
        Self {
            values: DashMap::new(),
            fetch_locks: DashMap::new(),
            cache_empty_values,
            fetches: AtomicUsize::new(0),
        }
    }

    /// Return the cached secret for `(entry, field)`, fetching it on a miss.
    ///
    /// `fetch` is only invoked when no usable value is cached and no other
    /// task is already fetching the same key. Its output is trimmed before it
    /// is stored and returned.
    ///
    /// # Errors
    ///
    /// Returns whatever error `fetch` returns; nothing is cached in that case.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        entry: &str,
        field: &str,
        fetch: F,
    ) -> Result<String, ResolveError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, ResolveError>>,
    {
        let key = CacheKey::new(entry, field);

        if let Some(value) = self.lookup(&key) {
            tracing::trace!(target: "cache", "Cache hit for {}", key);
            return Ok(value);
        }

        let barrier = self
            .fetch_locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = barrier.lock().await;

        // Another task may have finished the fetch while we waited
        if let Some(value) = self.lookup(&key) {
            tracing::debug!(target: "cache", "Joined in-flight fetch for {}", key);
            return Ok(value);
        }

        tracing::debug!(target: "cache", "Cache miss for {}, fetching", key);
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let value = fetch().await?.trim().to_string();
        self.values.insert(key, value.clone());

        Ok(value)
    }

    /// Whether a usable value is cached for `(entry, field)`.
    #[must_use]
    pub fn contains(&self, entry: &str, field: &str) -> bool {
        self.lookup(&CacheKey::new(entry, field)).is_some()
    }

    /// Number of cached keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Number of store fetches started so far.
    ///
    /// Differs from [`CredentialCache::len`] when fetches failed and were
    /// retried, or when empty values are re-fetched.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Whether nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn lookup(&self, key: &CacheKey) -> Option<String> {
        self.values
            .get(key)
            .map(|value| value.value().clone())
            .filter(|value| self.cache_empty_values || !value.is_empty())
    }
}
