//! Test utilities for lpass-resolve
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration suite.
//!
//! - [`MockStore`] - in-memory [`CredentialStore`] with call counting
//! - [`init_test_logging`] - one-time tracing setup that writes through the test harness
//!
//! # Example
//!
//! ```rust,ignore
//! use lpass_resolve::resolver::Resolver;
//! use lpass_resolve::test_utils::MockStore;
//!
//! # async fn example() {
//! let store = MockStore::new().with_value("db", "Password", "s3cr3t");
//! let resolver = Resolver::new(store);
//!
//! let out = resolver.process("pw: ((db/Password))").await.unwrap();
//! assert_eq!(out, "pw: \"s3cr3t\"");
//! assert_eq!(resolver.store().calls("db", "Password"), 1);
//! # }
//! ```

use dashmap::DashMap;
use std::sync::Once;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::core::ResolveError;
use crate::store::CredentialStore;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging once per test binary.
///
/// With `level` set, logs at that level; otherwise honors `RUST_LOG` and
/// stays silent when it is unset.
///
/// ```bash
/// RUST_LOG=lpass=debug,cache=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

type Key = (String, String);

fn key(entry: &str, field: &str) -> Key {
    (entry.to_string(), field.to_string())
}

/// In-memory credential store for tests.
///
/// Unknown `(entry, field)` pairs fail with [`ResolveError::StoreFetch`], the
/// way `lpass show` fails for an entry that does not exist.
#[derive(Debug, Default)]
pub struct MockStore {
    values: DashMap<Key, String>,
    failures: DashMap<Key, ResolveError>,
    calls: DashMap<Key, usize>,
    total_calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret.
    #[must_use]
    pub fn with_value(self, entry: &str, field: &str, value: &str) -> Self {
        self.set_value(entry, field, value);
        self
    }

    /// Make every fetch of `(entry, field)` fail with `error`.
    #[must_use]
    pub fn with_failure(self, entry: &str, field: &str, error: ResolveError) -> Self {
        self.failures.insert(key(entry, field), error);
        self
    }

    /// Sleep for `delay` inside every fetch.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add or replace a secret after construction.
    pub fn set_value(&self, entry: &str, field: &str, value: &str) {
        self.values.insert(key(entry, field), value.to_string());
    }

    /// How many times `(entry, field)` was fetched.
    #[must_use]
    pub fn calls(&self, entry: &str, field: &str) -> usize {
        self.calls.get(&key(entry, field)).map_or(0, |count| *count)
    }

    /// How many fetches happened in total.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }
}

impl CredentialStore for MockStore {
    async fn fetch(&self, entry: &str, field: &str) -> Result<String, ResolveError> {
        let key = key(entry, field);
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self.calls.entry(key.clone()).or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.failures.get(&key).map(|error| error.value().clone()) {
            return Err(error);
        }

        self.values.get(&key).map(|value| value.value().clone()).ok_or_else(|| {
            ResolveError::StoreFetch {
                entry: entry.to_string(),
                field: field.to_string(),
                reason: "Could not find specified account".to_string(),
            }
        })
    }
}
