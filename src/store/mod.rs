//! Credential store interface.
//!
//! The resolution engine never spawns processes itself. It talks to a
//! [`CredentialStore`], which maps an `(entry, field)` pair to raw secret
//! text. The shipped implementation, [`LpassStore`], shells out to the
//! LastPass CLI; tests substitute an in-memory store.
//!
//! # Modules
//!
//! - `command` - builder for a single `lpass show` invocation with timeout handling
//! - `lpass` - [`LpassStore`] and the field-name to flag mapping

pub mod command;
pub mod lpass;

pub use command::LpassCommand;
pub use lpass::{LpassStore, field_flag};

use std::future::Future;
use std::sync::Arc;

use crate::core::ResolveError;

/// Source of raw secret text for the resolver.
///
/// Implementations return the secret for `field` of `entry`. Leading and
/// trailing whitespace is trimmed by the cache, so implementations may return
/// output verbatim.
pub trait CredentialStore: Send + Sync {
    /// Fetch the raw secret for one `(entry, field)` pair.
    fn fetch(
        &self,
        entry: &str,
        field: &str,
    ) -> impl Future<Output = Result<String, ResolveError>> + Send;
}

impl<S: CredentialStore> CredentialStore for Arc<S> {
    fn fetch(
        &self,
        entry: &str,
        field: &str,
    ) -> impl Future<Output = Result<String, ResolveError>> + Send {
        self.as_ref().fetch(entry, field)
    }
}
