//! Core types for lpass-resolve
//!
//! This module holds the error types shared by every other module:
//! - [`ResolveError`] - typed failure modes of the resolution engine
//! - [`ErrorContext`] - user-friendly wrapper with details and suggestions
//! - [`user_friendly_error`] - convert any error for CLI display

pub mod error;

pub use error::{ErrorContext, ResolveError, user_friendly_error};
