//! Integration test suite for lpass-resolve
//!
//! End-to-end tests for the resolution library and the `lpass-resolve`
//! binary. The binary tests run against a fake `lpass` shell script, so they
//! never touch a real LastPass account.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **common**: the fake `lpass` fixture
//! - **library**: [`Resolver`](lpass_resolve::resolver::Resolver) driven through the public API
//! - **cli**: the binary driven through `assert_cmd` (Unix only)

#[cfg(unix)]
mod common;

#[cfg(unix)]
mod cli;
mod library;
