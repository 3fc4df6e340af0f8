//! Session Jar Core Library
//!
//! Persists HTTP session cookies on disk, isolated per account, so several
//! independent logins can live side by side on one machine and survive
//! process restarts.
//!
//! # Architecture
//!
//! - [`cookie`] - the [`Cookie`] value type and `Set-Cookie` parsing
//! - [`store`] - namespaces, partitions, the file codec, expiry pruning,
//!   the [`CookieJar`] facade and bulk clearing
//!
//! [`CookieJar`] also implements `reqwest::cookie::CookieStore`, so it can
//! be handed to `reqwest::ClientBuilder::cookie_provider` directly.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cookie;
pub mod store;

// Re-export commonly used types
pub use cookie::Cookie;
pub use store::{
    ClearReport, CookieJar, DiagnosticSink, JarConfig, LogSink, Operation, SortDescriptor,
    SortField, StoreError, clear_all,
};
