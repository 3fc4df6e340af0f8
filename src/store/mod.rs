//! File-backed cookie persistence, one namespace per account identifier.
//!
//! # Layout
//!
//! ```text
//! <storage root>/<hex hmac-sha256(key, identifier)>/storage_<domain>/<name>_-_<millis>_-_<suffix>.cookiedata
//! ```
//!
//! # Modules
//!
//! - [`namespace`] - identifier to directory name
//! - [`layout`] - domain partitions and cookie file names
//! - [`codec`] - single cookie file format
//! - [`sweeper`] - expiry pruning on read
//! - [`jar`] - the [`CookieJar`] facade
//! - [`clear`] - bulk clearing across namespaces
//! - `http` - `reqwest::cookie::CookieStore` for [`CookieJar`]

pub mod clear;
pub mod codec;
pub mod config;
pub mod error;
mod http;
pub mod jar;
pub mod layout;
pub mod namespace;
pub mod sweeper;

pub use clear::{ClearReport, clear_all, clear_all_reporting, clear_all_with_prefix};
pub use config::{
    DEFAULT_NAMESPACE_KEY, DEFAULT_PROTECTED_PREFIX, JarConfig, NAMESPACE_KEY_ENV,
    STORAGE_DIR_ENV, default_storage_root,
};
pub use error::{CodecError, DiagnosticSink, LogSink, Operation, StoreError};
pub use http::request_cookie_header;
pub use jar::{CookieJar, SortDescriptor, SortField, sort_cookies};
