//! Error types and the failure-reporting channel for cookie storage.
//!
//! Only jar construction returns errors to a caller:
//! [`StoreError::StorageRootUnavailable`] and
//! [`StoreError::InvalidNamespaceKey`]. Every other failure is handed to a
//! [`DiagnosticSink`] and the surrounding operation carries on with the next
//! file.

use std::fmt;
use std::io;
use std::path::PathBuf;

use tracing::warn;

/// Errors for persisted cookie storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No usable base directory for cookie storage.
    #[error(
        "unable to determine cookie storage directory (set SESSION_JAR_DIR, XDG_DATA_HOME or HOME)"
    )]
    StorageRootUnavailable,
    /// The namespace key was rejected by the keyed hash.
    ///
    /// HMAC-SHA256 accepts keys of any length, so this is not produced with
    /// the current hash.
    #[error("namespace key is not usable for HMAC-SHA256")]
    InvalidNamespaceKey,
    /// Filesystem I/O failed on a specific path.
    #[error("filesystem operation failed on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A cookie file could not be encoded or decoded.
    #[error("cookie file '{}' could not be processed: {source}", path.display())]
    Codec {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
    /// A file in a domain partition does not follow the cookie file naming scheme.
    #[error("'{}' is not a valid cookie file name", path.display())]
    InvalidFileName { path: PathBuf },
    /// A cookie name cannot be used as a file name prefix.
    #[error("cookie name '{name}' cannot be stored as a file")]
    InvalidCookieName { name: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors from the cookie file codec.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization/deserialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The expiry lies outside what `SystemTime` or the file format can hold.
    #[error("expiry timestamp is out of range")]
    ExpiryOutOfRange,
}

/// The jar operation during which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Store,
    Load,
    Prune,
    Delete,
    RemoveSince,
    Clear,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Store => "store",
            Self::Load => "load",
            Self::Prune => "prune",
            Self::Delete => "delete",
            Self::RemoveSince => "remove_since",
            Self::Clear => "clear",
        };
        write!(f, "{label}")
    }
}

/// Receives the non-fatal failures that jar operations swallow.
///
/// Implementations must not panic; the jar calls them from inside its
/// enumeration loops.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, operation: Operation, error: &StoreError);
}

/// Default sink: emits a `tracing` warning and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, operation: Operation, error: &StoreError) {
        warn!(operation = %operation, error = %error, "Cookie storage operation failed");
    }
}
