//! The persistent cookie jar facade.

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, instrument};
use url::Url;

use super::codec;
use super::config::JarConfig;
use super::error::{CodecError, DiagnosticSink, LogSink, Operation, StoreError};
use super::layout::{self, CookieFileName, Listing};
use super::namespace;
use super::sweeper::{self, LoadedCookie, remove_file};
use crate::cookie::Cookie;

/// Field a [`SortDescriptor`] orders by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Domain,
    Path,
    /// Session cookies sort before cookies with an expiry.
    Expires,
    Value,
}

/// One key of a multi-key sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortDescriptor {
    pub field: SortField,
    pub ascending: bool,
}

impl SortDescriptor {
    #[must_use]
    pub fn ascending(field: SortField) -> Self {
        Self {
            field,
            ascending: true,
        }
    }

    #[must_use]
    pub fn descending(field: SortField) -> Self {
        Self {
            field,
            ascending: false,
        }
    }

    fn compare(self, left: &Cookie, right: &Cookie) -> Ordering {
        let ordering = match self.field {
            SortField::Name => left.name.cmp(&right.name),
            SortField::Domain => left.domain.cmp(&right.domain),
            SortField::Path => left.path.cmp(&right.path),
            SortField::Expires => left.expires.cmp(&right.expires),
            SortField::Value => left.value().cmp(right.value()),
        };
        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

/// Stable multi-key sort; the first descriptor is the most significant.
pub fn sort_cookies(cookies: &mut [Cookie], descriptors: &[SortDescriptor]) {
    cookies.sort_by(|left, right| {
        descriptors
            .iter()
            .map(|descriptor| descriptor.compare(left, right))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

/// Cookie storage isolated to one account identifier.
///
/// Every cookie lives in its own file below
/// `<root>/<hmac(identifier)>/storage_<domain>/`. Operations never fail
/// after construction: I/O and decode problems go to the jar's
/// [`DiagnosticSink`] and the operation continues with the next file.
///
/// There is no locking. Two jars (or two processes) writing the same
/// cookie at once can leave both files behind until the next `store`.
#[derive(Clone)]
pub struct CookieJar {
    namespace_dir: PathBuf,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl CookieJar {
    /// Opens the jar for `identifier` under the default storage root.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageRootUnavailable`] when no storage root
    /// can be resolved from the environment, or any error of
    /// [`open`](Self::open).
    pub fn new(identifier: &str) -> Result<Self, StoreError> {
        Self::open(identifier, &JarConfig::from_env()?)
    }

    /// Opens the jar for `identifier` under `config`.
    ///
    /// Nothing is created on disk until the first `store`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidNamespaceKey`] if the configured key is
    /// rejected by the HMAC.
    pub fn open(identifier: &str, config: &JarConfig) -> Result<Self, StoreError> {
        let namespace_dir =
            namespace::namespace_dir(&config.storage_root, identifier, &config.namespace_key)?;
        debug!(namespace = %namespace_dir.display(), "Opened cookie jar");
        Ok(Self {
            namespace_dir,
            diagnostics: Arc::new(LogSink),
        })
    }

    /// Routes swallowed failures to `diagnostics` instead of the log.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// The namespace directory of this jar.
    #[must_use]
    pub fn namespace_dir(&self) -> &Path {
        &self.namespace_dir
    }

    /// Persists `cookie`, replacing any earlier file for the same name.
    ///
    /// The partition is the host of `url` when given, else the cookie's
    /// domain. After the new file is written, every other file in that
    /// partition whose name *starts with* the cookie name is removed, so
    /// storing `a` also evicts `ab`. Whether prefix eviction should become
    /// an exact name match is an open question; the prefix behavior is kept
    /// for compatibility with existing stores.
    #[instrument(level = "debug", skip(self, cookie, url), fields(name = %cookie.name))]
    pub fn store(&self, cookie: &Cookie, url: Option<&Url>) {
        if !is_storable_name(&cookie.name) {
            self.report(
                Operation::Store,
                &StoreError::InvalidCookieName {
                    name: cookie.name.clone(),
                },
            );
            return;
        }
        self.write_cookie(cookie, url, codec::encode(cookie));
    }

    /// Writes the encoded cookie, then evicts the files it supersedes.
    /// Nothing is evicted unless the new file is in place.
    fn write_cookie(
        &self,
        cookie: &Cookie,
        url: Option<&Url>,
        encoded: Result<Vec<u8>, CodecError>,
    ) {
        let domain = layout::partition_domain(url, Some(&cookie.domain));
        let dir = layout::partition_dir(&self.namespace_dir, &domain);
        let target = dir.join(CookieFileName::new(&cookie.name, SystemTime::now()).to_string());

        let bytes = match encoded {
            Ok(bytes) => bytes,
            Err(source) => {
                self.report(
                    Operation::Store,
                    &StoreError::Codec {
                        path: target,
                        source,
                    },
                );
                return;
            }
        };

        if let Err(error) = fs::create_dir_all(&dir) {
            self.report(Operation::Store, &StoreError::io(&dir, error));
            return;
        }
        if let Err(error) = write_atomic(&dir, &target, &bytes) {
            self.report(Operation::Store, &error);
            return;
        }
        debug!(path = %target.display(), "Stored cookie");

        let existing = self.drain(layout::list_cookie_files(&dir), Operation::Store);
        for path in existing.iter().filter(|path| **path != target) {
            let superseded = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&cookie.name));
            if superseded {
                remove_file(path, Operation::Store, self.diagnostics.as_ref());
            }
        }
    }

    /// Stores each cookie in order. A failure on one does not stop the rest.
    pub fn store_all(&self, cookies: &[Cookie], url: Option<&Url>) {
        for cookie in cookies {
            self.store(cookie, url);
        }
    }

    /// Returns the live cookies of the partition for `url`'s host.
    ///
    /// Expired cookies are deleted on the way. Order is unspecified.
    #[instrument(level = "debug", skip(self, url), fields(host = url.host_str().unwrap_or_default()))]
    pub fn cookies(&self, url: &Url) -> Vec<Cookie> {
        let domain = layout::partition_domain(Some(url), None);
        let dir = layout::partition_dir(&self.namespace_dir, &domain);
        let paths = self.drain(layout::list_cookie_files(&dir), Operation::Load);
        self.prune(&paths)
    }

    /// Returns the live cookies of every partition in this namespace.
    ///
    /// Expired cookies are deleted on the way. Order is unspecified.
    #[instrument(level = "debug", skip(self))]
    pub fn all_cookies(&self) -> Vec<Cookie> {
        let paths = self.drain(
            layout::list_namespace_files(&self.namespace_dir),
            Operation::Load,
        );
        self.prune(&paths)
    }

    /// [`all_cookies`](Self::all_cookies) ordered by `descriptors`, first key
    /// most significant. Ties keep enumeration order.
    #[must_use]
    pub fn sorted_cookies(&self, descriptors: &[SortDescriptor]) -> Vec<Cookie> {
        let mut cookies = self.all_cookies();
        sort_cookies(&mut cookies, descriptors);
        cookies
    }

    /// Deletes the stored file(s) named exactly `cookie.name` in the
    /// partition of `cookie.domain`. Returns how many files were removed.
    ///
    /// A cookie that is not stored is not an error.
    #[instrument(level = "debug", skip(self, cookie), fields(name = %cookie.name))]
    pub fn delete(&self, cookie: &Cookie) -> usize {
        let domain = layout::partition_domain(None, Some(&cookie.domain));
        let dir = layout::partition_dir(&self.namespace_dir, &domain);
        let paths = self.drain(layout::list_cookie_files(&dir), Operation::Delete);

        let mut removed = 0;
        for path in &paths {
            let matches =
                CookieFileName::from_path(path).is_some_and(|file| file.cookie_name == cookie.name);
            if matches && remove_file(path, Operation::Delete, self.diagnostics.as_ref()) {
                removed += 1;
            }
        }
        removed
    }

    /// Deletes every cookie file created strictly *after* `since`.
    ///
    /// The creation time comes from the file name, not from the cookie.
    /// Files whose names do not parse are reported and left alone. Returns
    /// how many files were removed. Whether the filter should instead keep
    /// the cookies created after `since` is an open question; the "after"
    /// direction is kept for compatibility with existing callers.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_cookies_since(&self, since: SystemTime) -> usize {
        let cutoff = layout::epoch_millis(since);
        let paths = self.drain(
            layout::list_namespace_files(&self.namespace_dir),
            Operation::RemoveSince,
        );

        let mut removed = 0;
        for path in &paths {
            let Some(file) = CookieFileName::from_path(path) else {
                self.report(
                    Operation::RemoveSince,
                    &StoreError::InvalidFileName { path: path.clone() },
                );
                continue;
            };
            if file.created_ms > cutoff
                && remove_file(path, Operation::RemoveSince, self.diagnostics.as_ref())
            {
                removed += 1;
            }
        }
        debug!(removed, cutoff_ms = cutoff, "Removed recent cookies");
        removed
    }

    fn prune(&self, paths: &[PathBuf]) -> Vec<Cookie> {
        sweeper::prune(paths, SystemTime::now(), self.diagnostics.as_ref())
            .into_iter()
            .map(|LoadedCookie { cookie, .. }| cookie)
            .collect()
    }

    fn drain(&self, listing: Listing, operation: Operation) -> Vec<PathBuf> {
        for failure in &listing.failures {
            self.report(operation, failure);
        }
        listing.paths
    }

    fn report(&self, operation: Operation, error: &StoreError) {
        self.diagnostics.report(operation, error);
    }
}

impl fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieJar")
            .field("namespace_dir", &self.namespace_dir)
            .finish_non_exhaustive()
    }
}

/// Rejects names that would escape the partition or be listed as hidden.
fn is_storable_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\'])
}

/// Writes `bytes` to a hidden temp file in `dir`, then renames it to `target`.
fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    temp.write_all(bytes)
        .map_err(|e| StoreError::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io(temp.path(), e))?;
    temp.persist(target)
        .map_err(|e| StoreError::io(target, e.error))?;
    Ok(())
}
