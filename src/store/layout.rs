//! On-disk layout inside a namespace: domain partitions and cookie file names.
//!
//! ```text
//! <namespace>/storage_<domain>/<cookieName>_-_<creationEpochMillis>_-_<suffix>.cookiedata
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use url::{Host, Url};

use super::error::StoreError;

/// Extension of every cookie file.
pub const COOKIE_FILE_EXTENSION: &str = "cookiedata";

/// Separator between the components of a cookie file name.
pub const FILE_NAME_DELIMITER: &str = "_-_";

/// Partition used when neither a URL host nor a cookie domain is known.
pub const DEFAULT_DOMAIN: &str = "default";

const PARTITION_PREFIX: &str = "storage_";

/// Picks the partition domain: URL host, else cookie domain, else `"default"`.
///
/// A single leading dot is dropped so that `.example.com` and `example.com`
/// land in the same partition. Cookie domains are normalized the way `Url`
/// normalizes hosts: ASCII is lowercased and internationalized names become
/// punycode. Path separators are replaced so a hostile domain cannot escape
/// the namespace.
#[must_use]
pub fn partition_domain(url: Option<&Url>, cookie_domain: Option<&str>) -> String {
    let raw = match url {
        Some(url) => url.host_str().unwrap_or(DEFAULT_DOMAIN),
        None => cookie_domain.unwrap_or(DEFAULT_DOMAIN),
    };
    let trimmed = raw.strip_prefix('.').unwrap_or(raw);
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return DEFAULT_DOMAIN.to_string();
    }
    normalize_host(trimmed).replace(['/', '\\'], "_")
}

fn normalize_host(domain: &str) -> String {
    if domain.is_ascii() {
        return domain.to_ascii_lowercase();
    }
    Host::parse(domain).map_or_else(|_| domain.to_lowercase(), |host| host.to_string())
}

/// Returns `namespace_dir/storage_<domain>`.
#[must_use]
pub fn partition_dir(namespace_dir: &Path, domain: &str) -> PathBuf {
    namespace_dir.join(format!("{PARTITION_PREFIX}{domain}"))
}

/// The parsed name of one cookie file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieFileName {
    /// Name of the stored cookie; also the eviction prefix.
    pub cookie_name: String,
    /// Creation time in epoch milliseconds.
    pub created_ms: u64,
    /// Random disambiguator in `1000..=9999`.
    pub suffix: u16,
}

impl CookieFileName {
    /// Names a new file for `cookie_name` created at `created`.
    #[must_use]
    pub fn new(cookie_name: &str, created: SystemTime) -> Self {
        Self {
            cookie_name: cookie_name.to_string(),
            created_ms: epoch_millis(created),
            suffix: rand::thread_rng().gen_range(1000..=9999),
        }
    }

    /// Parses `name_-_millis_-_suffix.cookiedata`.
    ///
    /// The cookie name may itself contain the delimiter; the two numeric
    /// components are taken from the right.
    #[must_use]
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(&format!(".{COOKIE_FILE_EXTENSION}"))?;
        let mut parts = stem.rsplitn(3, FILE_NAME_DELIMITER);
        let suffix = parts.next()?.parse().ok()?;
        let created_ms = parts.next()?.parse().ok()?;
        let cookie_name = parts.next()?.to_string();
        Some(Self {
            cookie_name,
            created_ms,
            suffix,
        })
    }

    /// Parses the final component of `path`.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        Self::parse(path.file_name()?.to_str()?)
    }
}

impl fmt::Display for CookieFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{FILE_NAME_DELIMITER}{}{FILE_NAME_DELIMITER}{}.{COOKIE_FILE_EXTENSION}",
            self.cookie_name, self.created_ms, self.suffix
        )
    }
}

/// Milliseconds since the Unix epoch; times before the epoch clamp to 0.
#[must_use]
pub fn epoch_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Result of enumerating a directory: what was found and what could not be read.
#[derive(Debug, Default)]
pub(crate) struct Listing {
    pub(crate) paths: Vec<PathBuf>,
    pub(crate) failures: Vec<StoreError>,
}

impl Listing {
    fn absorb(&mut self, other: Listing) {
        self.paths.extend(other.paths);
        self.failures.extend(other.failures);
    }
}

/// Lists cookie files directly inside `dir`, in directory enumeration order.
///
/// Hidden files (including in-flight temp files) and files with another
/// extension are skipped. A missing directory is an empty listing.
pub(crate) fn list_cookie_files(dir: &Path) -> Listing {
    list_entries(dir, |path, file_type| {
        file_type.is_file() && !is_hidden(path) && has_cookie_extension(path)
    })
}

/// Lists the `storage_*` partition directories of a namespace.
pub(crate) fn list_partitions(namespace_dir: &Path) -> Listing {
    list_entries(namespace_dir, |path, file_type| {
        file_type.is_dir()
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(PARTITION_PREFIX))
    })
}

/// Lists every cookie file in every partition of a namespace.
pub(crate) fn list_namespace_files(namespace_dir: &Path) -> Listing {
    let partitions = list_partitions(namespace_dir);
    let mut listing = Listing {
        paths: Vec::new(),
        failures: partitions.failures,
    };
    for partition in &partitions.paths {
        listing.absorb(list_cookie_files(partition));
    }
    listing
}

/// Lists all subdirectories of `dir`.
pub(crate) fn list_subdirectories(dir: &Path) -> Listing {
    list_entries(dir, |_, file_type| file_type.is_dir())
}

fn list_entries(dir: &Path, keep: impl Fn(&Path, &fs::FileType) -> bool) -> Listing {
    let mut listing = Listing::default();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return listing,
        Err(error) => {
            listing.failures.push(StoreError::io(dir, error));
            return listing;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                listing.failures.push(StoreError::io(dir, error));
                continue;
            }
        };
        let path = entry.path();
        match entry.file_type() {
            Ok(file_type) if keep(&path, &file_type) => listing.paths.push(path),
            Ok(_) => {}
            Err(error) => listing.failures.push(StoreError::io(path, error)),
        }
    }
    listing
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

fn has_cookie_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension == COOKIE_FILE_EXTENSION)
}
