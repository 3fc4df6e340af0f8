//! The cookie value type shared by the jar, the codec and the HTTP seam.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, SystemTime};

use url::Url;

const LATEST_EXPIRY_SECS: u64 = 253_402_300_799;

/// A single HTTP cookie as persisted by the jar.
///
/// The value field is redacted in Debug output so cookies can be traced
/// without leaking session secrets.
#[derive(Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name (case-sensitive).
    pub name: String,
    /// Cookie value (sensitive, never log).
    value: String,
    /// Domain the cookie applies to, as received (may carry a leading dot).
    pub domain: String,
    /// URL path scope.
    pub path: String,
    /// Absolute expiry; `None` for session cookies.
    pub expires: Option<SystemTime>,
    /// Only sent over HTTPS.
    pub secure: bool,
    /// Hidden from client-side scripts.
    pub http_only: bool,
    /// `SameSite` policy label (`Strict`, `Lax` or `None`) when present.
    pub same_site: Option<String>,
    /// Attributes without a dedicated field, kept verbatim.
    pub attributes: BTreeMap<String, String>,
}

impl Cookie {
    /// Creates a session cookie scoped to `/` on `domain`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
            same_site: None,
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn with_expires(mut self, expires: SystemTime) -> Self {
        self.expires = Some(expires);
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns the cookie value.
    ///
    /// Cookie values are sensitive; avoid logging the return value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns `true` when the cookie carries an expiry at or before `now`.
    ///
    /// Session cookies never expire here.
    #[must_use]
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    /// Returns `true` when this cookie should accompany a request to `url`.
    ///
    /// Only the path scope and the `Secure` flag are checked; the host was
    /// already fixed by the domain partition the cookie was loaded from.
    #[must_use]
    pub fn applies_to(&self, url: &Url) -> bool {
        if self.secure && url.scheme() != "https" {
            return false;
        }
        path_matches(url.path(), &self.path)
    }

    /// Converts a `Set-Cookie` header received for `url` into a [`Cookie`].
    ///
    /// The domain falls back to the URL host and the path to the default path
    /// of the URL. `Max-Age` takes precedence over `Expires`.
    ///
    /// Returns `None` when the header cannot be parsed.
    #[must_use]
    pub fn parse_set_cookie(header: &str, url: &Url) -> Option<Self> {
        let parsed = cookie::Cookie::parse(header.to_string()).ok()?;

        let domain = parsed
            .domain()
            .map(str::to_string)
            .or_else(|| url.host_str().map(str::to_string))
            .unwrap_or_default();
        let path = parsed
            .path()
            .filter(|path| path.starts_with('/'))
            .map_or_else(|| default_path(url), str::to_string);

        let mut result = Self::new(parsed.name(), parsed.value(), domain)
            .with_path(path)
            .with_secure(parsed.secure().unwrap_or(false))
            .with_http_only(parsed.http_only().unwrap_or(false));
        result.same_site = parsed.same_site().map(|same_site| same_site.to_string());

        if let Some(max_age) = parsed.max_age() {
            result
                .attributes
                .insert("Max-Age".to_string(), max_age.whole_seconds().to_string());
            let now = SystemTime::now();
            result.expires = Some(match Duration::try_from(max_age) {
                Ok(ttl) => now.checked_add(ttl).unwrap_or_else(latest_expiry),
                // Negative Max-Age means "expire immediately".
                Err(_) => SystemTime::UNIX_EPOCH,
            });
        } else if let Some(expires) = parsed.expires_datetime() {
            result.expires = Some(SystemTime::from(expires));
        }

        if parsed.partitioned().unwrap_or(false) {
            result
                .attributes
                .insert("Partitioned".to_string(), String::new());
        }

        Some(result)
    }
}

/// Expiry used when `Max-Age` overflows the clock: 9999-12-31T23:59:59Z.
fn latest_expiry() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(LATEST_EXPIRY_SECS)
}

// Custom Debug impl that redacts the cookie value.
impl fmt::Debug for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookie")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("expires", &self.expires)
            .field("secure", &self.secure)
            .field("http_only", &self.http_only)
            .field("same_site", &self.same_site)
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// RFC 6265 §5.1.4 path-match.
fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/')
            || request_path[cookie_path.len()..].starts_with('/'))
}

/// RFC 6265 §5.1.4 default-path of a request URL.
fn default_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(index) => path[..index].to_string(),
    }
}
