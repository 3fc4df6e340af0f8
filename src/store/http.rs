//! `reqwest` cookie provider backed by the on-disk jar.
//!
//! ```no_run
//! use std::sync::Arc;
//! use session_jar_core::CookieJar;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let jar = Arc::new(CookieJar::new("someone@example.com")?);
//! let client = reqwest::Client::builder().cookie_provider(jar).build()?;
//! # drop(client);
//! # Ok(())
//! # }
//! ```

use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use tracing::{debug, warn};
use url::Url;

use super::jar::CookieJar;
use crate::cookie::Cookie;

impl CookieStore for CookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let mut received = Vec::new();
        for header in cookie_headers {
            let Ok(raw) = header.to_str() else {
                warn!(url = %url, "Skipping Set-Cookie header with non-ASCII bytes");
                continue;
            };
            match Cookie::parse_set_cookie(raw, url) {
                Some(cookie) => received.push(cookie),
                None => warn!(url = %url, "Skipping unparseable Set-Cookie header"),
            }
        }
        debug!(url = %url, count = received.len(), "Persisting response cookies");
        self.store_all(&received, Some(url));
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = request_cookie_header(&CookieJar::cookies(self, url), url)?;
        match HeaderValue::from_str(&header) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(url = %url, error = %error, "Stored cookies do not form a valid header");
                None
            }
        }
    }
}

/// Joins the cookies that apply to `url` as `name=value; name=value`.
///
/// Returns `None` when nothing applies.
#[must_use]
pub fn request_cookie_header(cookies: &[Cookie], url: &Url) -> Option<String> {
    let pairs: Vec<String> = cookies
        .iter()
        .filter(|cookie| cookie.applies_to(url))
        .map(|cookie| format!("{}={}", cookie.name, cookie.value()))
        .collect();
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}
