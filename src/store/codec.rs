//! Serialization of a single cookie to and from a cookie file.
//!
//! Files hold one JSON object per cookie. Expiry is stored as whole seconds
//! plus nanoseconds relative to the Unix epoch so it survives a round trip
//! bit for bit.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::error::CodecError;
use crate::cookie::Cookie;

const NANOS_PER_SEC: u32 = 1_000_000_000;

#[derive(Debug, Serialize, Deserialize)]
struct StoredCookie {
    name: String,
    value: String,
    domain: String,
    path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires: Option<StoredExpiry>,
    secure: bool,
    http_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    same_site: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,
}

/// `secs` may be negative; `nanos` is always the forward offset from `secs`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct StoredExpiry {
    secs: i64,
    nanos: u32,
}

impl StoredExpiry {
    fn from_system_time(time: SystemTime) -> Result<Self, CodecError> {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Ok(Self {
                secs: i64::try_from(after.as_secs()).map_err(|_| CodecError::ExpiryOutOfRange)?,
                nanos: after.subsec_nanos(),
            }),
            Err(error) => {
                let before = error.duration();
                let whole = i64::try_from(before.as_secs())
                    .map_err(|_| CodecError::ExpiryOutOfRange)?;
                if before.subsec_nanos() == 0 {
                    Ok(Self {
                        secs: -whole,
                        nanos: 0,
                    })
                } else {
                    Ok(Self {
                        secs: -whole - 1,
                        nanos: NANOS_PER_SEC - before.subsec_nanos(),
                    })
                }
            }
        }
    }

    fn to_system_time(self) -> Result<SystemTime, CodecError> {
        if self.nanos >= NANOS_PER_SEC {
            return Err(CodecError::ExpiryOutOfRange);
        }
        let whole = Duration::from_secs(self.secs.unsigned_abs());
        let base = if self.secs >= 0 {
            UNIX_EPOCH.checked_add(whole)
        } else {
            UNIX_EPOCH.checked_sub(whole)
        };
        base.and_then(|time| time.checked_add(Duration::from_nanos(u64::from(self.nanos))))
            .ok_or(CodecError::ExpiryOutOfRange)
    }
}

/// Encodes `cookie` as the content of a cookie file.
///
/// # Errors
///
/// Returns [`CodecError`] if the expiry cannot be represented or
/// serialization fails.
pub fn encode(cookie: &Cookie) -> Result<Vec<u8>, CodecError> {
    let stored = StoredCookie {
        name: cookie.name.clone(),
        value: cookie.value().to_string(),
        domain: cookie.domain.clone(),
        path: cookie.path.clone(),
        expires: cookie
            .expires
            .map(StoredExpiry::from_system_time)
            .transpose()?,
        secure: cookie.secure,
        http_only: cookie.http_only,
        same_site: cookie.same_site.clone(),
        attributes: cookie.attributes.clone(),
    };
    Ok(serde_json::to_vec(&stored)?)
}

/// Decodes the content of a cookie file.
///
/// # Errors
///
/// Returns [`CodecError`] for anything that is not a well-formed cookie
/// file. Callers skip such files rather than failing the whole read.
pub fn decode(bytes: &[u8]) -> Result<Cookie, CodecError> {
    let stored: StoredCookie = serde_json::from_slice(bytes)?;
    let mut cookie = Cookie::new(stored.name, stored.value, stored.domain)
        .with_path(stored.path)
        .with_secure(stored.secure)
        .with_http_only(stored.http_only);
    cookie.expires = stored
        .expires
        .map(StoredExpiry::to_system_time)
        .transpose()?;
    cookie.same_site = stored.same_site;
    cookie.attributes = stored.attributes;
    Ok(cookie)
}
