//! Identifier-keyed namespace directories.

use std::path::{Path, PathBuf};

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::error::StoreError;

type HmacSha256 = Hmac<Sha256>;

/// Returns the directory name for `identifier`: hex HMAC-SHA256 under `key`.
///
/// The same `(key, identifier)` pair always yields the same 64-character name.
///
/// # Errors
///
/// Returns [`StoreError::InvalidNamespaceKey`] if the HMAC rejects the key.
pub fn namespace_dir_name(identifier: &str, key: &str) -> Result<String, StoreError> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|_| StoreError::InvalidNamespaceKey)?;
    mac.update(identifier.as_bytes());
    Ok(hex_encode(&mac.finalize().into_bytes()))
}

/// Returns `storage_root/<namespace_dir_name(identifier, key)>`.
///
/// # Errors
///
/// Returns [`StoreError::InvalidNamespaceKey`] if the HMAC rejects the key.
pub fn namespace_dir(
    storage_root: &Path,
    identifier: &str,
    key: &str,
) -> Result<PathBuf, StoreError> {
    Ok(storage_root.join(namespace_dir_name(identifier, key)?))
}

fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(char::from(HEX[usize::from(byte >> 4)]));
        out.push(char::from(HEX[usize::from(byte & 0x0f)]));
    }
    out
}
