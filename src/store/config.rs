//! Storage root and namespace key resolution.
//!
//! The default storage root is, in priority order:
//! 1. `$SESSION_JAR_DIR`
//! 2. `$XDG_DATA_HOME/session-jar`
//! 3. `$HOME/.local/share/session-jar`
//! 4. `%APPDATA%/session-jar`

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::clear::{ClearReport, clear_all_with_prefix};
use super::error::StoreError;

const APP_DIR_NAME: &str = "session-jar";

/// Environment variable that points directly at the storage root.
pub const STORAGE_DIR_ENV: &str = "SESSION_JAR_DIR";

/// Environment variable that overrides [`DEFAULT_NAMESPACE_KEY`].
pub const NAMESPACE_KEY_ENV: &str = "SESSION_JAR_NAMESPACE_KEY";

/// Key for the namespace HMAC.
///
/// This is an obfuscation constant compiled into every binary. It keeps
/// account identifiers out of directory listings and avoids collisions; it
/// does not protect stored cookies from another process running as the
/// same user.
pub const DEFAULT_NAMESPACE_KEY: &str = "/B?E(H+MbQeThVmYq3t6w9z$C&F)J@Nc";

/// File-name prefix of cookies that survive a non-exhaustive bulk clear.
///
/// Reserved for device-trust cookies, which would otherwise force a fresh
/// two-factor challenge after every clear.
pub const DEFAULT_PROTECTED_PREFIX: &str = "DES5";

/// Where and how jars lay out their namespaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JarConfig {
    /// Directory that holds one subdirectory per namespace.
    pub storage_root: PathBuf,
    /// HMAC key used to derive namespace directory names.
    pub namespace_key: String,
    /// Cookie-name prefix exempt from `clear_all(.., false)`.
    pub protected_prefix: String,
}

impl JarConfig {
    /// Uses `storage_root` with the default key and protected prefix.
    #[must_use]
    pub fn with_root(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            namespace_key: DEFAULT_NAMESPACE_KEY.to_string(),
            protected_prefix: DEFAULT_PROTECTED_PREFIX.to_string(),
        }
    }

    /// Resolves the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StorageRootUnavailable`] if no usable base
    /// directory is found.
    pub fn from_env() -> Result<Self, StoreError> {
        Ok(Self::from_env_with_root(default_storage_root()?))
    }

    /// Uses `storage_root` but still honors the namespace key override
    /// from the environment.
    #[must_use]
    pub fn from_env_with_root(storage_root: impl Into<PathBuf>) -> Self {
        let mut config = Self::with_root(storage_root);
        if let Some(key) = sanitize_env_value(env::var_os(NAMESPACE_KEY_ENV)) {
            config.namespace_key = key.to_string_lossy().into_owned();
        }
        config
    }

    #[must_use]
    pub fn with_namespace_key(mut self, key: impl Into<String>) -> Self {
        self.namespace_key = key.into();
        self
    }

    #[must_use]
    pub fn with_protected_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.protected_prefix = prefix.into();
        self
    }

    /// Clears every namespace under this root, honoring the configured
    /// protected prefix unless `including_protected` is set.
    pub fn clear_all(&self, including_protected: bool) -> ClearReport {
        clear_all_with_prefix(
            &self.storage_root,
            including_protected,
            &self.protected_prefix,
        )
    }

    #[must_use]
    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }
}

/// Returns the default storage root for this process.
///
/// # Errors
///
/// Returns [`StoreError::StorageRootUnavailable`] if no usable base
/// directory is found.
pub fn default_storage_root() -> Result<PathBuf, StoreError> {
    resolve_storage_root(
        sanitize_env_path(env::var_os(STORAGE_DIR_ENV)),
        sanitize_env_path(env::var_os("XDG_DATA_HOME")),
        sanitize_env_path(env::var_os("HOME")),
        sanitize_env_path(env::var_os("APPDATA")),
    )
}

fn sanitize_env_value(value: Option<OsString>) -> Option<OsString> {
    let value = value?;
    if value.to_string_lossy().trim().is_empty() {
        return None;
    }
    Some(value)
}

fn sanitize_env_path(value: Option<OsString>) -> Option<PathBuf> {
    sanitize_env_value(value).map(PathBuf::from)
}

fn resolve_storage_root(
    explicit: Option<PathBuf>,
    xdg_data_home: Option<PathBuf>,
    home: Option<PathBuf>,
    app_data: Option<PathBuf>,
) -> Result<PathBuf, StoreError> {
    if let Some(explicit) = explicit {
        return Ok(explicit);
    }
    if let Some(xdg) = xdg_data_home {
        return Ok(xdg.join(APP_DIR_NAME));
    }
    if let Some(home) = home {
        return Ok(home.join(".local").join("share").join(APP_DIR_NAME));
    }
    if let Some(app_data) = app_data {
        return Ok(app_data.join(APP_DIR_NAME));
    }

    Err(StoreError::StorageRootUnavailable)
}
