//! Expiry pruning that runs in front of every read.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use super::codec;
use super::error::{DiagnosticSink, Operation, StoreError};
use crate::cookie::Cookie;

/// A decoded cookie together with the file it was read from.
#[derive(Debug, Clone)]
pub struct LoadedCookie {
    pub path: PathBuf,
    pub cookie: Cookie,
}

/// Decodes `paths` and drops every cookie that has expired at `now`.
///
/// Expired files are deleted. Files that fail to read or decode are
/// reported to `diagnostics`, excluded and left on disk.
pub fn prune(
    paths: &[PathBuf],
    now: SystemTime,
    diagnostics: &dyn DiagnosticSink,
) -> Vec<LoadedCookie> {
    let mut live = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            // Removed by a concurrent writer between listing and reading.
            Err(error) if error.kind() == io::ErrorKind::NotFound => continue,
            Err(error) => {
                diagnostics.report(Operation::Load, &StoreError::io(path, error));
                continue;
            }
        };
        let cookie = match codec::decode(&bytes) {
            Ok(cookie) => cookie,
            Err(source) => {
                diagnostics.report(
                    Operation::Load,
                    &StoreError::Codec {
                        path: path.clone(),
                        source,
                    },
                );
                continue;
            }
        };

        if cookie.is_expired_at(now) {
            debug!(path = %path.display(), name = %cookie.name, "Pruning expired cookie");
            remove_file(path, Operation::Prune, diagnostics);
            continue;
        }
        live.push(LoadedCookie {
            path: path.clone(),
            cookie,
        });
    }
    live
}

/// Removes `path`, treating an already-missing file as success.
///
/// Returns `true` when the file is gone afterwards.
pub(crate) fn remove_file(
    path: &Path,
    operation: Operation,
    diagnostics: &dyn DiagnosticSink,
) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(error) if error.kind() == io::ErrorKind::NotFound => true,
        Err(error) => {
            diagnostics.report(operation, &StoreError::io(path, error));
            false
        }
    }
}
