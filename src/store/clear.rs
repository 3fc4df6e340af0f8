//! Administrative sweep across every namespace under a storage root.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{info, instrument};

use super::config::DEFAULT_PROTECTED_PREFIX;
use super::error::{DiagnosticSink, LogSink, Operation, StoreError};
use super::layout::{self, CookieFileName};
use super::sweeper::remove_file;

/// Outcome of a bulk clear.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClearReport {
    /// Cookie files removed.
    pub removed: usize,
    /// Protected cookie files left in place.
    pub kept: usize,
    /// Files or directories that could not be removed.
    pub failed: usize,
}

/// Clears every namespace under `storage_root`.
///
/// Files whose name starts with [`DEFAULT_PROTECTED_PREFIX`] survive unless
/// `including_protected` is set, in which case each partition directory is
/// removed outright. Failures are logged and the sweep moves on.
pub fn clear_all(storage_root: &Path, including_protected: bool) -> ClearReport {
    clear_all_with_prefix(storage_root, including_protected, DEFAULT_PROTECTED_PREFIX)
}

/// [`clear_all`] with a caller-chosen protected prefix.
pub fn clear_all_with_prefix(
    storage_root: &Path,
    including_protected: bool,
    protected_prefix: &str,
) -> ClearReport {
    clear_all_reporting(storage_root, including_protected, protected_prefix, &LogSink)
}

/// [`clear_all_with_prefix`] reporting failures to `diagnostics`.
#[instrument(level = "debug", skip(storage_root, diagnostics), fields(root = %storage_root.display()))]
pub fn clear_all_reporting(
    storage_root: &Path,
    including_protected: bool,
    protected_prefix: &str,
    diagnostics: &dyn DiagnosticSink,
) -> ClearReport {
    let mut report = ClearReport::default();

    let namespaces = layout::list_subdirectories(storage_root);
    report_failures(namespaces.failures, &mut report, diagnostics);

    for namespace in &namespaces.paths {
        let partitions = layout::list_subdirectories(namespace);
        report_failures(partitions.failures, &mut report, diagnostics);

        for partition in &partitions.paths {
            if including_protected {
                remove_partition(partition, &mut report, diagnostics);
            } else {
                clear_unprotected(partition, protected_prefix, &mut report, diagnostics);
            }
        }
    }

    info!(
        removed = report.removed,
        kept = report.kept,
        failed = report.failed,
        including_protected,
        "Cleared cookie storage"
    );
    report
}

fn clear_unprotected(
    partition: &Path,
    protected_prefix: &str,
    report: &mut ClearReport,
    diagnostics: &dyn DiagnosticSink,
) {
    let files = layout::list_cookie_files(partition);
    report_failures(files.failures, report, diagnostics);

    for path in &files.paths {
        let protected = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(protected_prefix));
        if protected {
            report.kept += 1;
        } else if remove_file(path, Operation::Clear, diagnostics) {
            report.removed += 1;
        } else {
            report.failed += 1;
        }
    }
}

fn remove_partition(
    partition: &Path,
    report: &mut ClearReport,
    diagnostics: &dyn DiagnosticSink,
) {
    let files = layout::list_cookie_files(partition);
    let count = files
        .paths
        .iter()
        .filter(|path| CookieFileName::from_path(path).is_some())
        .count();

    match fs::remove_dir_all(partition) {
        Ok(()) => report.removed += count,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            report.failed += 1;
            diagnostics.report(Operation::Clear, &StoreError::io(partition, error));
        }
    }
}

fn report_failures(
    failures: Vec<StoreError>,
    report: &mut ClearReport,
    diagnostics: &dyn DiagnosticSink,
) {
    for failure in failures {
        report.failed += 1;
        diagnostics.report(Operation::Clear, &failure);
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn seed(root: &Path) {
        for (namespace, domain) in [("ns1", "apple.com"), ("ns2", "example.com")] {
            let dir = root.join(namespace).join(format!("storage_{domain}"));
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("DES5abc_-_1_-_1000.cookiedata"), b"{}").unwrap();
            fs::write(dir.join("myacinfo_-_1_-_1000.cookiedata"), b"{}").unwrap();
        }
    }

    #[test]
    fn test_clear_all_keeps_protected_cookies() {
        let tempdir = TempDir::new().unwrap();
        seed(tempdir.path());

        let report = clear_all(tempdir.path(), false);

        assert_eq!(report.removed, 2);
        assert_eq!(report.kept, 2);
        assert_eq!(report.failed, 0);
        let dir = tempdir.path().join("ns1/storage_apple.com");
        assert!(dir.join("DES5abc_-_1_-_1000.cookiedata").exists());
        assert!(!dir.join("myacinfo_-_1_-_1000.cookiedata").exists());
    }

    #[test]
    fn test_clear_all_including_protected_removes_partitions() {
        let tempdir = TempDir::new().unwrap();
        seed(tempdir.path());

        let report = clear_all(tempdir.path(), true);

        assert_eq!(report.removed, 4);
        assert_eq!(report.kept, 0);
        assert!(!tempdir.path().join("ns1/storage_apple.com").exists());
        assert!(tempdir.path().join("ns1").exists());
    }

    #[test]
    fn test_clear_all_custom_prefix() {
        let tempdir = TempDir::new().unwrap();
        seed(tempdir.path());

        let report = clear_all_with_prefix(tempdir.path(), false, "myac");

        assert_eq!(report.kept, 2);
        assert!(
            tempdir
                .path()
                .join("ns2/storage_example.com/myacinfo_-_1_-_1000.cookiedata")
                .exists()
        );
    }

    #[test]
    fn test_clear_all_skips_stray_files_at_namespace_level() {
        let tempdir = TempDir::new().unwrap();
        fs::write(tempdir.path().join("README"), b"not a namespace").unwrap();

        let report = clear_all(tempdir.path(), false);

        assert_eq!(report, ClearReport::default());
        assert!(tempdir.path().join("README").exists());
    }

    #[test]
    fn test_clear_all_missing_root_is_noop() {
        let tempdir = TempDir::new().unwrap();
        let report = clear_all(&tempdir.path().join("absent"), true);
        assert_eq!(report, ClearReport::default());
    }
}
