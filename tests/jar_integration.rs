//! Integration tests for the persistent cookie jar.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use session_jar_core::store::codec;
use session_jar_core::store::layout::{self, CookieFileName};
use session_jar_core::{
    Cookie, CookieJar, DiagnosticSink, JarConfig, Operation, StoreError, clear_all,
};
use tempfile::TempDir;
use url::Url;

#[derive(Default)]
struct RecordingSink {
    reports: Mutex<Vec<(Operation, String)>>,
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, operation: Operation, error: &StoreError) {
        self.reports
            .lock()
            .unwrap()
            .push((operation, error.to_string()));
    }
}

fn open(root: &Path, account: &str) -> CookieJar {
    CookieJar::open(account, &JarConfig::with_root(root)).unwrap()
}

fn url(raw: &str) -> Url {
    Url::parse(raw).unwrap()
}

fn cookie_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries.map(|entry| entry.unwrap().path()).collect();
    files.sort();
    files
}

/// Writes a cookie file with a chosen creation timestamp.
fn write_with_timestamp(partition: &Path, cookie: &Cookie, created_ms: u64) -> PathBuf {
    fs::create_dir_all(partition).unwrap();
    let name = CookieFileName {
        cookie_name: cookie.name.clone(),
        created_ms,
        suffix: 1234,
    };
    let path = partition.join(name.to_string());
    fs::write(&path, codec::encode(cookie).unwrap()).unwrap();
    path
}

#[test]
fn test_round_trip_preserves_all_attributes() {
    let tempdir = TempDir::new().unwrap();
    let jar = open(tempdir.path(), "someone@example.com");
    let expires = SystemTime::now() + Duration::from_secs(3600);
    let mut cookie = Cookie::new("myacinfo", "DAWTKNV2", ".apple.com")
        .with_path("/appleauth")
        .with_expires(expires)
        .with_secure(true)
        .with_http_only(true)
        .with_attribute("Max-Age", "3600");
    cookie.same_site = Some("None".to_string());

    jar.store(&cookie, Some(&url("https://idmsa.apple.com/appleauth/auth")));

    let read = jar.cookies(&url("https://idmsa.apple.com/"));
    assert_eq!(read, vec![cookie]);
}

#[test]
fn test_cookies_survive_reopening_the_jar() {
    let tempdir = TempDir::new().unwrap();
    open(tempdir.path(), "acct1").store(&Cookie::new("sid", "v", "example.com"), None);

    let reopened = open(tempdir.path(), "acct1");
    assert_eq!(reopened.all_cookies().len(), 1);
}

#[test]
fn test_namespaces_are_isolated() {
    let tempdir = TempDir::new().unwrap();
    let acct1 = open(tempdir.path(), "acct1");
    let acct2 = open(tempdir.path(), "acct2");

    acct1.store(&Cookie::new("sid", "one", "example.com"), None);

    assert_ne!(acct1.namespace_dir(), acct2.namespace_dir());
    assert_eq!(acct1.all_cookies().len(), 1);
    assert!(acct2.all_cookies().is_empty());
    assert!(acct2.cookies(&url("https://example.com/")).is_empty());
}

#[test]
fn test_identical_cookie_in_two_namespaces_stays_independent() {
    let tempdir = TempDir::new().unwrap();
    let acct1 = open(tempdir.path(), "acct1");
    let acct2 = open(tempdir.path(), "acct2");
    let site = url("https://example.com/");
    let cookie = Cookie::new("session", "v", "example.com");

    acct1.store(&cookie, None);
    acct2.store(&cookie, None);

    acct1.store(&Cookie::new("session", "changed", "example.com"), None);
    assert_eq!(acct2.cookies(&site), vec![cookie.clone()]);

    assert_eq!(acct1.delete(&cookie), 1);
    assert!(acct1.cookies(&site).is_empty());
    assert_eq!(acct2.cookies(&site), vec![cookie]);
}

#[test]
fn test_mixed_case_domain_round_trips() {
    let tempdir = TempDir::new().unwrap();
    let jar = open(tempdir.path(), "acct1");
    let cookie = Cookie::new("session", "abc", "Example.com");

    jar.store(&cookie, None);

    assert_eq!(jar.cookies(&url("https://Example.com/")), vec![cookie.clone()]);
    assert_eq!(jar.cookies(&url("https://example.com/")), vec![cookie]);
}

#[test]
fn test_namespace_key_changes_directory() {
    let tempdir = TempDir::new().unwrap();
    let default_key = open(tempdir.path(), "acct1");
    let custom_key = CookieJar::open(
        "acct1",
        &JarConfig::with_root(tempdir.path()).with_namespace_key("another key"),
    )
    .unwrap();
    assert_ne!(default_key.namespace_dir(), custom_key.namespace_dir());
}

#[test]
fn test_overwrite_leaves_exactly_one_file() {
    let tempdir = TempDir::new().unwrap();
    let jar = open(tempdir.path(), "acct1");
    let site = url("https://example.com/");

    jar.store(&Cookie::new("sid", "first", "example.com"), Some(&site));
    jar.store(&Cookie::new("sid", "second", "example.com"), Some(&site));
    jar.store(&Cookie::new("sid", "third", "example.com"), Some(&site));

    let partition = layout::partition_dir(jar.namespace_dir(), "example.com");
    assert_eq!(cookie_files(&partition).len(), 1);
    let cookies = jar.cookies(&site);
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].value(), "third");
}

#[test]
fn test_expired_cookie_is_absent_and_file_removed_after_read() {
    let tempdir = TempDir::new().unwrap();
    let jar = open(tempdir.path(), "acct1");
    let expired = Cookie::new("stale", "v", "example.com")
        .with_expires(SystemTime::now() - Duration::from_secs(1));
    let live = Cookie::new("fresh", "v", "example.com")
        .with_expires(SystemTime::now() + Duration::from_secs(3600));
    jar.store_all(&[expired, live], None);

    let partition = layout::partition_dir(jar.namespace_dir(), "example.com");
    assert_eq!(cookie_files(&partition).len(), 2);

    let names: Vec<String> = jar.all_cookies().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["fresh".to_string()]);

    let files = cookie_files(&partition);
    assert_eq!(files.len(), 1);
    assert!(
        files[0]
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("fresh_-_")
    );
}

#[test]
fn test_remove_cookies_since_removes_only_later_files() {
    let tempdir = TempDir::new().unwrap();
    let jar = open(tempdir.path(), "acct1");
    let partition = layout::partition_dir(jar.namespace_dir(), "example.com");
    let t1 = 1_700_000_000_000;
    let t2 = t1 + 1_000;
    let t3 = t2 + 1_000;

    let first = write_with_timestamp(&partition, &Cookie::new("c1", "v", "example.com"), t1);
    let second = write_with_timestamp(&partition, &Cookie::new("c2", "v", "example.com"), t2);
    let third = write_with_timestamp(&partition, &Cookie::new("c3", "v", "example.com"), t3);

    let removed = jar.remove_cookies_since(UNIX_EPOCH + Duration::from_millis(t2));

    assert_eq!(removed, 1);
    assert!(first.exists());
    assert!(second.exists(), "a file created exactly at the cutoff is kept");
    assert!(!third.exists());
}

#[test]
fn test_remove_cookies_since_spans_partitions() {
    let tempdir = TempDir::new().unwrap();
    let jar = open(tempdir.path(), "acct1");
    for domain in ["a.example", "b.example"] {
        let partition = layout::partition_dir(jar.namespace_dir(), domain);
        write_with_timestamp(&partition, &Cookie::new("late", "v", domain), 5_000);
    }

    assert_eq!(jar.remove_cookies_since(UNIX_EPOCH), 2);
    assert!(jar.all_cookies().is_empty());
}

#[test]
fn test_clear_all_respects_protected_prefix() {
    let tempdir = TempDir::new().unwrap();
    let acct1 = open(tempdir.path(), "acct1");
    let acct2 = open(tempdir.path(), "acct2");
    for jar in [&acct1, &acct2] {
        jar.store(&Cookie::new("DES5c0ffee", "trust", "apple.com"), None);
        jar.store(&Cookie::new("myacinfo", "session", "apple.com"), None);
    }

    let report = clear_all(tempdir.path(), false);
    assert_eq!(report.removed, 2);
    assert_eq!(report.kept, 2);
    for jar in [&acct1, &acct2] {
        let names: Vec<String> = jar.all_cookies().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["DES5c0ffee".to_string()]);
    }

    let report = clear_all(tempdir.path(), true);
    assert_eq!(report.removed, 2);
    assert!(acct1.all_cookies().is_empty());
    assert!(acct2.all_cookies().is_empty());
}

#[test]
fn test_config_clear_all_uses_configured_prefix() {
    let tempdir = TempDir::new().unwrap();
    let config = JarConfig::with_root(tempdir.path()).with_protected_prefix("keep_");
    let jar = CookieJar::open("acct1", &config).unwrap();
    jar.store(&Cookie::new("keep_me", "v", "example.com"), None);
    jar.store(&Cookie::new("DES5x", "v", "example.com"), None);

    config.clear_all(false);

    let names: Vec<String> = jar.all_cookies().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["keep_me".to_string()]);
}

#[test]
fn test_store_read_delete_read() {
    let tempdir = TempDir::new().unwrap();
    let jar = open(tempdir.path(), "acct1");
    let site = url("https://example.com/account");
    let cookie = Cookie::new("sid", "abc", "example.com")
        .with_expires(SystemTime::now() + Duration::from_secs(3600));

    jar.store(&cookie, None);
    assert_eq!(jar.cookies(&site), vec![cookie.clone()]);

    assert_eq!(jar.delete(&cookie), 1);
    assert!(jar.cookies(&site).is_empty());
    assert_eq!(jar.delete(&cookie), 0);
}

#[test]
fn test_corrupt_file_is_reported_and_skipped() {
    let tempdir = TempDir::new().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let jar = open(tempdir.path(), "acct1").with_diagnostics(sink.clone());
    jar.store(&Cookie::new("good", "v", "example.com"), None);
    let partition = layout::partition_dir(jar.namespace_dir(), "example.com");
    let corrupt = partition.join("broken_-_1_-_1000.cookiedata");
    fs::write(&corrupt, b"{ truncated").unwrap();

    let cookies = jar.all_cookies();

    assert_eq!(cookies.len(), 1);
    assert!(corrupt.exists());
    let reports = sink.reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].0, Operation::Load);
    assert!(reports[0].1.contains("broken_-_1_-_1000.cookiedata"));
}

#[test]
fn test_missing_partition_reads_empty() {
    let tempdir = TempDir::new().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let jar = open(tempdir.path(), "acct1").with_diagnostics(sink.clone());

    assert!(jar.cookies(&url("https://nowhere.example/")).is_empty());
    assert!(jar.all_cookies().is_empty());
    assert!(sink.reports.lock().unwrap().is_empty());
}

#[test]
fn test_sorted_cookies_is_deterministic() {
    let tempdir = TempDir::new().unwrap();
    let jar = open(tempdir.path(), "acct1");
    jar.store(&Cookie::new("zeta", "1", "b.example"), None);
    jar.store(&Cookie::new("alpha", "2", "b.example"), None);
    jar.store(&Cookie::new("mid", "3", "a.example"), None);

    let sorted = jar.sorted_cookies(&[
        session_jar_core::SortDescriptor::ascending(session_jar_core::SortField::Domain),
        session_jar_core::SortDescriptor::ascending(session_jar_core::SortField::Name),
    ]);
    let names: Vec<&str> = sorted.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["mid", "alpha", "zeta"]);
}
