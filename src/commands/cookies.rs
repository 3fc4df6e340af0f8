//! Per-account cookie command handlers: path, list, set, delete, purge-since.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use session_jar_core::store::{layout, sort_cookies};
use session_jar_core::{Cookie, CookieJar, JarConfig, SortDescriptor};
use tracing::info;

use crate::cli::{DeleteArgs, ListArgs, PurgeSinceArgs, SetArgs};

/// Latest instant `httpdate` can format (9999-12-31T23:59:59Z).
const MAX_HTTP_DATE_SECS: u64 = 253_402_300_799;

pub(crate) fn open_jar(account: &str, config: &JarConfig) -> Result<CookieJar> {
    CookieJar::open(account, config)
        .map_err(|error| anyhow!("Failed to open cookie jar for account: {error}"))
}

pub fn run_path_command(account: &str, config: &JarConfig) -> Result<()> {
    let jar = open_jar(account, config)?;
    println!("{}", jar.namespace_dir().display());
    Ok(())
}

pub fn run_list_command(args: &ListArgs, config: &JarConfig) -> Result<()> {
    let jar = open_jar(&args.account.account, config)?;
    let mut cookies = match &args.url {
        Some(url) => jar.cookies(url),
        None => jar.all_cookies(),
    };

    let descriptors: Vec<SortDescriptor> = args
        .sort
        .iter()
        .map(|key| {
            if args.desc {
                SortDescriptor::descending((*key).into())
            } else {
                SortDescriptor::ascending((*key).into())
            }
        })
        .collect();
    sort_cookies(&mut cookies, &descriptors);

    for cookie in &cookies {
        println!("{}", format_cookie_line(cookie, args.show_values));
    }
    info!(count = cookies.len(), "Listed cookies");
    Ok(())
}

pub fn run_set_command(args: &SetArgs, config: &JarConfig) -> Result<()> {
    let jar = open_jar(&args.account.account, config)?;
    let mut cookie = Cookie::new(&args.name, &args.value, &args.domain)
        .with_path(&args.path)
        .with_secure(args.secure)
        .with_http_only(args.http_only);
    if let Some(secs) = args.expires_in {
        let expires = SystemTime::now()
            .checked_add(Duration::from_secs(secs))
            .context("--expires-in is too large")?;
        cookie = cookie.with_expires(expires);
    }

    jar.store(&cookie, args.url.as_ref());
    info!(name = %args.name, domain = %args.domain, "Stored cookie");
    Ok(())
}

pub fn run_delete_command(args: &DeleteArgs, config: &JarConfig) -> Result<()> {
    let jar = open_jar(&args.account.account, config)?;
    let removed = jar.delete(&Cookie::new(&args.name, "", &args.domain));
    if removed == 0 {
        info!(name = %args.name, domain = %args.domain, "No stored cookie matched");
    } else {
        info!(name = %args.name, domain = %args.domain, removed, "Deleted cookie");
    }
    Ok(())
}

pub fn run_purge_since_command(args: &PurgeSinceArgs, config: &JarConfig) -> Result<()> {
    let jar = open_jar(&args.account.account, config)?;
    let since = UNIX_EPOCH
        .checked_add(Duration::from_millis(args.since_ms))
        .context("--since-ms is out of range")?;
    let removed = jar.remove_cookies_since(since);
    info!(removed, since_ms = args.since_ms, "Purged cookies stored after cutoff");
    Ok(())
}

/// `domain\tpath\tname\texpires\tvalue`, with the value redacted unless asked for.
pub(crate) fn format_cookie_line(cookie: &Cookie, show_value: bool) -> String {
    let value = if show_value {
        cookie.value()
    } else {
        "[REDACTED]"
    };
    format!(
        "{}\t{}\t{}\t{}\t{}",
        cookie.domain,
        cookie.path,
        cookie.name,
        format_expiry(cookie.expires),
        value
    )
}

pub(crate) fn format_expiry(expires: Option<SystemTime>) -> String {
    let Some(expires) = expires else {
        return "session".to_string();
    };
    match expires.duration_since(UNIX_EPOCH) {
        Ok(elapsed) if elapsed.as_secs() <= MAX_HTTP_DATE_SECS => {
            httpdate::fmt_http_date(expires)
        }
        _ => format!("@{}ms", layout::epoch_millis(expires)),
    }
}
