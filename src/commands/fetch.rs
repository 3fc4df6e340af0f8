//! Fetch command handler: one GET with the account jar as cookie provider.

use std::sync::Arc;

use anyhow::{Context, Result};
use session_jar_core::JarConfig;
use tracing::{debug, info};
use url::Url;

use super::cookies::open_jar;

pub async fn run_fetch_command(account: &str, url: &Url, config: &JarConfig) -> Result<()> {
    let jar = Arc::new(open_jar(account, config)?);
    let client = reqwest::Client::builder()
        .cookie_provider(Arc::clone(&jar))
        .build()
        .context("Failed to build HTTP client")?;

    debug!(url = %url, "Sending request");
    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("Request to {url} failed"))?;
    let status = response.status();
    let final_url = response.url().clone();
    // Drain the body so the connection completes before reporting.
    let body = response
        .bytes()
        .await
        .with_context(|| format!("Failed to read response body from {url}"))?;

    println!("{status}");
    info!(
        status = status.as_u16(),
        bytes = body.len(),
        cookies = jar.cookies(&final_url).len(),
        "Fetched URL"
    );
    Ok(())
}
