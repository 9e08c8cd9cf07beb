use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{blocking::Client, redirect::Policy};
use tracing::debug;

pub(super) const DEFAULT_USER_AGENT: &str = concat!("urbdata/", env!("CARGO_PKG_VERSION"));

/// Build a blocking client with the given user agent and per-request timeout.
pub(super) fn build_client(user_agent: &str, timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .redirect(Policy::limited(10))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("build HTTP client")
}

/// GET `url` with query parameters and return the body; non-2xx statuses are errors.
pub(super) fn get_bytes<P: serde::Serialize + ?Sized>(client: &Client, url: &str, query: &P) -> Result<Vec<u8>> {
    let resp = client.get(url)
        .query(query)
        .send()
        .with_context(|| format!("GET {url}"))?
        .error_for_status()
        .with_context(|| format!("GET {url} returned error status"))?;

    let bytes = resp.bytes().with_context(|| format!("read body of {url}"))?;
    debug!(url, bytes = bytes.len(), "fetched");
    Ok(bytes.to_vec())
}
