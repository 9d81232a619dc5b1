//! Shared HTTP plumbing for source adapters: one browser-like client,
//! one retrying text fetch.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use tracing::warn;

/// Public sites behind CDN bot filters reject default library agents.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const MAX_ATTEMPTS: u32 = 3;

pub fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .context("failed to build HTTP client")
}

/// GETs a page as text with up to two retries on network errors, 429 and
/// 5xx (1s then 2s backoff). 4xx other than 429 fails immediately. Bodies
/// are decoded lossily so a stray Latin-1 byte never kills a whole page.
pub async fn get_text(client: &Client, url: &str) -> Result<String> {
    let mut last_err = None;
    for attempt in 1..=MAX_ATTEMPTS {
        match client.get(url).send().await {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    let bytes = resp
                        .bytes()
                        .await
                        .with_context(|| format!("reading body of {}", url))?;
                    return Ok(String::from_utf8_lossy(&bytes).into_owned());
                }
                if status.as_u16() == 429 || status.is_server_error() {
                    last_err = Some(anyhow!("{} returned {}", url, status));
                } else {
                    return Err(anyhow!("{} returned {}", url, status));
                }
            }
            Err(e) => last_err = Some(anyhow!(e).context(format!("requesting {}", url))),
        }
        if attempt < MAX_ATTEMPTS {
            let delay = Duration::from_secs(1 << (attempt - 1));
            warn!(url, attempt, "fetch failed, retrying in {:?}", delay);
            tokio::time::sleep(delay).await;
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow!("{} failed with no recorded error", url)))
}
