//! Rate-limited page fetcher with bounded retries.
//!
//! One request is in flight at any time; pacing is enforced by explicit
//! delays rather than a concurrency primitive. The retry policy is an
//! inspectable [`FetchPolicy`] value injected at construction so tests can
//! substitute a deterministic one.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use storypulse_shared::{FetchPolicy, Result, StorypulseError};

/// User-Agent string for crawl requests.
const USER_AGENT: &str = concat!("storypulse/", env!("CARGO_PKG_VERSION"));

/// Serialized HTTP fetcher. Retries transient server errors up to the
/// policy's attempt ceiling with exponential backoff; everything else is a
/// terminal error for that URL. Whether a failed page aborts the crawl is
/// the scheduler's call, not ours.
pub struct Fetcher {
    client: Client,
    policy: FetchPolicy,
}

impl Fetcher {
    /// Create a fetcher with the given policy.
    pub fn new(policy: FetchPolicy) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(policy.timeout)
            .build()
            .map_err(|e| StorypulseError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, policy })
    }

    /// The policy this fetcher was built with.
    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Fetch one URL, returning the response body.
    ///
    /// Statuses in the retryable set are retried up to `max_attempts`
    /// total tries, sleeping `backoff_base * 2^(attempt-1)` between them.
    /// Non-retryable statuses and request errors fail immediately.
    pub async fn fetch(&self, url: &Url) -> Result<String> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(%url, attempt, "fetching page");

            let response = self
                .client
                .get(url.as_str())
                .send()
                .await
                .map_err(|e| StorypulseError::Network(format!("{url}: {e}")))?;

            let status = response.status();
            if status.is_success() {
                return response
                    .text()
                    .await
                    .map_err(|e| StorypulseError::Network(format!("{url}: body read failed: {e}")));
            }

            let retryable = self.policy.retry_statuses.contains(&status.as_u16());
            if retryable && attempt < self.policy.max_attempts {
                let backoff = self.policy.backoff_base * 2u32.pow(attempt - 1);
                warn!(
                    %url,
                    status = status.as_u16(),
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "transient failure, retrying after backoff"
                );
                tokio::time::sleep(backoff).await;
                continue;
            }

            return Err(StorypulseError::Network(format!(
                "{url}: HTTP {status} after {attempt} attempt(s)"
            )));
        }
    }

    /// Observe the mandatory inter-request delay. Called by the scheduler
    /// after every page fetch, regardless of outcome. A hard pacing floor
    /// for the source site, not best-effort.
    pub async fn pace(&self) {
        if self.policy.request_delay > Duration::ZERO {
            tokio::time::sleep(self.policy.request_delay).await;
        }
    }
}
