use crate::core::error::SourceError;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "fxdash/0.1";

/// Builds the HTTP client used by a source, with its per-request timeout.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// Sends one request and decodes a JSON body into `T`.
///
/// Timeouts, connection failures and non-2xx statuses map to the network
/// variants; undecodable bodies map to `MalformedResponse`.
pub async fn fetch_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    url: &str,
) -> Result<T, SourceError> {
    let response = request
        .send()
        .await
        .map_err(|e| SourceError::from_reqwest(e, url))?;

    if !response.status().is_success() {
        return Err(SourceError::NetworkError(format!(
            "HTTP error: {} for URL: {}",
            response.status(),
            url
        )));
    }

    let text = response
        .text()
        .await
        .map_err(|e| SourceError::from_reqwest(e, url))?;

    serde_json::from_str(&text).map_err(|e| {
        debug!(response = %text, "Failed to parse response");
        SourceError::MalformedResponse(format!("Failed to parse JSON response: {e}"))
    })
}

/// Retries an async operation on transient failures
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `retries`: Number of retry attempts (total runs = 1 initial + retries)
/// - `delay`: Pause between retry attempts
///
/// # Returns
/// Either the successful result or the last error. Non-transient errors are
/// returned immediately.
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay: Duration,
) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > retries || !err.is_transient() {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt, retries, err
                );
                attempt += 1;
                tokio::time::sleep(delay).await;
            }
        }
    }
}
