//! Rate-limit aware retry for HTTP requests.
//!
//! Only `429 Too Many Requests` is retried, after waiting for the duration in
//! the `Retry-After` header. Every other status is handed back to the caller
//! untouched. Transport failures are retried immediately while attempts
//! remain and surface on the last one.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Response, StatusCode};

use crate::error::EventsError;

/// Default retry configuration
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Wait used when Retry-After is missing or unparsable
    pub default_wait: Duration,
    /// Cap on any single wait; `None` trusts the server
    pub max_wait: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            default_wait: Duration::from_secs(DEFAULT_RETRY_AFTER_SECS),
            max_wait: None,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, default_wait_secs: u64, max_wait_secs: Option<u64>) -> Self {
        Self {
            max_attempts,
            default_wait: Duration::from_secs(default_wait_secs),
            max_wait: max_wait_secs.map(Duration::from_secs),
        }
    }

    /// How long to wait before retrying a 429 with these headers.
    pub fn wait_for(&self, headers: &HeaderMap) -> Duration {
        let wait = retry_after(headers).unwrap_or(self.default_wait);
        match self.max_wait {
            Some(cap) if wait > cap => {
                tracing::debug!("Capping Retry-After {:?} to {:?}", wait, cap);
                cap
            }
            _ => wait,
        }
    }
}

/// Parse `Retry-After` as whole seconds.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Execute an HTTP request, retrying while the server answers 429.
///
/// # Example
/// ```ignore
/// let response = with_rate_limit_retry(
///     &RetryPolicy::default(),
///     || client.get(url).send(),
/// ).await?;
/// ```
pub async fn with_rate_limit_retry<F, Fut>(
    policy: &RetryPolicy,
    operation: F,
) -> Result<Response, EventsError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    for attempt in 1..=policy.max_attempts {
        let is_last = attempt == policy.max_attempts;

        match operation().await {
            Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                if is_last {
                    break;
                }
                let wait = policy.wait_for(response.headers());
                tracing::warn!(
                    "Rate limit exceeded (attempt {} of {}). Retrying in {:?}.",
                    attempt,
                    policy.max_attempts,
                    wait
                );
                tokio::time::sleep(wait).await;
            }
            Ok(response) => {
                if attempt > 1 {
                    tracing::info!("Request succeeded on attempt {}", attempt);
                }
                return Ok(response);
            }
            Err(e) if is_last => {
                tracing::debug!("Transport error on final attempt: {}", e);
                return Err(EventsError::Transport(e));
            }
            Err(e) => {
                tracing::debug!(
                    "Transport error on attempt {} of {}, retrying: {}",
                    attempt,
                    policy.max_attempts,
                    e
                );
            }
        }
    }

    tracing::error!("Rate limited on all {} attempts", policy.max_attempts);
    Err(EventsError::MaxRetriesExceeded {
        attempts: policy.max_attempts,
    })
}
