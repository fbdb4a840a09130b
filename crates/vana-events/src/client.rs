//! Luma public calendar API client.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::instrument;

use crate::error::EventsError;
use crate::retry::{with_rate_limit_retry, RetryPolicy};

const LUMA_API_BASE: &str = "https://api.lu.ma";
const LIST_EVENTS_PATH: &str = "/public/v1/calendar/list-events";
const API_KEY_HEADER: &str = "x-luma-api-key";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct LumaClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl LumaClient {
    pub fn new(api_key: &str) -> Result<Self, EventsError> {
        Self::with_base_url(api_key, LUMA_API_BASE, DEFAULT_TIMEOUT)
    }

    /// Point the client at another host, e.g. a mock server.
    pub fn with_base_url(
        api_key: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, EventsError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetch the calendar's event list as raw JSON.
    ///
    /// Rate limiting is retried per the client's policy; any other non-2xx
    /// status fails with `Upstream`.
    #[instrument(skip(self), level = "info")]
    pub async fn list_events(&self) -> Result<Value, EventsError> {
        let url = format!("{}{}", self.base_url, LIST_EVENTS_PATH);

        let response = with_rate_limit_retry(&self.retry, || {
            self.client
                .get(&url)
                .header(API_KEY_HEADER, &self.api_key)
                .header(CONTENT_TYPE, "application/json")
                .header(ACCEPT, "application/json")
                .send()
        })
        .await?;

        self.handle_response(response).await
    }

    /// Helper to turn a final response into JSON or a typed error.
    async fn handle_response(&self, response: reqwest::Response) -> Result<Value, EventsError> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!("HTTP error! status: {} body: {}", status, text);
            return Err(EventsError::Upstream {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| EventsError::InvalidJson(e.to_string()))
    }
}
