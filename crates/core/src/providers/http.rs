use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::errors::{redact_query, CoreError};
use crate::models::settings::{RetrySettings, Settings};
use crate::utils::cancel::CancelSignal;

use super::traits::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};

/// `HttpTransport` over one pooled `reqwest::Client`.
///
/// Build it once per run and share it (`Arc`) between the history and market
/// sources; both reuse the same connection pool.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(settings: &Settings) -> Result<Self, CoreError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .pool_max_idle_per_host(20)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| {
                CoreError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, CoreError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

/// Exponential backoff schedule: `initial`, doubling per retry, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based: the wait after the first
    /// failed attempt is `delay_for(1)`).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.initial_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Statuses worth another attempt: throttling and server-side failures.
    pub fn is_retryable(status: u16) -> bool {
        status == 429 || (500..=599).contains(&status)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetrySettings::default().into()
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
        }
    }
}

/// Executes requests with bounded exponential-backoff retry on 429/5xx.
///
/// Any other non-200 status and any transport failure fail immediately.
/// A cancelled backoff wait fails the whole fetch with `CoreError::Cancelled`.
pub struct HttpFetcher {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
    cancel: CancelSignal,
}

impl HttpFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, policy: RetryPolicy, cancel: CancelSignal) -> Self {
        Self {
            transport,
            policy,
            cancel,
        }
    }

    pub fn cancel_signal(&self) -> &CancelSignal {
        &self.cancel
    }

    pub async fn get(
        &self,
        url: &str,
        headers: Vec<(String, String)>,
    ) -> Result<String, CoreError> {
        let mut request = HttpRequest::get(url);
        request.headers = headers;
        self.fetch(&request).await
    }

    pub async fn post(
        &self,
        url: &str,
        headers: Vec<(String, String)>,
        body: String,
    ) -> Result<String, CoreError> {
        let mut request = HttpRequest::post(url, body);
        request.headers = headers;
        self.fetch(&request).await
    }

    /// Run `request` until it yields a 200 body or the retry budget is spent.
    pub async fn fetch(&self, request: &HttpRequest) -> Result<String, CoreError> {
        let url = redact_query(&request.url);
        let mut last_status = None;

        for attempt in 1..=self.policy.max_attempts {
            let request_id = Uuid::new_v4();
            let started = Instant::now();
            let outcome = self.transport.execute(request).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            let response = match outcome {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(
                        %request_id, attempt, elapsed_ms, url = %url, error = %e,
                        "request failed before a response arrived"
                    );
                    return Err(e);
                }
            };

            if response.status == 200 {
                tracing::info!(
                    %request_id, attempt, elapsed_ms, method = %request.method, url = %url,
                    "request completed"
                );
                return Ok(response.body);
            }

            tracing::warn!(
                %request_id, attempt, elapsed_ms, status = response.status, url = %url,
                "request returned non-success status"
            );

            if !RetryPolicy::is_retryable(response.status) {
                return Err(CoreError::RequestFailed {
                    url,
                    status: Some(response.status),
                    message: "non-retryable status".into(),
                });
            }

            last_status = Some(response.status);
            if attempt == self.policy.max_attempts {
                break;
            }

            let delay = self.policy.delay_for(attempt);
            tracing::warn!(
                %request_id, attempt, max_attempts = self.policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "retrying after backoff"
            );
            if let Err(e) = self.cancel.sleep(delay).await {
                tracing::warn!(%request_id, url = %url, "backoff interrupted, abandoning request");
                return Err(e);
            }
        }

        Err(CoreError::RequestFailed {
            url,
            status: last_status,
            message: format!(
                "max retries reached ({} attempts)",
                self.policy.max_attempts
            ),
        })
    }
}
