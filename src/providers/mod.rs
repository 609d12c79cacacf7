/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for the supported backends:
 * - Ollama: Local LLM server
 * - OpenAI: OpenAI API integration (also used for LM Studio)
 * - Anthropic: Anthropic API integration
 * - ModernMT: Dedicated machine-translation API
 * - Mock: Deterministic provider for tests
 *
 * Every HTTP client shares the retry and rate-limit plumbing defined here.
 */

use async_trait::async_trait;
use log::warn;
use rand::Rng;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably in the translation service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Exponential backoff with jitter
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each further retry
    pub backoff_base_ms: u64,
    /// Upper bound for a single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            max_retries,
            backoff_base_ms,
            max_delay: Duration::from_secs(30),
        }
    }

    /// No retries at all
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 || self.backoff_base_ms == 0 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 1).min(16);
        let base = self.backoff_base_ms.saturating_mul(1u64 << exponent);
        let jitter = rand::rng().random_range(0..=self.backoff_base_ms / 2);
        Duration::from_millis(base.saturating_add(jitter)).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 1000)
    }
}

/// Client-side limiter spacing requests evenly over a minute
#[derive(Debug)]
pub struct RateLimiter {
    interval: Option<Duration>,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    /// `requests_per_minute` of `None` or 0 disables limiting
    pub fn new(requests_per_minute: Option<u32>) -> Self {
        let interval = requests_per_minute
            .filter(|&rpm| rpm > 0)
            .map(|rpm| Duration::from_millis(60_000 / rpm as u64));
        Self {
            interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Wait until the next request slot is free
    pub async fn acquire(&self) {
        let Some(interval) = self.interval else {
            return;
        };
        let wait_until = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = (*next_slot).max(now);
            *next_slot = slot + interval;
            slot
        };
        let now = Instant::now();
        if wait_until > now {
            tokio::time::sleep(wait_until - now).await;
        }
    }
}

/// Map a non-success HTTP status to a provider error
pub fn classify_status(status: StatusCode, body: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthenticationError(body),
        429 => ProviderError::RateLimitExceeded(body),
        code => ProviderError::ApiError {
            status_code: code,
            message: body,
        },
    }
}

/// Turn a transport failure into a provider error
pub fn connection_error(error: reqwest::Error) -> ProviderError {
    ProviderError::ConnectionError(error.to_string())
}

/// Check the status and decode a JSON body
pub async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
    let status = response.status();
    let body = response.text().await.map_err(connection_error)?;
    if !status.is_success() {
        return Err(classify_status(status, body));
    }
    serde_json::from_str(&body).map_err(|e| ProviderError::ParseError(format!("{} (body: {})", e, preview(&body))))
}

/// Run `operation` under the rate limiter, retrying retryable failures
pub async fn send_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    limiter: &RateLimiter,
    operation_name: &str,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;
    loop {
        limiter.acquire().await;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    "{}: attempt {}/{} failed ({}), retrying in {:?}",
                    operation_name,
                    attempt,
                    policy.max_retries + 1,
                    error,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}

/// First 200 characters of a body, for error messages
pub(crate) fn preview(body: &str) -> String {
    if body.chars().count() > 200 {
        format!("{}...", body.chars().take(200).collect::<String>())
    } else {
        body.to_string()
    }
}

pub mod anthropic;
pub mod mock;
pub mod modernmt;
pub mod ollama;
pub mod openai;
