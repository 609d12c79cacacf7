/*!
 * Mock provider implementations for testing.
 *
 * This module provides a deterministic provider that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds with a tagged translation
 * - `MockProvider::failing()` - Always fails with an error
 * - `MockProvider::failing_on_requests(..)` - Fails on chosen request numbers
 * - `MockProvider::slow(..)` - Answers after a delay (for timeout testing)
 * - `MockProvider::staggered(..)` - Earlier requests answer later, so calls
 *   finish out of order
 *
 * It implements both `Provider` and `TranslationCapability`, so it can stand
 * in for a real backend anywhere in the pipeline.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{ProviderError, TranslationError};
use crate::providers::Provider;
use crate::translation::TranslationCapability;

/// Mock request for testing
#[derive(Debug, Clone)]
pub struct MockRequest {
    /// The text to translate
    pub text: String,
    /// Source language
    pub source_language: String,
    /// Target language
    pub target_language: String,
}

/// Mock response for testing
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// The translated text
    pub text: String,
    /// Simulated prompt tokens
    pub prompt_tokens: Option<u64>,
    /// Simulated completion tokens
    pub completion_tokens: Option<u64>,
}

/// Behavior mode for the mock provider
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Fails on the listed request numbers (1-based), succeeds otherwise
    FailOnRequests(Vec<usize>),
    /// Returns empty response
    Empty,
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
    /// Request n waits `first_delay_ms - (n - 1) * step_ms`
    Staggered { first_delay_ms: u64, step_ms: u64 },
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Request numbers in the order their answers were produced
    completed: Arc<Mutex<Vec<usize>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&MockRequest) -> String>,
    /// Fail any request whose text matches (optional)
    fail_when: Option<fn(&str) -> bool>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            completed: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
            fail_when: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that fails on the given 1-based request numbers
    pub fn failing_on_requests(requests: &[usize]) -> Self {
        Self::new(MockBehavior::FailOnRequests(requests.into()))
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock that answers after `delay_ms`
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Create a mock whose earlier requests answer later
    pub fn staggered(first_delay_ms: u64, step_ms: u64) -> Self {
        Self::new(MockBehavior::Staggered { first_delay_ms, step_ms })
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&MockRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Fail every request whose text satisfies `predicate`
    pub fn with_failure_when(mut self, predicate: fn(&str) -> bool) -> Self {
        self.fail_when = Some(predicate);
        self
    }

    /// Number of requests received so far (across clones)
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Request numbers (1-based) in completion order
    pub fn completion_order(&self) -> Vec<usize> {
        self.completed.lock().clone()
    }

    /// The translation a working mock produces for `text`
    pub fn expected_translation(text: &str, target_language: &str) -> String {
        format!("[TRANSLATED to {}] {}", target_language, text)
    }

    fn answer(&self, request: &MockRequest) -> MockResponse {
        let text = match self.custom_response {
            Some(generator) => generator(request),
            None => Self::expected_translation(&request.text, &request.target_language),
        };
        MockResponse {
            prompt_tokens: Some(request.text.len() as u64),
            completion_tokens: Some((text.len() / 2) as u64),
            text,
        }
    }
}

fn simulated_failure(request_number: usize, status_code: u16) -> ProviderError {
    ProviderError::ApiError {
        message: format!("Simulated provider failure (request #{})", request_number),
        status_code,
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Request = MockRequest;
    type Response = MockResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let request_number = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.respond(request_number, &request).await;
        self.completed.lock().push(request_number);
        result
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated outage".to_string())),
            _ => Ok(()),
        }
    }

    fn extract_text(response: &Self::Response) -> String {
        response.text.clone()
    }
}

impl MockProvider {
    async fn respond(&self, request_number: usize, request: &MockRequest) -> Result<MockResponse, ProviderError> {
        if self.fail_when.is_some_and(|predicate| predicate(&request.text)) {
            return Err(simulated_failure(request_number, 500));
        }

        match &self.behavior {
            MockBehavior::Working => Ok(self.answer(request)),

            MockBehavior::Intermittent { fail_every } => {
                if request_number % fail_every == 0 {
                    Err(simulated_failure(request_number, 503))
                } else {
                    Ok(self.answer(request))
                }
            }

            MockBehavior::Failing => Err(simulated_failure(request_number, 500)),

            MockBehavior::FailOnRequests(failing) => {
                if failing.contains(&request_number) {
                    Err(simulated_failure(request_number, 500))
                } else {
                    Ok(self.answer(request))
                }
            }

            MockBehavior::Empty => Ok(MockResponse {
                text: String::new(),
                prompt_tokens: Some(0),
                completion_tokens: Some(0),
            }),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                Ok(self.answer(request))
            }

            MockBehavior::Staggered { first_delay_ms, step_ms } => {
                let delay = first_delay_ms.saturating_sub(step_ms.saturating_mul(request_number as u64 - 1));
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(self.answer(request))
            }
        }
    }
}

#[async_trait]
impl TranslationCapability for MockProvider {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        let request = MockRequest {
            text: text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        };
        let response = self.complete(request).await?;
        Ok(Self::extract_text(&response))
    }

    async fn check_connection(&self) -> Result<(), TranslationError> {
        Ok(self.test_connection().await?)
    }

    fn usage_summary(&self) -> Option<String> {
        Some(format!("Mock provider: {} requests", self.request_count()))
    }
}
