/*!
 * OpenAI chat completions client.
 *
 * Also serves any OpenAI-compatible local server (LM Studio).
 */

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{connection_error, read_json, send_with_retry, Provider, RateLimiter, RetryPolicy};
use crate::errors::ProviderError;

/// OpenAI client for interacting with the chat completions API
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// Base URL up to and including the version segment
    endpoint: String,
    retry: RetryPolicy,
    limiter: RateLimiter,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
    pub role: String,
    pub content: String,
}

/// Chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Token usage information
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// One completion choice
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Chat completion response
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
    #[serde(default)]
    pub usage: Option<OpenAIUsage>,
}

impl OpenAIRequest {
    /// Create a new request for `model`
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Add a message to the conversation
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new_with_config(api_key, endpoint, RetryPolicy::default(), None, Duration::from_secs(60))
    }

    /// Create a client with retry, rate-limit and timeout settings
    pub fn new_with_config(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        retry: RetryPolicy,
        rate_limit: Option<u32>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            retry,
            limiter: RateLimiter::new(rate_limit),
        }
    }

    fn url(&self, path: &str) -> String {
        let base = if self.endpoint.is_empty() {
            "https://api.openai.com/v1"
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/{}", base, path)
    }
}

#[async_trait]
impl Provider for OpenAI {
    type Request = OpenAIRequest;
    type Response = OpenAIResponse;

    async fn complete(&self, request: OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let url = self.url("chat/completions");
        let (client, api_key, url, request) = (&self.client, &self.api_key, &url, &request);
        send_with_retry(&self.retry, &self.limiter, "OpenAI chat completion", move || async move {
            let response = client
                .post(url)
                .bearer_auth(api_key)
                .json(request)
                .send()
                .await
                .map_err(connection_error)?;
            read_json::<OpenAIResponse>(response).await
        })
        .await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let response = self
            .client
            .get(self.url("models"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(connection_error)?;
        read_json::<serde_json::Value>(response).await.map(|_| ())
    }

    fn extract_text(response: &OpenAIResponse) -> String {
        response
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .unwrap_or_default()
    }
}
