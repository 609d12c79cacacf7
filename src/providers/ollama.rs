use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{connection_error, classify_status, preview, send_with_retry, Provider, RateLimiter, RetryPolicy};
use crate::errors::ProviderError;

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    retry: RetryPolicy,
    limiter: RateLimiter,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
    /// How long to keep the model loaded in memory
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<String>,
}

/// Generation options for the Ollama API
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation (default: 0.8)
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    #[serde(default)]
    pub response: String,
    /// Whether the generation is complete
    #[serde(default = "default_done")]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

fn default_done() -> bool {
    true
}

/// Version response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: Some(false),
            keep_alive: None,
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }

    /// Set the keep-alive duration
    pub fn keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = Some(keep_alive.into());
        self
    }
}

/// Parse a generate body, accepting a single object or JSONL chunks
pub fn parse_generation_body(body: &str) -> Result<GenerationResponse, ProviderError> {
    if let Ok(response) = serde_json::from_str::<GenerationResponse>(body) {
        return Ok(response);
    }

    // Streamed bodies arrive as one JSON object per line
    let mut chunks = Vec::new();
    for line in body.lines().filter(|line| !line.trim().is_empty()) {
        match serde_json::from_str::<GenerationResponse>(line) {
            Ok(chunk) => chunks.push(chunk),
            Err(e) => {
                error!("Failed to parse Ollama API response line: {}. Raw: {}", e, preview(line));
                return Err(ProviderError::ParseError(format!("{} (body: {})", e, preview(body))));
            }
        }
    }
    let Some(last) = chunks.last() else {
        return Err(ProviderError::ParseError("empty response body".to_string()));
    };

    Ok(GenerationResponse {
        model: last.model.clone(),
        response: chunks.iter().map(|chunk| chunk.response.as_str()).collect(),
        done: last.done,
        prompt_eval_count: last.prompt_eval_count,
        eval_count: last.eval_count,
    })
}

impl Ollama {
    /// Create a new Ollama client from an endpoint such as `http://localhost:11434`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::new_with_config(endpoint, RetryPolicy::default(), None, Duration::from_secs(120))
    }

    /// Create a new Ollama client with configuration
    ///
    /// Ollama uses HTTP/1.1, so connections are pooled and kept alive
    /// rather than multiplexed.
    pub fn new_with_config(
        endpoint: impl Into<String>,
        retry: RetryPolicy,
        rate_limit: Option<u32>,
        timeout: Duration,
    ) -> Self {
        let endpoint = endpoint.into();
        let base_url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", endpoint.trim_end_matches('/'))
        };

        Self {
            base_url,
            client: Client::builder()
                .timeout(timeout)
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .pool_max_idle_per_host(20)
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            retry,
            limiter: RateLimiter::new(rate_limit),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generate text with retry logic
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let (client, url, request) = (&self.client, &url, &request);
        send_with_retry(&self.retry, &self.limiter, "Ollama generate", move || async move {
            let response = client.post(url).json(request).send().await.map_err(connection_error)?;
            let status = response.status();
            let body = response.text().await.map_err(connection_error)?;
            if !status.is_success() {
                return Err(classify_status(status, body));
            }
            parse_generation_body(&body)
        })
        .await
    }

    /// Server version, used as a connectivity check
    pub async fn version(&self) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(format!("{}/api/version", self.base_url))
            .send()
            .await
            .map_err(connection_error)?;
        super::read_json::<VersionResponse>(response).await.map(|v| v.version)
    }
}

#[async_trait]
impl Provider for Ollama {
    type Request = GenerationRequest;
    type Response = GenerationResponse;

    async fn complete(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        self.generate(request).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.version().await.map(|_| ())
    }

    fn extract_text(response: &GenerationResponse) -> String {
        response.response.clone()
    }
}
