/*!
 * ModernMT machine-translation client.
 *
 * Unlike the LLM providers there is no prompt: the API takes the text and
 * ISO 639-1 language codes and answers with the translation only.
 */

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{connection_error, read_json, send_with_retry, Provider, RateLimiter, RetryPolicy};
use crate::errors::ProviderError;

#[derive(Debug)]
pub struct ModernMT {
    client: Client,
    api_key: String,
    endpoint: String,
    retry: RetryPolicy,
    limiter: RateLimiter,
}

/// Query of a `/translate` call
#[derive(Debug, Clone, Serialize)]
pub struct ModernMTRequest {
    /// Omitted to let the service detect the source language
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub target: String,
    pub q: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModernMTTranslation {
    pub translation: String,
    #[serde(rename = "billedCharacters", default)]
    pub billed_characters: Option<u64>,
    #[serde(rename = "detectedLanguage", default)]
    pub detected_language: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModernMTError {
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModernMTResponse {
    pub status: u16,
    #[serde(default)]
    pub data: Option<ModernMTTranslation>,
    #[serde(default)]
    pub error: Option<ModernMTError>,
}

impl ModernMTRequest {
    pub fn new(source: Option<&str>, target: &str, text: &str) -> Self {
        Self {
            source: source.map(str::to_string),
            target: target.to_string(),
            q: text.to_string(),
        }
    }
}

impl ModernMT {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new_with_config(api_key, endpoint, RetryPolicy::default(), None, Duration::from_secs(60))
    }

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
            "https://api.modernmt.com"
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/{}", base, path)
    }
}

/// The API reports errors in the body as well as in the status line
fn check_body(response: ModernMTResponse) -> Result<ModernMTResponse, ProviderError> {
    if response.status == 200 && response.data.is_some() {
        return Ok(response);
    }
    let message = response
        .error
        .map(|e| format!("{}: {}", e.error_type, e.message))
        .unwrap_or_else(|| "response carried no translation".to_string());
    Err(match response.status {
        200 => ProviderError::ParseError(message),
        401 | 403 => ProviderError::AuthenticationError(message),
        429 => ProviderError::RateLimitExceeded(message),
        status_code => ProviderError::ApiError { status_code, message },
    })
}

#[async_trait]
impl Provider for ModernMT {
    type Request = ModernMTRequest;
    type Response = ModernMTResponse;

    async fn complete(&self, request: ModernMTRequest) -> Result<ModernMTResponse, ProviderError> {
        let url = self.url("translate");
        let (client, api_key, url, request) = (&self.client, &self.api_key, &url, &request);
        send_with_retry(&self.retry, &self.limiter, "ModernMT translate", move || async move {
            let response = client
                .get(url)
                .header("MMT-ApiKey", api_key)
                .header("MMT-Platform", "yadtwai")
                .query(request)
                .send()
                .await
                .map_err(connection_error)?;
            check_body(read_json::<ModernMTResponse>(response).await?)
        })
        .await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let response = self
            .client
            .get(self.url("languages"))
            .header("MMT-ApiKey", &self.api_key)
            .send()
            .await
            .map_err(connection_error)?;
        read_json::<serde_json::Value>(response).await.map(|_| ())
    }

    fn extract_text(response: &ModernMTResponse) -> String {
        response
            .data
            .as_ref()
            .map(|data| data.translation.clone())
            .unwrap_or_default()
    }
}
