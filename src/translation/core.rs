/*!
 * Core translation service implementation.
 *
 * `TranslationCapability` is the seam the document pipeline translates
 * through. `TranslationService` implements it on top of one configured
 * provider; tests substitute `MockProvider`.
 */

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::{debug, info};
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use url::Url;

use super::cache::TranslationCache;
use super::formatting::sanitize_response;
use crate::app_config::{TranslationConfig, TranslationProvider as ConfigTranslationProvider};
use crate::errors::TranslationError;
use crate::language_utils;
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::modernmt::{ModernMT, ModernMTRequest};
use crate::providers::ollama::{GenerationRequest, Ollama};
use crate::providers::openai::{OpenAI, OpenAIRequest};
use crate::providers::{Provider, RetryPolicy};

/// Something that turns text in one language into text in another
#[async_trait]
pub trait TranslationCapability: Send + Sync {
    /// Translate `text`; `source_language` may be "auto"
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError>;

    /// Confirm the backend is reachable before a run
    async fn check_connection(&self) -> Result<(), TranslationError> {
        Ok(())
    }

    /// Human-readable usage summary for the end of a run
    fn usage_summary(&self) -> Option<String> {
        None
    }
}

/// Token usage statistics for tracking API consumption
#[derive(Debug, Clone)]
pub struct TokenUsageStats {
    /// Number of prompt tokens
    pub prompt_tokens: u64,

    /// Number of completion tokens
    pub completion_tokens: u64,

    /// Total number of tokens
    pub total_tokens: u64,

    /// Number of provider calls
    pub requests: u64,

    /// Start time of token tracking
    pub start_time: Instant,

    /// Total time spent on API requests
    pub api_duration: Duration,

    /// Provider name
    pub provider: String,

    /// Model name
    pub model: String,
}

impl Default for TokenUsageStats {
    fn default() -> Self {
        Self::with_provider_info(String::new(), String::new())
    }
}

impl TokenUsageStats {
    /// Create new token usage stats with provider info
    pub fn with_provider_info(provider: String, model: String) -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            requests: 0,
            start_time: Instant::now(),
            api_duration: Duration::from_secs(0),
            provider,
            model,
        }
    }

    /// Record one provider call
    pub fn record(&mut self, prompt_tokens: Option<u64>, completion_tokens: Option<u64>, duration: Duration) {
        self.requests += 1;
        self.api_duration += duration;
        if let Some(pt) = prompt_tokens {
            self.prompt_tokens += pt;
            self.total_tokens += pt;
        }
        if let Some(ct) = completion_tokens {
            self.completion_tokens += ct;
            self.total_tokens += ct;
        }
    }

    /// Calculate tokens per minute rate
    pub fn tokens_per_minute(&self) -> f64 {
        let duration_minutes = if self.api_duration.as_secs_f64() > 0.0 {
            self.api_duration.as_secs_f64() / 60.0
        } else {
            self.start_time.elapsed().as_secs_f64() / 60.0
        };

        if duration_minutes > 0.0 {
            self.total_tokens as f64 / duration_minutes
        } else {
            0.0
        }
    }

    /// Generate a summary of token usage
    pub fn summary(&self) -> String {
        format!(
            "Token usage ({} / {}): {} requests, {} prompt + {} completion = {} tokens, \
             API time {:.1}s, {:.0} tokens/min",
            self.provider,
            self.model,
            self.requests,
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
            self.api_duration.as_secs_f64(),
            self.tokens_per_minute()
        )
    }
}

/// Check that an endpoint parses as an http(s) URL
fn parse_endpoint(endpoint: &str) -> Result<Url> {
    if endpoint.is_empty() {
        return Err(anyhow!("Endpoint cannot be empty"));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };

    if url.host_str().is_none() {
        return Err(anyhow!("Invalid host in endpoint: {}", endpoint));
    }
    Ok(url)
}

/// Translation provider implementation variants
#[derive(Debug)]
enum TranslationProviderImpl {
    Ollama { client: Ollama },
    OpenAI { client: OpenAI },
    /// LM Studio local server (OpenAI-compatible)
    LMStudio { client: OpenAI },
    Anthropic { client: Anthropic },
    ModernMT { client: ModernMT },
}

/// Result of one provider call, before cleanup
struct ProviderAnswer {
    text: String,
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
}

/// Translation capability backed by a configured provider
#[derive(Debug)]
pub struct TranslationService {
    /// Provider implementation
    provider: TranslationProviderImpl,

    /// Configuration for the translation service
    pub config: TranslationConfig,

    /// Translation cache for storing and retrieving translations
    pub cache: TranslationCache,

    usage: Mutex<TokenUsageStats>,
}

impl TranslationService {
    /// Create a new translation service with the given configuration
    pub fn new(config: TranslationConfig) -> Result<Self> {
        let retry = RetryPolicy::new(config.common.retry_count, config.common.retry_backoff_ms);
        let rate_limit = config.get_rate_limit();
        let timeout = Duration::from_secs(config.get_timeout_secs());
        let endpoint = config.get_endpoint();
        parse_endpoint(&endpoint)?;

        let provider = match config.provider {
            ConfigTranslationProvider::Ollama => TranslationProviderImpl::Ollama {
                client: Ollama::new_with_config(endpoint, retry, rate_limit, timeout),
            },
            ConfigTranslationProvider::OpenAI => TranslationProviderImpl::OpenAI {
                client: OpenAI::new_with_config(config.get_api_key(), endpoint, retry, rate_limit, timeout),
            },
            ConfigTranslationProvider::LMStudio => {
                // LM Studio accepts any key
                let api_key = {
                    let k = config.get_api_key();
                    if k.is_empty() { "lm-studio".to_string() } else { k }
                };
                TranslationProviderImpl::LMStudio {
                    client: OpenAI::new_with_config(api_key, endpoint, retry, rate_limit, timeout),
                }
            }
            ConfigTranslationProvider::Anthropic => TranslationProviderImpl::Anthropic {
                client: Anthropic::new_with_config(config.get_api_key(), endpoint, retry, rate_limit, timeout),
            },
            ConfigTranslationProvider::ModernMT => TranslationProviderImpl::ModernMT {
                client: ModernMT::new_with_config(config.get_api_key(), endpoint, retry, rate_limit, timeout),
            },
        };

        let usage = TokenUsageStats::with_provider_info(
            config.provider.display_name().to_string(),
            config.get_model(),
        );

        Ok(Self {
            provider,
            cache: TranslationCache::new(config.common.enable_cache),
            config,
            usage: Mutex::new(usage),
        })
    }

    /// Snapshot of the token usage so far
    pub fn token_usage(&self) -> TokenUsageStats {
        self.usage.lock().clone()
    }

    /// Build the system prompt from the configured template
    fn system_prompt(&self, source_language: &str, target_language: &str) -> String {
        let target_name =
            language_utils::get_language_name(target_language).unwrap_or_else(|_| target_language.to_string());
        let template = &self.config.common.system_prompt;
        if language_utils::is_auto(source_language) {
            template
                .replace(" from {source_language}", "")
                .replace("{source_language}", "the source language")
                .replace("{target_language}", &target_name)
        } else {
            let source_name =
                language_utils::get_language_name(source_language).unwrap_or_else(|_| source_language.to_string());
            template
                .replace("{source_language}", &source_name)
                .replace("{target_language}", &target_name)
        }
    }

    async fn call_provider(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<ProviderAnswer, TranslationError> {
        let model = self.config.get_model();
        let temperature = self.config.common.temperature;

        match &self.provider {
            TranslationProviderImpl::Ollama { client } => {
                let request = GenerationRequest::new(model, text)
                    .system(self.system_prompt(source_language, target_language))
                    .temperature(temperature);
                let response = client.complete(request).await?;
                Ok(ProviderAnswer {
                    text: Ollama::extract_text(&response),
                    prompt_tokens: response.prompt_eval_count,
                    completion_tokens: response.eval_count,
                })
            }
            TranslationProviderImpl::OpenAI { client } | TranslationProviderImpl::LMStudio { client } => {
                let request = OpenAIRequest::new(&model)
                    .add_message("system", self.system_prompt(source_language, target_language))
                    .add_message("user", text)
                    .temperature(temperature)
                    .max_tokens(max_tokens_for_model(&model));
                let response = client.complete(request).await?;
                let usage = response.usage.as_ref();
                Ok(ProviderAnswer {
                    text: OpenAI::extract_text(&response),
                    prompt_tokens: usage.map(|u| u.prompt_tokens as u64),
                    completion_tokens: usage.map(|u| u.completion_tokens as u64),
                })
            }
            TranslationProviderImpl::Anthropic { client } => {
                let request = AnthropicRequest::new(&model, max_tokens_for_model(&model))
                    .system(self.system_prompt(source_language, target_language))
                    .add_message("user", text)
                    .temperature(temperature);
                let response = client.complete(request).await?;
                Ok(ProviderAnswer {
                    text: Anthropic::extract_text(&response),
                    prompt_tokens: Some(response.usage.input_tokens as u64),
                    completion_tokens: Some(response.usage.output_tokens as u64),
                })
            }
            TranslationProviderImpl::ModernMT { client } => {
                let source = if language_utils::is_auto(source_language) {
                    None
                } else {
                    Some(modernmt_code(source_language)?)
                };
                let target = modernmt_code(target_language)?;
                let request = ModernMTRequest::new(source.as_deref(), &target, text);
                let response = client.complete(request).await?;
                Ok(ProviderAnswer {
                    text: ModernMT::extract_text(&response),
                    prompt_tokens: None,
                    completion_tokens: response.data.as_ref().and_then(|d| d.billed_characters),
                })
            }
        }
    }

    /// Translate a single text string
    pub async fn translate_text(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        if let Some(cached) = self.cache.get(text, source_language, target_language) {
            return Ok(cached);
        }

        let start_time = Instant::now();
        let answer = self.call_provider(text, source_language, target_language).await?;
        let duration = start_time.elapsed();
        self.usage.lock().record(answer.prompt_tokens, answer.completion_tokens, duration);

        let translated = if self.is_llm() {
            sanitize_response(text, &answer.text)
        } else {
            answer.text
        };
        if translated.trim().is_empty() {
            return Err(TranslationError::EmptyResponse);
        }
        debug!(
            "{} answered in {:?}: '{}'",
            self.config.provider.display_name(),
            duration,
            crate::providers::preview(&translated)
        );

        self.cache.store(text, source_language, target_language, &translated);
        Ok(translated)
    }

    fn is_llm(&self) -> bool {
        !matches!(self.provider, TranslationProviderImpl::ModernMT { .. })
    }
}

#[async_trait]
impl TranslationCapability for TranslationService {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        self.translate_text(text, source_language, target_language).await
    }

    async fn check_connection(&self) -> Result<(), TranslationError> {
        info!(
            "Testing connection to {} with model {}",
            self.config.provider.display_name(),
            self.config.get_model()
        );
        let result = match &self.provider {
            TranslationProviderImpl::Ollama { client } => client.test_connection().await,
            TranslationProviderImpl::OpenAI { client } | TranslationProviderImpl::LMStudio { client } => {
                client.test_connection().await
            }
            TranslationProviderImpl::Anthropic { client } => client.test_connection().await,
            TranslationProviderImpl::ModernMT { client } => client.test_connection().await,
        };
        result.map_err(TranslationError::Provider)
    }

    fn usage_summary(&self) -> Option<String> {
        let usage = self.usage.lock();
        (usage.requests > 0).then(|| usage.summary())
    }
}

/// ModernMT takes ISO 639-1 codes where one exists
fn modernmt_code(language: &str) -> Result<String, TranslationError> {
    language_utils::normalize_to_part1_or_part2t(language).map_err(|_| TranslationError::Language(language.to_string()))
}

/// Get the maximum number of completion tokens for a given model
fn max_tokens_for_model(model: &str) -> u32 {
    match model {
        "gpt-4" | "gpt-4-0613" => 8192,
        "gpt-4-32k" | "gpt-4-32k-0613" => 32768,
        "gpt-3.5-turbo-16k" | "gpt-3.5-turbo-16k-0613" => 16384,
        m if m.starts_with("gpt-4o") || m.starts_with("gpt-4-turbo") => 4096,
        m if m.starts_with("gpt-3.5-turbo") => 4096,
        m if m.starts_with("claude-3-5") || m.starts_with("claude-3-7") => 8192,
        m if m.starts_with("claude") => 4096,
        _ => 2048,
    }
}
