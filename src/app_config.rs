use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::document::Granularity;
use crate::language_utils;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO) or "auto"
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO) or English name
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Document handling
    #[serde(default)]
    pub document: DocumentConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Ollama
    Ollama,
    // @provider: OpenAI
    #[default]
    OpenAI,
    // @provider: Anthropic
    Anthropic,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
    // @provider: ModernMT machine translation
    ModernMT,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::LMStudio => "LM Studio",
            Self::ModernMT => "ModernMT",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
            Self::ModernMT => "modernmt".to_string(),
        }
    }

    // @returns: Environment variable holding the API key, if the provider needs one
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::ModernMT => Some("MODERNMT_API_KEY"),
            Self::Ollama | Self::LMStudio => None,
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "lmstudio" => Ok(Self::LMStudio),
            "modernmt" => Ok(Self::ModernMT),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name (ignored by ModernMT)
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Max in-flight translation calls
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    // @field: Timeout seconds for one translation call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Rate limit (requests per minute)
    #[serde(default)]
    pub rate_limit: Option<u32>,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        let profile = crate::translation::concurrency::ProviderProfile::for_provider(provider_type);
        let (model, endpoint) = match provider_type {
            TranslationProvider::Ollama => (default_ollama_model(), default_ollama_endpoint()),
            TranslationProvider::OpenAI => (default_openai_model(), default_openai_endpoint()),
            TranslationProvider::Anthropic => (default_anthropic_model(), default_anthropic_endpoint()),
            TranslationProvider::LMStudio => (default_lmstudio_model(), default_lmstudio_endpoint()),
            TranslationProvider::ModernMT => (String::new(), default_modernmt_endpoint()),
        };
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model,
            api_key: String::new(),
            endpoint,
            concurrent_requests: profile.concurrent_requests,
            timeout_secs: profile.timeout_secs,
            rate_limit: profile.rate_limit,
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// System prompt template for translation
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff base for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Reuse translations of identical text within a service's lifetime
    #[serde(default = "default_true")]
    pub enable_cache: bool,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
            enable_cache: true,
        }
    }
}

/// Document handling settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DocumentConfig {
    // @field: Indexing granularity; None picks the format default
    #[serde(default)]
    pub granularity: Option<Granularity>,

    // @field: Also translate headers, footers and notes
    #[serde(default)]
    pub include_auxiliary_parts: bool,

    // @field: Override right-to-left detection either way
    #[serde(default)]
    pub force_rtl: Option<bool>,

    // @field: Parent directory for working areas; None uses the system temp dir
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

pub(crate) fn default_concurrent_requests() -> usize {
    4
}

pub(crate) fn default_timeout_secs() -> u64 {
    30
}

fn default_source_language() -> String {
    language_utils::AUTO_LANGUAGE.to_string()
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_lmstudio_endpoint() -> String {
    // LM Studio serves the OpenAI API on port 1234 under /v1
    "http://localhost:1234/v1".to_string()
}

fn default_modernmt_endpoint() -> String {
    "https://api.modernmt.com".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

fn default_lmstudio_model() -> String {
    "local-model".to_string()
}

pub(crate) fn default_system_prompt() -> String {
    "You are a professional translator. Translate the following text from {source_language} to {target_language}. \
     Return only the translated text as plain text, without quotes, explanations or markup. \
     Keep numbers, names and punctuation as they are."
        .to_string()
}

impl Config {
    /// Load a configuration file, writing the defaults first when it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            log::warn!("Config file not found at '{}', creating default config.", path.display());
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if !language_utils::is_auto(&self.source_language) {
            language_utils::resolve_language(&self.source_language).context("Invalid source language")?;
        }
        language_utils::resolve_language(&self.target_language).context("Invalid target language")?;

        let provider = self.translation.provider;
        if provider.api_key_env_var().is_some() && self.translation.get_api_key().is_empty() {
            return Err(anyhow!(
                "Translation API key is required for {} provider",
                provider.display_name()
            ));
        }

        if self.translation.optimal_concurrent_requests() == 0 {
            return Err(anyhow!("concurrent_requests must be greater than 0"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: "fr".to_string(),
            translation: TranslationConfig::default(),
            document: DocumentConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    pub fn optimal_concurrent_requests(&self) -> usize {
        self.get_active_provider_config()
            .map(|provider_config| provider_config.concurrent_requests)
            .unwrap_or_else(default_concurrent_requests)
    }

    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter().find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration, created with defaults if missing
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let index = match self.available_providers.iter().position(|p| p.provider_type == provider_str) {
            Some(index) => index,
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[index]
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }
        ProviderConfig::new(self.provider).model
    }

    /// Get the API key for the active provider, falling back to its environment variable
    pub fn get_api_key(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }
        self.provider
            .api_key_env_var()
            .and_then(|var| std::env::var(var).ok())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }
        ProviderConfig::new(self.provider).endpoint
    }

    /// Get the per-call timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|provider_config| provider_config.timeout_secs)
            .filter(|&secs| secs > 0)
            .unwrap_or_else(default_timeout_secs)
    }

    /// Get the rate limit for the active provider
    pub fn get_rate_limit(&self) -> Option<u32> {
        match self.get_active_provider_config() {
            Some(provider_config) => provider_config.rate_limit,
            None => ProviderConfig::new(self.provider).rate_limit,
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: vec![
                ProviderConfig::new(TranslationProvider::OpenAI),
                ProviderConfig::new(TranslationProvider::Anthropic),
                ProviderConfig::new(TranslationProvider::Ollama),
                ProviderConfig::new(TranslationProvider::LMStudio),
                ProviderConfig::new(TranslationProvider::ModernMT),
            ],
            common: TranslationCommonConfig::default(),
        }
    }
}
