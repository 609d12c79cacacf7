/*!
 * Provider-specific concurrency tuning.
 *
 * Defaults for the in-flight limit, call timeout and client-side rate
 * limit, chosen from each backend's rate limits and typical latency.
 */

use crate::app_config::TranslationProvider;

/// Provider-specific concurrency profile with tuned defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Maximum in-flight translation calls
    pub concurrent_requests: usize,
    /// Seconds before one call is abandoned
    pub timeout_secs: u64,
    /// Requests per minute, None for unlimited
    pub rate_limit: Option<u32>,
}

impl ProviderProfile {
    /// Get the profile for a given provider
    pub fn for_provider(provider: TranslationProvider) -> Self {
        match provider {
            TranslationProvider::Ollama => Self {
                // Local server, bounded by the GPU rather than an API quota
                concurrent_requests: 4,
                timeout_secs: 120,
                rate_limit: None,
            },
            TranslationProvider::OpenAI => Self {
                concurrent_requests: 8,
                timeout_secs: 60,
                rate_limit: Some(60),
            },
            TranslationProvider::Anthropic => Self {
                // Standard tier allows 50 rpm
                concurrent_requests: 5,
                timeout_secs: 60,
                rate_limit: Some(45),
            },
            TranslationProvider::LMStudio => Self {
                concurrent_requests: 2,
                timeout_secs: 120,
                rate_limit: None,
            },
            TranslationProvider::ModernMT => Self {
                // Short calls, generous quota
                concurrent_requests: 10,
                timeout_secs: 30,
                rate_limit: Some(120),
            },
        }
    }

    /// Get effective concurrent requests, respecting any user override
    pub fn effective_concurrent_requests(&self, user_override: Option<usize>) -> usize {
        user_override.filter(|&n| n > 0).unwrap_or(self.concurrent_requests)
    }
}
