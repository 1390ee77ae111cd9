//! Pre-configured provider settings.

use std::time::Duration;

use crate::api_key::ApiKeyProvider;

/// Provider configuration with endpoints and settings.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider identifier.
    pub provider: ApiKeyProvider,
    /// Base API URL.
    pub base_url: String,
    /// Base delay for rate-limit backoff. Vendors with tighter free-tier
    /// quotas get a longer base.
    pub retry_base_delay: Duration,
}

impl ProviderConfig {
    /// Replace the base URL, e.g. with a mock server in tests.
    pub fn with_base_url(mut self, base_url: Option<&str>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        self
    }
}

/// Get Gemini configuration.
pub fn gemini_config() -> ProviderConfig {
    ProviderConfig {
        provider: ApiKeyProvider::Gemini,
        base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        retry_base_delay: Duration::from_secs(5),
    }
}

/// Get Groq configuration.
pub fn groq_config() -> ProviderConfig {
    ProviderConfig {
        provider: ApiKeyProvider::Groq,
        base_url: "https://api.groq.com/openai/v1".to_string(),
        retry_base_delay: Duration::from_secs(3),
    }
}

/// Get OpenRouter configuration.
pub fn openrouter_config() -> ProviderConfig {
    ProviderConfig {
        provider: ApiKeyProvider::OpenRouter,
        base_url: "https://openrouter.ai/api/v1".to_string(),
        retry_base_delay: Duration::from_secs(3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_config() {
        let config = gemini_config();
        assert_eq!(config.provider, ApiKeyProvider::Gemini);
        assert_eq!(
            config.base_url,
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(config.retry_base_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_groq_config() {
        let config = groq_config();
        assert_eq!(config.provider, ApiKeyProvider::Groq);
        assert_eq!(config.base_url, "https://api.groq.com/openai/v1");
    }

    #[test]
    fn test_base_url_override_strips_trailing_slash() {
        let config = openrouter_config().with_base_url(Some("http://127.0.0.1:1234/"));
        assert_eq!(config.base_url, "http://127.0.0.1:1234");

        let untouched = openrouter_config().with_base_url(None);
        assert_eq!(untouched.base_url, "https://openrouter.ai/api/v1");
    }
}
