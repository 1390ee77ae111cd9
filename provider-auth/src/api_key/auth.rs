//! API key authentication trait and implementation.

use log::*;
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{api_key_error, ApiKeyErrorKind, Error};

/// Known API key providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyProvider {
    Gemini,
    Groq,
    OpenRouter,
}

impl ApiKeyProvider {
    /// Get the provider identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyProvider::Gemini => "gemini",
            ApiKeyProvider::Groq => "groq",
            ApiKeyProvider::OpenRouter => "openrouter",
        }
    }

    /// Environment variable the provider's API key is read from.
    pub fn env_var(&self) -> &'static str {
        match self {
            ApiKeyProvider::Gemini => "GEMINI_API_KEY",
            ApiKeyProvider::Groq => "GROQ_API_KEY",
            ApiKeyProvider::OpenRouter => "OPENROUTER_API_KEY",
        }
    }
}

/// Authentication method for HTTP requests.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthMethod {
    /// Custom header with optional prefix (e.g., "x-goog-api-key: xxx")
    ApiKeyHeader {
        header_name: String,
        prefix: Option<String>,
    },
    /// Standard Bearer token
    BearerToken,
}

/// Trait for authenticating HTTP requests with API keys or bearer tokens.
///
/// Implementations handle provider-specific authentication patterns like:
/// - Gemini: `x-goog-api-key: xxx`
/// - Groq / OpenRouter: `Authorization: Bearer xxx`
pub trait ProviderAuth: Send + Sync {
    /// Get the provider identifier.
    fn provider(&self) -> ApiKeyProvider;

    /// Get the authentication method used by this provider.
    fn auth_method(&self) -> AuthMethod;

    /// Apply authentication to a request builder.
    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder;
}

/// Fail fast when a provider's API key is missing or blank.
///
/// Providers call this at construction so a misconfigured deployment fails on
/// startup rather than on its first analysis.
pub fn require_api_key(
    provider: ApiKeyProvider,
    api_key: Option<SecretString>,
) -> Result<SecretString, Error> {
    match api_key {
        Some(key) if !key.expose_secret().trim().is_empty() => Ok(key),
        _ => {
            error!(
                "{} is not set; the {} provider cannot be constructed",
                provider.env_var(),
                provider.as_str()
            );
            Err(api_key_error(
                ApiKeyErrorKind::NotFound,
                &format!("{} is not set", provider.env_var()),
            ))
        }
    }
}

/// API key authentication implementation.
///
/// Supports custom header names and prefixes for various provider authentication patterns.
///
/// # Examples
///
/// ```rust,ignore
/// // Gemini: x-goog-api-key: xxx
/// let auth = ApiKeyAuth::new(ApiKeyProvider::Gemini, SecretString::from("api_key_here".to_string()));
/// ```
pub struct ApiKeyAuth {
    provider: ApiKeyProvider,
    api_key: SecretString,
    header_name: String,
    prefix: Option<String>,
}

impl ApiKeyAuth {
    /// Create a new API key authenticator.
    ///
    /// # Arguments
    ///
    /// * `provider` - The API provider
    /// * `api_key` - The API key (stored securely)
    pub fn new(provider: ApiKeyProvider, api_key: SecretString) -> Self {
        let (header_name, prefix) = match provider {
            ApiKeyProvider::Gemini => ("x-goog-api-key".to_string(), None),
            ApiKeyProvider::Groq | ApiKeyProvider::OpenRouter => {
                ("Authorization".to_string(), Some("Bearer".to_string()))
            }
        };

        Self {
            provider,
            api_key,
            header_name,
            prefix,
        }
    }

    /// Get a reference to the API key.
    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }
}

impl ProviderAuth for ApiKeyAuth {
    fn provider(&self) -> ApiKeyProvider {
        self.provider
    }

    fn auth_method(&self) -> AuthMethod {
        AuthMethod::ApiKeyHeader {
            header_name: self.header_name.clone(),
            prefix: self.prefix.clone(),
        }
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        let auth_value = if let Some(prefix) = &self.prefix {
            format!("{} {}", prefix, self.api_key.expose_secret())
        } else {
            self.api_key.expose_secret().to_string()
        };

        request.header(&self.header_name, auth_value)
    }
}
