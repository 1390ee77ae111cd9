//! Standard Bearer token authentication.

use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};

use super::{ApiKeyProvider, AuthMethod, ProviderAuth};

/// Standard Bearer token authentication.
///
/// Uses the standard `Authorization: Bearer <token>` header pattern shared by
/// OpenAI-compatible endpoints.
pub struct BearerTokenAuth {
    provider: ApiKeyProvider,
    token: SecretString,
}

impl BearerTokenAuth {
    /// Create a new Bearer token authenticator.
    pub fn new(provider: ApiKeyProvider, token: SecretString) -> Self {
        Self { provider, token }
    }

    /// Get a reference to the token.
    pub fn token(&self) -> &SecretString {
        &self.token
    }
}

impl ProviderAuth for BearerTokenAuth {
    fn provider(&self) -> ApiKeyProvider {
        self.provider
    }

    fn auth_method(&self) -> AuthMethod {
        AuthMethod::BearerToken
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.token.expose_secret())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_auth_creation() {
        let token = SecretString::from("test_token".to_string());
        let auth = BearerTokenAuth::new(ApiKeyProvider::OpenRouter, token);

        assert_eq!(auth.provider(), ApiKeyProvider::OpenRouter);
        assert_eq!(auth.auth_method(), AuthMethod::BearerToken);
    }

    #[test]
    fn test_bearer_header_is_applied() {
        let auth = BearerTokenAuth::new(
            ApiKeyProvider::Groq,
            SecretString::from("gsk_test".to_string()),
        );
        let request = auth
            .authenticate(reqwest::Client::new().post("http://localhost/chat/completions"))
            .build()
            .unwrap();
        assert_eq!(request.headers()["authorization"], "Bearer gsk_test");
    }
}
