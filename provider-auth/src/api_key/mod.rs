//! API key authentication for hosted AI vendors.
//!
//! Provides traits and implementations for authenticating requests to services
//! that use API keys (Gemini, Groq, OpenRouter, etc.).

mod auth;
mod bearer;

pub use auth::{require_api_key, ApiKeyAuth, ApiKeyProvider, AuthMethod, ProviderAuth};
pub use bearer::BearerTokenAuth;
