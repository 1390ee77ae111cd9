//! Chat inference provider trait.

use crate::retry::RetryPolicy;
use crate::types::chat::ChatRequest;
use crate::Error;
use async_trait::async_trait;
use std::time::Duration;

/// Abstraction for a hosted LLM chat endpoint.
///
/// Implementations translate a vendor-neutral [`ChatRequest`] into their own wire
/// format and return the text of the first choice. Every insight call goes through
/// this trait, so swapping backends never touches prompt or decoding code.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Run a single inference call and return the model's reply text.
    ///
    /// Implementations must map HTTP 429 to [`Error::RateLimited`] so the retry
    /// policy can recognise throttling. No retries happen inside this call.
    async fn complete(&self, request: ChatRequest) -> std::result::Result<String, Error>;

    /// Return unique identifier for this provider (e.g., "gemini", "groq").
    ///
    /// Used for logging and provider selection.
    /// Must be lowercase, alphanumeric with underscores only.
    fn provider_id(&self) -> &'static str;

    /// Validate API credentials by making a lightweight test request.
    ///
    /// Returns false if credentials are invalid, expired, or lack permissions.
    async fn verify_credentials(&self) -> std::result::Result<bool, Error>;

    /// Retry policy tuned to this backend's rate limits.
    fn default_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
    }

    /// Precise delay the vendor asked for before retrying `error`, if any.
    ///
    /// Defaults to the `Retry-After` header value carried by [`Error::RateLimited`].
    fn retry_delay_hint(&self, error: &Error) -> Option<Duration> {
        error.retry_after()
    }
}
