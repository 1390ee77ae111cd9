//! Error types for report AI operations.

use std::fmt;
use std::time::Duration;

/// Number of characters of a model response kept in a [`ParseError`] preview.
const PREVIEW_CHARS: usize = 200;

/// Message substrings that vendors use to signal throttling outside of an HTTP 429.
const RATE_LIMIT_MARKERS: &[&str] = &["rate_limit", "rate limit", "resource_exhausted", "quota"];

/// Universal error type that abstracts provider-specific errors into common variants.
///
/// All provider implementations map their native errors to these variants, so the
/// retry policy and the callers can classify a failure without knowing the vendor.
#[derive(Debug)]
pub enum Error {
    /// API key rejected, expired, or lacking the permissions for the requested model.
    Authentication(String),

    /// Network connectivity issues, DNS failures, or refused connections.
    Network(String),

    /// Missing API key, unknown model, or otherwise unusable configuration.
    /// Raised at provider construction and never retried.
    Configuration(String),

    /// Non-2xx response or vendor-side failure that is not a throttling signal.
    Provider(String),

    /// The request exceeded its deadline.
    Timeout(String),

    /// The vendor throttled the request. `retry_after_seconds` carries the
    /// `Retry-After` value when the vendor supplied one.
    RateLimited {
        retry_after_seconds: Option<u64>,
        message: String,
    },

    /// Terminal state after every retry attempt hit a rate limit.
    RateLimitExceeded,

    /// No JSON document could be recovered from the model output.
    Parse(ParseError),

    /// Failed to serialize a request payload.
    Serialization(String),

    /// Catch-all for errors that don't fit other categories.
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Whether this failure is a throttling response eligible for backoff-retry.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Error::RateLimited { .. } => true,
            Error::Provider(msg) | Error::Network(msg) => contains_rate_limit_marker(msg),
            Error::Other(err) => contains_rate_limit_marker(&err.to_string()),
            _ => false,
        }
    }

    /// Delay requested by the vendor through a `Retry-After` header, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimited {
                retry_after_seconds: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

fn contains_rate_limit_marker(message: &str) -> bool {
    let lower = message.to_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|marker| lower.contains(marker))
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Authentication(msg) => write!(f, "Authentication failed: {}", msg),
            Error::Network(msg) => write!(f, "Network error: {}", msg),
            Error::Configuration(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::Provider(msg) => write!(f, "Provider error: {}", msg),
            Error::Timeout(msg) => write!(f, "Timeout: {}", msg),
            Error::RateLimited {
                retry_after_seconds,
                message,
            } => match retry_after_seconds {
                Some(secs) => write!(f, "Rate limited: retry after {}s ({})", secs, message),
                None => write!(f, "Rate limited: {}", message),
            },
            Error::RateLimitExceeded => write!(
                f,
                "Rate limit exceeded. Please wait a moment and try again."
            ),
            Error::Parse(err) => write!(f, "{}", err),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::Other(err) => write!(f, "Other error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(err)
    }
}

/// The model output could not be turned into the expected JSON document.
///
/// Carries a bounded preview of the original response so a prompt/response
/// mismatch can be diagnosed from logs alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub preview: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>, original: &str) -> Self {
        Self {
            message: message.into(),
            preview: preview(original),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to parse model response: {} (response preview: {:?})",
            self.message, self.preview
        )
    }
}

impl std::error::Error for ParseError {}

/// First `PREVIEW_CHARS` characters of `text`, with an ellipsis when truncated.
fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}
