//! Error types for the `domain` layer.
use provider_auth::error::{ErrorKind as ProviderAuthErrorKind, HttpErrorKind};
use report_ai::Error as ReportAiError;
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field holds the original error that caused
/// the domain error. Errors are translated between layers while maintaining
/// layer boundaries: `domain` depends on `report-ai` and `provider-auth`, and the
/// binary depends on `domain` without reaching into those crates' error types.
///
/// Failures from insight generation keep the classification they had at the
/// provider boundary, so a rate limit stays a rate limit and a parse failure
/// stays a parse failure.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    /// Missing API key or an unusable setting. Never retried.
    Config,
    /// The model answered but no JSON document could be recovered.
    Parse,
    Other(String),
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    Timeout,
    Authentication,
    /// A single throttled response that did not pass through a retry policy.
    RateLimited,
    /// Every retry attempt was throttled.
    RateLimitExceeded,
    Provider,
    Other(String),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error {
            source: Some(message.into().into()),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Domain Error: {:?}: {}", self.error_kind, source),
            None => write!(f, "Domain Error: {:?}", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `report-ai` layer to the `domain` layer.
impl From<ReportAiError> for Error {
    fn from(err: ReportAiError) -> Self {
        let error_kind = match &err {
            ReportAiError::Authentication(_) => {
                DomainErrorKind::External(ExternalErrorKind::Authentication)
            }
            ReportAiError::Network(_) => DomainErrorKind::External(ExternalErrorKind::Network),
            ReportAiError::Timeout(_) => DomainErrorKind::External(ExternalErrorKind::Timeout),
            ReportAiError::Provider(_) => DomainErrorKind::External(ExternalErrorKind::Provider),
            ReportAiError::RateLimited { .. } => {
                DomainErrorKind::External(ExternalErrorKind::RateLimited)
            }
            ReportAiError::RateLimitExceeded => {
                DomainErrorKind::External(ExternalErrorKind::RateLimitExceeded)
            }
            ReportAiError::Configuration(_) => DomainErrorKind::Internal(InternalErrorKind::Config),
            ReportAiError::Parse(_) => DomainErrorKind::Internal(InternalErrorKind::Parse),
            ReportAiError::Serialization(_) => DomainErrorKind::Internal(InternalErrorKind::Other(
                "Failed to serialize request".to_string(),
            )),
            ReportAiError::Other(_) => DomainErrorKind::Internal(InternalErrorKind::Other(
                "Unclassified report AI error".to_string(),
            )),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<provider_auth::Error> for Error {
    fn from(err: provider_auth::Error) -> Self {
        let error_kind = match &err.error_kind {
            ProviderAuthErrorKind::ApiKey(_) => DomainErrorKind::Internal(InternalErrorKind::Config),
            ProviderAuthErrorKind::Http(HttpErrorKind::BuilderFailed) => DomainErrorKind::Internal(
                InternalErrorKind::Other("Failed to build HTTP client".to_string()),
            ),
            ProviderAuthErrorKind::Http(_) => DomainErrorKind::External(ExternalErrorKind::Network),
        };
        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}
