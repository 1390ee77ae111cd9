//! HTTP gateways to the hosted inference vendors.
//!
//! Gateways speak the vendor wire formats and translate every failure into a
//! [`report_ai::Error`], so retry classification works the same for all vendors.

pub mod gemini;
pub mod openai_compat;

use log::*;
use provider_auth::api_key::ProviderAuth;
use provider_auth::http::{parse_retry_after, AuthenticatedClient, AuthenticatedClientBuilder};
use reqwest::{Response, StatusCode};
use report_ai::Error as AiError;
use std::time::Duration;

/// Longest slice of an error body carried into an error message.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Build a client for one vendor. Requests without `auth` carry no credentials,
/// which is what media downloads and frame probes need.
pub(crate) fn build_client(
    auth: Option<Box<dyn ProviderAuth>>,
    timeout: Duration,
) -> Result<AuthenticatedClient, provider_auth::Error> {
    let mut builder = AuthenticatedClientBuilder::new()
        .with_timeout(timeout)
        .with_user_agent(format!("report-insights/{}", env!("CARGO_PKG_VERSION")));
    if let Some(auth) = auth {
        builder = builder.with_auth(auth);
    }
    Ok(builder.build()?)
}

/// Map a failed send into the transport taxonomy.
pub(crate) fn transport_error(vendor: &str, err: reqwest::Error) -> AiError {
    if err.is_timeout() {
        warn!("{} request timed out: {:?}", vendor, err);
        AiError::Timeout(format!("{} request timed out", vendor))
    } else if err.is_decode() {
        warn!("Failed to decode {} response: {:?}", vendor, err);
        AiError::Provider(format!("Invalid response from {}: {}", vendor, err))
    } else {
        warn!("Failed to reach {}: {:?}", vendor, err);
        AiError::Network(format!("{}: {}", vendor, err))
    }
}

/// Pass a 2xx response through; classify anything else.
///
/// 429 becomes [`AiError::RateLimited`] carrying any `Retry-After` value, and
/// 401/403 become [`AiError::Authentication`]. Every other status is a
/// [`AiError::Provider`] error whose message keeps the vendor's body, so throttling
/// signalled only in the body text is still caught by rate-limit classification.
pub(crate) async fn check_status(vendor: &str, response: Response) -> Result<Response, AiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = parse_retry_after(response.headers());
    let body: String = response
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect();
    warn!("{} API error {}: {}", vendor, status, body);

    Err(match status {
        StatusCode::TOO_MANY_REQUESTS => AiError::RateLimited {
            retry_after_seconds: retry_after,
            message: format!("{} returned {}: {}", vendor, status, body),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AiError::Authentication(format!("{} returned {}: {}", vendor, status, body))
        }
        _ => AiError::Provider(format!("{} returned {}: {}", vendor, status, body)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    async fn fetch(server: &Server, path: &str) -> Response {
        build_client(None, Duration::from_secs(5))
            .unwrap()
            .get(format!("{}{}", server.url(), path))
            .send()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_429_carries_retry_after() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/throttled")
            .with_status(429)
            .with_header("retry-after", "7")
            .with_body("slow down")
            .create_async()
            .await;

        let err = check_status("groq", fetch(&server, "/throttled").await)
            .await
            .unwrap_err();
        assert!(err.is_rate_limit());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
    }

    #[tokio::test]
    async fn test_401_is_authentication() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/models")
            .with_status(401)
            .with_body(r#"{"error": {"message": "Invalid API Key"}}"#)
            .create_async()
            .await;

        let err = check_status("groq", fetch(&server, "/models").await)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Authentication(_)));
        assert!(!err.is_rate_limit());
    }

    #[tokio::test]
    async fn test_quota_body_on_other_status_is_still_rate_limited() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/generate")
            .with_status(503)
            .with_body(r#"{"error": {"status": "RESOURCE_EXHAUSTED"}}"#)
            .create_async()
            .await;

        let err = check_status("gemini", fetch(&server, "/generate").await)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Provider(_)));
        assert!(err.is_rate_limit());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let err = build_client(None, Duration::from_secs(2))
            .unwrap()
            .get("http://127.0.0.1:1/models")
            .send()
            .await
            .map_err(|e| transport_error("openrouter", e))
            .unwrap_err();
        assert!(matches!(err, AiError::Network(_)));
    }
}
