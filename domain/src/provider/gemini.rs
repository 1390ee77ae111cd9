//! Gemini backend: media is downloaded and sent inline.

use super::{api_key_for, InferenceSettings};
use crate::error::Error;
use crate::gateway::build_client;
use crate::gateway::gemini::GeminiClient;
use crate::video::{decode_analysis, instruction, SYSTEM_PROMPT};
use async_trait::async_trait;
use log::*;
use provider_auth::api_key::{ApiKeyAuth, ApiKeyProvider};
use provider_auth::providers::gemini_config;
use report_ai::retry::parse_retry_hint;
use report_ai::traits::{chat, video};
use report_ai::types::chat::{ChatRequest, Message, Part};
use report_ai::{Error as AiError, RetryPolicy, VideoAnalysisResult};
use service::config::{Config, ProviderKind};
use std::time::Duration;

pub struct GeminiProvider {
    gateway: GeminiClient,
    model: String,
    settings: InferenceSettings,
}

impl GeminiProvider {
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let api_key = api_key_for(config, ProviderKind::Gemini)?;
        let vendor = gemini_config().with_base_url(config.base_url(ProviderKind::Gemini));
        let settings = InferenceSettings::from_config(config, vendor.retry_base_delay);

        let api = build_client(
            Some(Box::new(ApiKeyAuth::new(ApiKeyProvider::Gemini, api_key))),
            settings.request_timeout,
        )?;
        let media = build_client(None, settings.request_timeout)?;

        debug!("Gemini provider using model {}", config.gemini_model);
        Ok(Self {
            gateway: GeminiClient::new(api, media, vendor.base_url),
            model: config.gemini_model.clone(),
            settings,
        })
    }
}

#[async_trait]
impl chat::Provider for GeminiProvider {
    async fn complete(&self, request: ChatRequest) -> Result<String, AiError> {
        self.gateway.generate_content(&self.model, &request).await
    }

    fn provider_id(&self) -> &'static str {
        "gemini"
    }

    async fn verify_credentials(&self) -> Result<bool, AiError> {
        self.gateway.verify_credentials().await
    }

    fn default_retry_policy(&self) -> RetryPolicy {
        self.settings.retry.clone()
    }

    /// Gemini states the wait in the error body (`"retryDelay": "21s"`) more
    /// often than in a `Retry-After` header.
    fn retry_delay_hint(&self, error: &AiError) -> Option<Duration> {
        error
            .retry_after()
            .or_else(|| parse_retry_hint(&error.to_string()))
    }
}

#[async_trait]
impl video::Analyzer for GeminiProvider {
    async fn analyze_video(&self, media_url: &str, mime_type: &str) -> Result<VideoAnalysisResult, AiError> {
        let data = self.gateway.fetch_inline(media_url).await?;
        let request = self.settings.request(
            SYSTEM_PROMPT,
            Message::user_parts(vec![
                Part::Text(instruction(mime_type, None, None)),
                Part::InlineData {
                    mime_type: mime_type.to_string(),
                    data,
                },
            ]),
        );

        let (gateway, model, request) = (&self.gateway, self.model.as_str(), &request);
        let raw = self
            .settings
            .retry
            .run_with_hint(
                move || gateway.generate_content(model, request),
                |e| chat::Provider::retry_delay_hint(self, e),
            )
            .await?;
        Ok(decode_analysis(&raw))
    }

    fn provider_id(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::tests::test_config;
    use mockito::{Matcher, Server};
    use report_ai::types::video::UNTITLED_RECORDING;
    use report_ai::MAX_RETRIES;
    use serde_json::json;

    fn provider(server_url: &str) -> GeminiProvider {
        let config = test_config(ProviderKind::Gemini)
            .set_api_key(ProviderKind::Gemini, Some("AIza-test".to_string()))
            .set_base_url(ProviderKind::Gemini, server_url.to_string());
        GeminiProvider::from_config(&config).unwrap()
    }

    #[test]
    fn test_retry_hint_read_from_error_body() {
        let provider = provider("http://127.0.0.1:1");
        let err = AiError::RateLimited {
            retry_after_seconds: None,
            message: r#"gemini returned 429: {"retryDelay": "21s"}"#.to_string(),
        };
        assert_eq!(
            chat::Provider::retry_delay_hint(&provider, &err),
            Some(Duration::from_secs(21))
        );

        let header = AiError::RateLimited {
            retry_after_seconds: Some(4),
            message: r#"{"retryDelay": "21s"}"#.to_string(),
        };
        assert_eq!(
            chat::Provider::retry_delay_hint(&provider, &header),
            Some(Duration::from_secs(4))
        );
    }

    #[tokio::test]
    async fn test_analyze_video_sends_inline_bytes() {
        let mut server = Server::new_async().await;
        let media = server
            .mock("GET", "/recordings/bug.webm")
            .with_status(200)
            .with_body("hello")
            .create_async()
            .await;
        let generate = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .match_body(Matcher::PartialJson(json!({
                "contents": [{ "role": "user", "parts": [
                    { "text": instruction("video/webm", None, None) },
                    { "inline_data": { "mime_type": "video/webm", "data": "aGVsbG8=" } }
                ]}]
            })))
            .with_status(200)
            .with_body(
                json!({ "candidates": [{ "content": { "parts": [{ "text":
                    "{\"title\": \"Checkout button unresponsive\", \"description\": \"Nothing happens.\", \"transcript\": \"00:02 - Clicks Pay\"}"
                }]}}]})
                .to_string(),
            )
            .create_async()
            .await;

        let mut config = test_config(ProviderKind::Gemini)
            .set_api_key(ProviderKind::Gemini, Some("AIza-test".to_string()))
            .set_base_url(ProviderKind::Gemini, server.url());
        config.gemini_model = "gemini-2.0-flash".to_string();
        let provider = GeminiProvider::from_config(&config).unwrap();

        let result = video::Analyzer::analyze_video(
            &provider,
            &format!("{}/recordings/bug.webm", server.url()),
            "video/webm",
        )
        .await
        .unwrap();

        assert_eq!(result.title, "Checkout button unresponsive");
        media.assert_async().await;
        generate.assert_async().await;
    }

    #[tokio::test]
    async fn test_analyze_video_degrades_on_prose() {
        let mut server = Server::new_async().await;
        let _media = server
            .mock("GET", "/shot.png")
            .with_status(200)
            .with_body("png")
            .create_async()
            .await;
        let _generate = server
            .mock("POST", Matcher::Regex(":generateContent$".to_string()))
            .with_status(200)
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "A settings page with a red error banner."}]}}]}"#)
            .create_async()
            .await;

        let result = video::Analyzer::analyze_video(
            &provider(&server.url()),
            &format!("{}/shot.png", server.url()),
            "image/png",
        )
        .await
        .unwrap();

        assert_eq!(result.title, UNTITLED_RECORDING);
        assert_eq!(result.description, "");
        assert_eq!(result.transcript, "A settings page with a red error banner.");
    }

    #[tokio::test]
    async fn test_persistent_resource_exhausted_is_exceeded() {
        let mut server = Server::new_async().await;
        let _media = server
            .mock("GET", "/clip.webm")
            .with_status(200)
            .with_body("clip")
            .create_async()
            .await;
        let generate = server
            .mock("POST", Matcher::Regex(":generateContent$".to_string()))
            .with_status(429)
            .with_body(r#"{"error": {"status": "RESOURCE_EXHAUSTED", "message": "Please retry in 0.001s."}}"#)
            .expect(MAX_RETRIES as usize + 1)
            .create_async()
            .await;

        let err = video::Analyzer::analyze_video(
            &provider(&server.url()),
            &format!("{}/clip.webm", server.url()),
            "video/webm",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AiError::RateLimitExceeded));
        generate.assert_async().await;
    }
}
