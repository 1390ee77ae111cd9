//! OpenRouter backend: the model fetches the media itself by URL.

use super::{api_key_for, InferenceSettings};
use crate::error::Error;
use crate::gateway::build_client;
use crate::gateway::openai_compat::OpenAiCompatClient;
use crate::video::{decode_analysis, instruction, is_screenshot, SYSTEM_PROMPT};
use async_trait::async_trait;
use log::*;
use provider_auth::api_key::{ApiKeyProvider, BearerTokenAuth};
use provider_auth::providers::openrouter_config;
use report_ai::traits::{chat, video};
use report_ai::types::chat::{ChatRequest, Message, Part};
use report_ai::{Error as AiError, RetryPolicy, VideoAnalysisResult};
use service::config::{Config, ProviderKind};

pub struct OpenRouterProvider {
    gateway: OpenAiCompatClient,
    model: String,
    settings: InferenceSettings,
}

impl OpenRouterProvider {
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let api_key = api_key_for(config, ProviderKind::OpenRouter)?;
        let vendor = openrouter_config().with_base_url(config.base_url(ProviderKind::OpenRouter));
        let settings = InferenceSettings::from_config(config, vendor.retry_base_delay);

        let client = build_client(
            Some(Box::new(BearerTokenAuth::new(ApiKeyProvider::OpenRouter, api_key))),
            settings.request_timeout,
        )?;

        debug!("OpenRouter provider using model {}", config.openrouter_model);
        Ok(Self {
            gateway: OpenAiCompatClient::new(client, vendor.base_url, "openrouter"),
            model: config.openrouter_model.clone(),
            settings,
        })
    }
}

#[async_trait]
impl chat::Provider for OpenRouterProvider {
    async fn complete(&self, request: ChatRequest) -> Result<String, AiError> {
        self.gateway.chat_completion(&self.model, &request).await
    }

    fn provider_id(&self) -> &'static str {
        "openrouter"
    }

    async fn verify_credentials(&self) -> Result<bool, AiError> {
        self.gateway.verify_credentials().await
    }

    fn default_retry_policy(&self) -> RetryPolicy {
        self.settings.retry.clone()
    }
}

#[async_trait]
impl video::Analyzer for OpenRouterProvider {
    async fn analyze_video(&self, media_url: &str, mime_type: &str) -> Result<VideoAnalysisResult, AiError> {
        let media = if is_screenshot(mime_type) {
            Part::ImageUrl(media_url.to_string())
        } else {
            Part::VideoUrl {
                url: media_url.to_string(),
                mime_type: mime_type.to_string(),
            }
        };
        let request = self.settings.request(
            SYSTEM_PROMPT,
            Message::user_parts(vec![Part::Text(instruction(mime_type, None, None)), media]),
        );

        let (gateway, model, request) = (&self.gateway, self.model.as_str(), &request);
        let raw = self
            .settings
            .retry
            .run_with_hint(
                move || gateway.chat_completion(model, request),
                |e| chat::Provider::retry_delay_hint(self, e),
            )
            .await?;
        Ok(decode_analysis(&raw))
    }

    fn provider_id(&self) -> &'static str {
        "openrouter"
    }
}
