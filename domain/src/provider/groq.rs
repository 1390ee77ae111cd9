//! Groq backend: recordings become a sampled frame sequence plus a transcript.

use super::{api_key_for, InferenceSettings};
use crate::error::Error;
use crate::frame_sampler::FrameSampler;
use crate::gateway::build_client;
use crate::gateway::openai_compat::OpenAiCompatClient;
use crate::transcriber::{Transcriber, WhisperTranscription};
use crate::video::{decode_analysis, instruction, is_screenshot, SYSTEM_PROMPT};
use async_trait::async_trait;
use log::*;
use provider_auth::api_key::{ApiKeyProvider, BearerTokenAuth};
use provider_auth::providers::groq_config;
use report_ai::traits::frames::Strategy;
use report_ai::traits::{chat, video};
use report_ai::types::chat::{ChatRequest, Message, Part};
use report_ai::{Error as AiError, RetryPolicy, VideoAnalysisResult};
use service::config::{Config, ProviderKind};
use std::sync::Arc;

pub struct GroqProvider {
    gateway: OpenAiCompatClient,
    vision_model: String,
    text_model: String,
    sampler: FrameSampler,
    transcriber: Transcriber,
    settings: InferenceSettings,
}

impl GroqProvider {
    pub fn from_config(config: &Config, frames: Arc<dyn Strategy>) -> Result<Self, Error> {
        let api_key = api_key_for(config, ProviderKind::Groq)?;
        let vendor = groq_config().with_base_url(config.base_url(ProviderKind::Groq));
        let settings = InferenceSettings::from_config(config, vendor.retry_base_delay);

        let client = build_client(
            Some(Box::new(BearerTokenAuth::new(ApiKeyProvider::Groq, api_key))),
            settings.request_timeout,
        )?;
        let gateway = OpenAiCompatClient::new(client, vendor.base_url, "groq");
        let transcriber = Transcriber::new(Arc::new(WhisperTranscription::new(
            gateway.clone(),
            config.groq_transcription_model.clone(),
            config.transcription_language.clone(),
        )));

        debug!(
            "Groq provider using vision model {} and text model {}",
            config.groq_vision_model, config.groq_text_model
        );
        Ok(Self {
            gateway,
            vision_model: config.groq_vision_model.clone(),
            text_model: config.groq_text_model.clone(),
            sampler: FrameSampler::from_config(config, frames)?,
            transcriber,
            settings,
        })
    }

    /// Prompt parts for `media_url`. Screenshots go out as one image; recordings
    /// are sampled and transcribed concurrently.
    async fn media_parts(&self, media_url: &str, mime_type: &str) -> Vec<Part> {
        if is_screenshot(mime_type) {
            return vec![
                Part::Text(instruction(mime_type, None, None)),
                Part::ImageUrl(media_url.to_string()),
            ];
        }

        let (frames, transcript) = tokio::join!(
            self.sampler.sample(media_url),
            self.transcriber.transcribe(media_url)
        );
        debug!(
            "Sending {} frames and a {} character transcript to Groq",
            frames.len(),
            transcript.len()
        );

        let mut parts = vec![Part::Text(instruction(
            mime_type,
            Some(frames.len()),
            Some(&transcript),
        ))];
        parts.extend(frames.into_iter().map(Part::ImageUrl));
        parts
    }
}

#[async_trait]
impl chat::Provider for GroqProvider {
    async fn complete(&self, request: ChatRequest) -> Result<String, AiError> {
        self.gateway.chat_completion(&self.text_model, &request).await
    }

    fn provider_id(&self) -> &'static str {
        "groq"
    }

    async fn verify_credentials(&self) -> Result<bool, AiError> {
        self.gateway.verify_credentials().await
    }

    fn default_retry_policy(&self) -> RetryPolicy {
        self.settings.retry.clone()
    }
}

#[async_trait]
impl video::Analyzer for GroqProvider {
    async fn analyze_video(&self, media_url: &str, mime_type: &str) -> Result<VideoAnalysisResult, AiError> {
        let parts = self.media_parts(media_url, mime_type).await;
        let request = self
            .settings
            .request(SYSTEM_PROMPT, Message::user_parts(parts));

        let (gateway, model, request) = (&self.gateway, self.vision_model.as_str(), &request);
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
        "groq"
    }
}
