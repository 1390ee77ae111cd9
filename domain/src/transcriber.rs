//! Speech-to-text for recordings.

use crate::gateway::openai_compat::OpenAiCompatClient;
use async_trait::async_trait;
use log::*;
use report_ai::traits::transcription;
use report_ai::Error as AiError;
use std::sync::Arc;

/// Best-effort transcript source. A missing transcript lowers analysis quality
/// but never blocks it, so every failure collapses to an empty string.
#[derive(Clone)]
pub struct Transcriber {
    provider: Arc<dyn transcription::Provider>,
}

impl Transcriber {
    pub fn new(provider: Arc<dyn transcription::Provider>) -> Self {
        Self { provider }
    }

    pub async fn transcribe(&self, video_url: &str) -> String {
        match self.provider.transcribe(video_url).await {
            Ok(text) => {
                debug!(
                    "{} transcript has {} characters",
                    self.provider.provider_id(),
                    text.len()
                );
                text
            }
            Err(e) => {
                warn!(
                    "Transcription via {} failed, continuing without transcript: {}",
                    self.provider.provider_id(),
                    e
                );
                String::new()
            }
        }
    }
}

/// Whisper-style transcription over an OpenAI-compatible `/audio/transcriptions`.
pub struct WhisperTranscription {
    gateway: OpenAiCompatClient,
    model: String,
    language: String,
}

impl WhisperTranscription {
    pub fn new(gateway: OpenAiCompatClient, model: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            gateway,
            model: model.into(),
            language: language.into(),
        }
    }
}

#[async_trait]
impl transcription::Provider for WhisperTranscription {
    async fn transcribe(&self, media_url: &str) -> Result<String, AiError> {
        self.gateway
            .transcribe(&self.model, &self.language, media_url)
            .await
    }

    fn provider_id(&self) -> &'static str {
        "whisper"
    }
}
