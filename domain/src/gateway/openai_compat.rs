//! Client for OpenAI-compatible endpoints (Groq, OpenRouter).
//!
//! Covers chat completions, speech-to-text and the model listing used as a
//! credential check.

use super::{check_status, transport_error};
use log::*;
use provider_auth::http::AuthenticatedClient;
use report_ai::types::chat::{ChatRequest, Content, Message, Part, Role};
use report_ai::Error as AiError;
use reqwest::multipart::Form;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Chat completion request body.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<WireMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: WireContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum WireContent {
    Text(String),
    Parts(Vec<WirePart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WirePart {
    Text { text: String },
    ImageUrl { image_url: UrlRef },
    VideoUrl { video_url: UrlRef },
}

#[derive(Debug, Serialize)]
pub struct UrlRef {
    pub url: String,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        let content = match &message.content {
            Content::Text(text) => WireContent::Text(text.clone()),
            Content::Parts(parts) => WireContent::Parts(parts.iter().map(WirePart::from).collect()),
        };
        WireMessage {
            role: message.role,
            content,
        }
    }
}

impl From<&Part> for WirePart {
    fn from(part: &Part) -> Self {
        match part {
            Part::Text(text) => WirePart::Text { text: text.clone() },
            Part::ImageUrl(url) => WirePart::ImageUrl {
                image_url: UrlRef { url: url.clone() },
            },
            Part::VideoUrl { url, .. } => WirePart::VideoUrl {
                video_url: UrlRef { url: url.clone() },
            },
            // Inline bytes travel as a data URL.
            Part::InlineData { mime_type, data } => WirePart::ImageUrl {
                image_url: UrlRef {
                    url: format!("data:{};base64,{}", mime_type, data),
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// OpenAI-compatible API client bound to one vendor and base URL.
#[derive(Clone)]
pub struct OpenAiCompatClient {
    client: AuthenticatedClient,
    base_url: String,
    vendor: &'static str,
}

impl OpenAiCompatClient {
    pub fn new(client: AuthenticatedClient, base_url: impl Into<String>, vendor: &'static str) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            vendor,
        }
    }

    /// Send one chat completion and return the first choice's message text.
    pub async fn chat_completion(&self, model: &str, request: &ChatRequest) -> Result<String, AiError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model,
            messages: request.messages.iter().map(WireMessage::from).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!("Sending {} chat completion with model {}", self.vendor, model);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(self.vendor, e))?;
        let response = check_status(self.vendor, response).await?;

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| transport_error(self.vendor, e))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                warn!("{} returned a completion without content", self.vendor);
                AiError::Provider(format!("{} returned no completion choices", self.vendor))
            })
    }

    /// Transcribe the media at `media_url`, letting the vendor fetch it by URL.
    pub async fn transcribe(&self, model: &str, language: &str, media_url: &str) -> Result<String, AiError> {
        let url = format!("{}/audio/transcriptions", self.base_url);
        let form = Form::new()
            .text("model", model.to_string())
            .text("url", media_url.to_string())
            .text("response_format", "verbose_json")
            .text("language", language.to_string());

        debug!("Requesting {} transcription with model {}", self.vendor, model);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(self.vendor, e))?;
        let response = check_status(self.vendor, response).await?;

        let transcription: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| transport_error(self.vendor, e))?;
        Ok(transcription.text)
    }

    /// List models as a credential check: `Ok(false)` when the key is rejected.
    pub async fn verify_credentials(&self) -> Result<bool, AiError> {
        let url = format!("{}/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(self.vendor, e))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!("{} rejected the configured API key", self.vendor);
                Ok(false)
            }
            _ => check_status(self.vendor, response).await.map(|_| true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::build_client;
    use mockito::{Matcher, Server};
    use provider_auth::api_key::{ApiKeyProvider, BearerTokenAuth};
    use secrecy::SecretString;
    use serde_json::json;
    use std::time::Duration;

    fn client(server_url: &str) -> OpenAiCompatClient {
        let auth = BearerTokenAuth::new(ApiKeyProvider::Groq, SecretString::from("gsk_test".to_string()));
        OpenAiCompatClient::new(
            build_client(Some(Box::new(auth)), Duration::from_secs(5)).unwrap(),
            server_url,
            "groq",
        )
    }

    #[tokio::test]
    async fn test_chat_completion_request_shape() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer gsk_test")
            .match_body(Matcher::PartialJson(json!({
                "model": "llama-3.3-70b-versatile",
                "messages": [
                    { "role": "system", "content": "be terse" },
                    { "role": "user", "content": [
                        { "type": "text", "text": "describe" },
                        { "type": "image_url", "image_url": { "url": "https://cdn.example.com/a.jpg" } }
                    ]}
                ],
                "max_tokens": 2048
            })))
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "{\"ok\": true}"}}]}"#)
            .create_async()
            .await;

        let request = ChatRequest::new(
            "be terse",
            Message::user_parts(vec![
                Part::Text("describe".to_string()),
                Part::ImageUrl("https://cdn.example.com/a.jpg".to_string()),
            ]),
        );
        let text = client(&server.url())
            .chat_completion("llama-3.3-70b-versatile", &request)
            .await
            .unwrap();

        assert_eq!(text, r#"{"ok": true}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_choices_is_provider_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let request = ChatRequest::new("sys", Message::user("hi"));
        let err = client(&server.url())
            .chat_completion("m", &request)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Provider(_)));
    }

    #[tokio::test]
    async fn test_transcription_reads_text() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/audio/transcriptions")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("verbose_json".to_string()),
                Matcher::Regex("https://cdn.example.com/bug.webm".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"text": "the button does nothing", "segments": []}"#)
            .create_async()
            .await;

        let text = client(&server.url())
            .transcribe("whisper-large-v3-turbo", "en", "https://cdn.example.com/bug.webm")
            .await
            .unwrap();

        assert_eq!(text, "the button does nothing");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/models")
            .with_status(401)
            .create_async()
            .await;

        assert!(!client(&server.url()).verify_credentials().await.unwrap());
    }

    #[test]
    fn test_inline_data_becomes_data_url() {
        let part = WirePart::from(&Part::InlineData {
            mime_type: "image/png".to_string(),
            data: "aGVsbG8=".to_string(),
        });
        assert_eq!(
            serde_json::to_value(part).unwrap(),
            json!({ "type": "image_url", "image_url": { "url": "data:image/png;base64,aGVsbG8=" } })
        );
    }
}
