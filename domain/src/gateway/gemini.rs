//! Gemini `generateContent` client and inline media download.

use super::{check_status, transport_error};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::*;
use provider_auth::http::AuthenticatedClient;
use report_ai::types::chat::{ChatRequest, Content, Part, Role};
use report_ai::Error as AiError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const VENDOR: &str = "gemini";

/// Largest media payload Gemini accepts inline in a request.
pub const MAX_INLINE_BYTES: u64 = 20 * 1024 * 1024;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiContent>,
    pub contents: Vec<GeminiContent>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: Blob },
    FileData { file_data: FileRef },
}

#[derive(Debug, Serialize)]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct FileRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub file_uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl From<&Part> for GeminiPart {
    fn from(part: &Part) -> Self {
        match part {
            Part::Text(text) => GeminiPart::Text { text: text.clone() },
            Part::InlineData { mime_type, data } => GeminiPart::InlineData {
                inline_data: Blob {
                    mime_type: mime_type.clone(),
                    data: data.clone(),
                },
            },
            Part::ImageUrl(url) => GeminiPart::FileData {
                file_data: FileRef {
                    mime_type: None,
                    file_uri: url.clone(),
                },
            },
            Part::VideoUrl { url, mime_type } => GeminiPart::FileData {
                file_data: FileRef {
                    mime_type: Some(mime_type.clone()),
                    file_uri: url.clone(),
                },
            },
        }
    }
}

fn parts_of(content: &Content) -> Vec<GeminiPart> {
    match content {
        Content::Text(text) => vec![GeminiPart::Text { text: text.clone() }],
        Content::Parts(parts) => parts.iter().map(GeminiPart::from).collect(),
    }
}

impl From<&ChatRequest> for GenerateContentRequest {
    fn from(request: &ChatRequest) -> Self {
        let system_instruction = request.system_text().map(|text| GeminiContent {
            role: None,
            parts: vec![GeminiPart::Text { text }],
        });
        let contents = request
            .messages
            .iter()
            .filter_map(|message| {
                let role = match message.role {
                    Role::System => return None,
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                Some(GeminiContent {
                    role: Some(role),
                    parts: parts_of(&message.content),
                })
            })
            .collect();

        GenerateContentRequest {
            system_instruction,
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default, rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Clone)]
pub struct GeminiClient {
    api: AuthenticatedClient,
    media: AuthenticatedClient,
    base_url: String,
}

impl GeminiClient {
    /// `api` carries the Gemini key; `media` must not, since it fetches from
    /// third-party hosts.
    pub fn new(api: AuthenticatedClient, media: AuthenticatedClient, base_url: impl Into<String>) -> Self {
        Self {
            api,
            media,
            base_url: base_url.into(),
        }
    }

    /// Run `generateContent` and return the concatenated text of the first candidate.
    pub async fn generate_content(&self, model: &str, request: &ChatRequest) -> Result<String, AiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let body = GenerateContentRequest::from(request);

        debug!("Sending Gemini generateContent with model {}", model);

        let response = self
            .api
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(VENDOR, e))?;
        let response = check_status(VENDOR, response).await?;

        let generated: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| transport_error(VENDOR, e))?;

        let candidate = generated.candidates.into_iter().next().ok_or_else(|| {
            warn!("Gemini returned no candidates");
            AiError::Provider("gemini returned no candidates".to_string())
        })?;

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            warn!(
                "Gemini candidate had no text (finish reason: {:?})",
                candidate.finish_reason
            );
            return Err(AiError::Provider(format!(
                "gemini returned an empty candidate (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(text)
    }

    /// Download `media_url` and return its bytes base64-encoded.
    pub async fn fetch_inline(&self, media_url: &str) -> Result<String, AiError> {
        debug!("Downloading media for inline upload: {}", media_url);

        let response = self
            .media
            .get(media_url)
            .send()
            .await
            .map_err(|e| transport_error("media host", e))?;
        let mut response = check_status("media host", response).await?;

        if let Some(length) = response.content_length() {
            if length > MAX_INLINE_BYTES {
                return Err(too_large(length));
            }
        }

        // Hosts may omit Content-Length, so the limit is enforced while streaming.
        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| transport_error("media host", e))?
        {
            let received = (bytes.len() + chunk.len()) as u64;
            if received > MAX_INLINE_BYTES {
                return Err(too_large(received));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(BASE64.encode(&bytes))
    }

    /// List models as a credential check: `Ok(false)` when the key is rejected.
    pub async fn verify_credentials(&self) -> Result<bool, AiError> {
        let url = format!("{}/models", self.base_url);

        let response = self
            .api
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(VENDOR, e))?;

        match response.status() {
            // Gemini answers a bad key with 400 API_KEY_INVALID.
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!("Gemini rejected the configured API key");
                Ok(false)
            }
            _ => check_status(VENDOR, response).await.map(|_| true),
        }
    }
}

/// `length` is the declared size, or the bytes read when the limit was crossed.
fn too_large(length: u64) -> AiError {
    warn!(
        "Media reached {} bytes, over the {} byte inline limit",
        length, MAX_INLINE_BYTES
    );
    AiError::Provider(format!(
        "media is at least {} bytes; inline uploads are limited to {} bytes",
        length, MAX_INLINE_BYTES
    ))
}
