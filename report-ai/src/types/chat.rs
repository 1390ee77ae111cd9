//! Vendor-neutral chat request types.
//!
//! Providers translate these into their own wire format, so a prompt can be
//! built once and sent to any backend.

use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One element of a multimodal message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    /// Still image referenced by URL.
    ImageUrl(String),
    /// Video referenced by URL, for backends that fetch media themselves.
    VideoUrl { url: String, mime_type: String },
    /// Media bytes already downloaded and base64 encoded.
    InlineData { mime_type: String, data: String },
}

/// Body of a chat message: plain text or an ordered mix of parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Parts(Vec<Part>),
}

impl Content {
    /// Concatenated text of every text part.
    pub fn text(&self) -> String {
        match self {
            Content::Text(text) => text.clone(),
            Content::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    Part::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: Content,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Content::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Content::Text(text.into()),
        }
    }

    pub fn user_parts(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            content: Content::Parts(parts),
        }
    }
}

/// A single inference call. The model identifier is owned by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ChatRequest {
    pub const DEFAULT_MAX_TOKENS: u32 = 2048;
    pub const DEFAULT_TEMPERATURE: f32 = 0.2;

    /// System prompt plus one user message, the shape every insight call uses.
    pub fn new(system: impl Into<String>, user: Message) -> Self {
        Self {
            messages: vec![Message::system(system), user],
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            temperature: Self::DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Text of the system messages, for backends that take it out-of-band.
    pub fn system_text(&self) -> Option<String> {
        let text = self
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.text())
            .collect::<Vec<_>>()
            .join("\n\n");
        (!text.is_empty()).then_some(text)
    }
}
