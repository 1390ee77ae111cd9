//! Types for recording analysis.

use serde::{Deserialize, Serialize};

/// Title used when the model did not produce a usable one.
pub const UNTITLED_RECORDING: &str = "Untitled Recording";

/// Maximum title length, in characters.
pub const MAX_TITLE_CHARS: usize = 80;

/// Title, description and narrated transcript generated for a recording.
///
/// Every field is always populated: missing values in the model output fall back
/// to defaults, and unparseable output degrades to [`VideoAnalysisResult::untitled`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoAnalysisResult {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub transcript: String,
}

fn default_title() -> String {
    UNTITLED_RECORDING.to_string()
}

impl VideoAnalysisResult {
    /// Best-effort result when the model answered with unstructured text.
    /// The raw text is kept verbatim as the transcript.
    pub fn untitled(raw: &str) -> Self {
        Self {
            title: default_title(),
            description: String::new(),
            transcript: raw.to_string(),
        }
    }

    /// Enforce the title rules on a decoded result.
    pub fn normalized(mut self) -> Self {
        let trimmed = self.title.trim();
        self.title = if trimmed.is_empty() {
            default_title()
        } else {
            trimmed.chars().take(MAX_TITLE_CHARS).collect()
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let result: VideoAnalysisResult =
            serde_json::from_str(r#"{"description": "User opens settings."}"#).unwrap();
        assert_eq!(result.title, UNTITLED_RECORDING);
        assert_eq!(result.description, "User opens settings.");
        assert_eq!(result.transcript, "");
    }

    #[test]
    fn test_normalized_truncates_long_titles() {
        let result = VideoAnalysisResult {
            title: "a".repeat(120),
            description: String::new(),
            transcript: String::new(),
        }
        .normalized();
        assert_eq!(result.title.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn test_normalized_replaces_blank_title() {
        let result = VideoAnalysisResult {
            title: "   ".to_string(),
            description: String::new(),
            transcript: String::new(),
        }
        .normalized();
        assert_eq!(result.title, UNTITLED_RECORDING);
    }
}
