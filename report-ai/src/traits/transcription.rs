//! Transcription provider trait.

use crate::Error;
use async_trait::async_trait;

/// Abstraction for speech-to-text services.
///
/// Implementations submit a media URL to a transcription endpoint and return the
/// recognised text. Callers that must not fail on a missing transcript wrap this
/// in a degrading transcriber.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Transcribe the spoken audio of the media at `media_url`.
    ///
    /// Media must be publicly reachable by the provider.
    async fn transcribe(&self, media_url: &str) -> std::result::Result<String, Error>;

    /// Return unique identifier for this provider (e.g., "whisper").
    fn provider_id(&self) -> &'static str;
}
