//! Recording analysis provider trait.

use crate::types::video::VideoAnalysisResult;
use crate::Error;
use async_trait::async_trait;

/// Abstraction for turning a screen recording or screenshot into a titled,
/// described and narrated result.
///
/// Backends differ in how the media reaches the model: a direct URL reference,
/// downloaded-and-inlined bytes, or a sequence of sampled still frames.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Analyze the media at `media_url`.
    ///
    /// Unparseable model output degrades to [`VideoAnalysisResult::untitled`]
    /// instead of failing; transport and rate-limit failures are still returned.
    async fn analyze_video(
        &self,
        media_url: &str,
        mime_type: &str,
    ) -> std::result::Result<VideoAnalysisResult, Error>;

    /// Return unique identifier for this provider.
    fn provider_id(&self) -> &'static str;
}
