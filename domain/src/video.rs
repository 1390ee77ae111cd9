//! Recording analysis shared by every backend.

use crate::error::Error;
use log::*;
use report_ai::traits::video::Analyzer;
use report_ai::{decode, ParsePolicy, VideoAnalysisResult};

/// System prompt for every recording analysis, whatever the backend.
pub const SYSTEM_PROMPT: &str = r#"You are a QA assistant that turns screen recordings of software bugs into clear bug reports.

Respond with a single JSON object and nothing else:
{
  "title": "short summary of the problem, at most 80 characters",
  "description": "2-4 sentences: what the user was doing, what went wrong and what they expected instead",
  "transcript": "timestamped, chronological narration of on-screen actions, one line per step, e.g. \"00:03 - Clicks 'Save'\""
}

Rules:
- Describe the application under test only. Ignore the screen recorder's own interface: its toolbars, countdowns, stop/pause buttons and any overlay it draws.
- When a transcript of spoken audio is provided, merge what the user says into the timeline at the matching moments.
- Never invent details that are not visible or audible. If something is unclear, say so."#;

/// Whether `mime_type` names a still image rather than a video.
pub fn is_screenshot(mime_type: &str) -> bool {
    mime_type.trim().to_ascii_lowercase().starts_with("image/")
}

/// User prompt for one analysis call.
///
/// `frame_count` is set when the media arrives as a frame sequence instead of a
/// video, and `transcript` when speech-to-text produced any text.
pub fn instruction(mime_type: &str, frame_count: Option<usize>, transcript: Option<&str>) -> String {
    let mut prompt = if is_screenshot(mime_type) {
        "Analyze this screenshot of a bug. There is no timeline, so describe what is on screen in the transcript field.".to_string()
    } else {
        match frame_count {
            Some(count) => format!(
                "Analyze this bug recording. It is provided as {} still frames in chronological order.",
                count
            ),
            None => "Analyze this bug recording.".to_string(),
        }
    };

    if let Some(transcript) = transcript.map(str::trim).filter(|t| !t.is_empty()) {
        prompt.push_str("\n\nSpoken audio transcript:\n");
        prompt.push_str(transcript);
    }
    prompt
}

/// Decode a model answer, degrading to an untitled result that keeps the raw text.
pub fn decode_analysis(raw: &str) -> VideoAnalysisResult {
    match decode(raw, ParsePolicy::Degrade(VideoAnalysisResult::untitled)) {
        Ok(result) => result.normalized(),
        // Degrade never yields an error; keep the raw text regardless.
        Err(_) => VideoAnalysisResult::untitled(raw),
    }
}

/// Analyze a recording or screenshot with the active backend.
pub async fn analyze(
    analyzer: &dyn Analyzer,
    media_url: &str,
    mime_type: &str,
) -> Result<VideoAnalysisResult, Error> {
    if media_url.trim().is_empty() {
        return Err(Error::config("media URL is empty"));
    }

    info!(
        "Analyzing {} media with {}",
        mime_type,
        analyzer.provider_id()
    );
    Ok(analyzer.analyze_video(media_url, mime_type).await?)
}
