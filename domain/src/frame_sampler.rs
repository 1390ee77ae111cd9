//! Still-frame sampling for vision models that cannot take a video directly.

use crate::error::Error;
use crate::gateway::build_client;
use futures::future::join_all;
use log::*;
use provider_auth::http::AuthenticatedClient;
use report_ai::traits::frames::Strategy;
use service::config::Config;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_OFFSETS: [u32; 5] = [0, 5, 10, 20, 30];
pub const DEFAULT_MAX_FRAMES: usize = 5;
/// Upper bound on concurrent probes for one video.
pub const MAX_OFFSETS: usize = DEFAULT_OFFSETS.len();
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Derives frame URLs at fixed offsets and keeps the ones that exist.
///
/// [`FrameSampler::sample`] never returns an empty list. Without a transformable
/// URL it returns the video URL itself; when every probe fails it returns the
/// offset-0 frame.
pub struct FrameSampler {
    client: AuthenticatedClient,
    strategy: Arc<dyn Strategy>,
    offsets: Vec<u32>,
    max_frames: usize,
    probe_timeout: Duration,
}

impl FrameSampler {
    pub fn new(strategy: Arc<dyn Strategy>) -> Result<Self, Error> {
        Ok(Self {
            client: build_client(None, DEFAULT_PROBE_TIMEOUT)?,
            strategy,
            offsets: DEFAULT_OFFSETS.to_vec(),
            max_frames: DEFAULT_MAX_FRAMES,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        })
    }

    pub fn from_config(config: &Config, strategy: Arc<dyn Strategy>) -> Result<Self, Error> {
        Ok(Self::new(strategy)?
            .with_offsets(config.frame_offsets.clone())
            .with_max_frames(config.max_frames)
            .with_probe_timeout(Duration::from_secs(config.probe_timeout_secs)))
    }

    /// Offsets to probe, at most [`MAX_OFFSETS`] of them. An empty list keeps the defaults.
    pub fn with_offsets(mut self, mut offsets: Vec<u32>) -> Self {
        if offsets.is_empty() {
            return self;
        }
        if offsets.len() > MAX_OFFSETS {
            warn!(
                "{} frame offsets configured, probing only the first {}",
                offsets.len(),
                MAX_OFFSETS
            );
            offsets.truncate(MAX_OFFSETS);
        }
        self.offsets = offsets;
        self
    }

    /// Clamped to 1..=[`DEFAULT_MAX_FRAMES`].
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames.clamp(1, DEFAULT_MAX_FRAMES);
        self
    }

    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    /// Return between one and `max_frames` image URLs for `video_url`, in offset order.
    pub async fn sample(&self, video_url: &str) -> Vec<String> {
        let candidates: Vec<String> = self
            .offsets
            .iter()
            .filter_map(|offset| self.strategy.frame_url(video_url, *offset))
            .collect();

        if candidates.is_empty() {
            debug!("Video URL is not frame-transformable, sending it as-is");
            return vec![video_url.to_string()];
        }

        // join_all yields results in input order, whatever order the probes finish in.
        let reachable = join_all(candidates.iter().map(|url| self.probe(url))).await;

        let frames: Vec<String> = candidates
            .iter()
            .zip(reachable)
            .filter(|(_, ok)| *ok)
            .map(|(url, _)| url.clone())
            .take(self.max_frames)
            .collect();

        if frames.is_empty() {
            warn!(
                "None of {} frame candidates were reachable, falling back to the first frame",
                candidates.len()
            );
            let first = self
                .strategy
                .frame_url(video_url, 0)
                .or_else(|| candidates.into_iter().next())
                .unwrap_or_else(|| video_url.to_string());
            return vec![first];
        }

        debug!("Sampled {} of {} frames", frames.len(), candidates.len());
        frames
    }

    async fn probe(&self, url: &str) -> bool {
        match self.client.head(url).timeout(self.probe_timeout).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!("Frame probe {} returned {}", url, response.status());
                false
            }
            Err(e) => {
                debug!("Frame probe {} failed: {:?}", url, e);
                false
            }
        }
    }
}
