//! Still-frame URL derivation.

/// Strategy for deriving a still image of a video at a given offset.
///
/// Media hosts expose different transform syntaxes, so the rewrite is pluggable.
pub trait Strategy: Send + Sync {
    /// URL of the frame at `offset_secs`, or `None` when the media is not
    /// recognised as transformable by this strategy.
    fn frame_url(&self, video_url: &str, offset_secs: u32) -> Option<String>;
}

/// Rewrites Cloudinary-style delivery URLs.
///
/// `https://host/<cloud>/video/upload/v1/clips/bug.webm` at 5 seconds becomes
/// `https://host/<cloud>/video/upload/so_5/v1/clips/bug.jpg`.
#[derive(Debug, Clone, Default)]
pub struct CloudinaryFrames;

impl CloudinaryFrames {
    const UPLOAD_SEGMENT: &'static str = "/video/upload/";
}

impl Strategy for CloudinaryFrames {
    fn frame_url(&self, video_url: &str, offset_secs: u32) -> Option<String> {
        let (base, query) = match video_url.split_once('?') {
            Some((base, query)) => (base, Some(query)),
            None => (video_url, None),
        };
        let split = base.find(Self::UPLOAD_SEGMENT)? + Self::UPLOAD_SEGMENT.len();
        let (prefix, asset) = base.split_at(split);

        let file_start = asset.rfind('/').map(|i| i + 1).unwrap_or(0);
        let stem = match asset[file_start..].rfind('.') {
            Some(dot) => &asset[..file_start + dot],
            None => asset,
        };
        if stem.is_empty() {
            return None;
        }

        let mut url = format!("{}so_{}/{}.jpg", prefix, offset_secs, stem);
        if let Some(query) = query {
            url.push('?');
            url.push_str(query);
        }
        Some(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrites_delivery_url() {
        let url = "https://res.cloudinary.com/demo/video/upload/v1712/reports/bug-42.webm";
        assert_eq!(
            CloudinaryFrames.frame_url(url, 10).as_deref(),
            Some("https://res.cloudinary.com/demo/video/upload/so_10/v1712/reports/bug-42.jpg")
        );
    }

    #[test]
    fn test_keeps_query_string() {
        let url = "https://res.cloudinary.com/demo/video/upload/clip.mp4?token=abc";
        assert_eq!(
            CloudinaryFrames.frame_url(url, 0).as_deref(),
            Some("https://res.cloudinary.com/demo/video/upload/so_0/clip.jpg?token=abc")
        );
    }

    #[test]
    fn test_unrecognised_hosts_are_not_transformable() {
        assert!(CloudinaryFrames
            .frame_url("https://cdn.example.com/recordings/bug.webm", 5)
            .is_none());
        assert!(CloudinaryFrames
            .frame_url("https://res.cloudinary.com/demo/video/upload/", 5)
            .is_none());
    }
}
