use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use cohort_types::{VideoLink, VideoProvider};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid video URL. Please enter a valid YouTube or Loom link.")]
pub struct InvalidVideoUrl;

/// YouTube URL shapes, tried in order. The id must not run on into more id characters.
static YOUTUBE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"youtube\.com/watch\?(?:[^#\s]*&)?v=([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
        r"youtu\.be/([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
        r"youtube\.com/embed/([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
        r"youtube\.com/shorts/([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
        r"youtube\.com/v/([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Failed to compile YouTube regex"))
    .collect()
});

static LOOM_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"loom\.com/share/([0-9a-f]{32})(?:[^0-9A-Za-z]|$)",
        r"loom\.com/embed/([0-9a-f]{32})(?:[^0-9A-Za-z]|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Failed to compile Loom regex"))
    .collect()
});

fn first_capture<'a>(patterns: &[Regex], url: &'a str) -> Option<&'a str> {
    patterns
        .iter()
        .find_map(|re| re.captures(url).and_then(|cap| cap.get(1)))
        .map(|m| m.as_str())
}

/// Recognize a YouTube or Loom link and derive its embed and thumbnail URLs.
///
/// Purely a pattern classifier; the video is never fetched.
///
/// ```
/// use cohort_server::video::parse_video_url;
/// let link = parse_video_url("https://youtu.be/dQw4w9WgXcQ").unwrap();
/// assert_eq!(link.video_id, "dQw4w9WgXcQ");
/// assert_eq!(link.embed_url, "https://www.youtube.com/embed/dQw4w9WgXcQ");
/// ```
pub fn parse_video_url(url: &str) -> Result<VideoLink, InvalidVideoUrl> {
    let url = url.trim();

    if let Some(id) = first_capture(&YOUTUBE_PATTERNS, url) {
        return Ok(VideoLink {
            provider: VideoProvider::YouTube,
            video_id: id.to_string(),
            embed_url: format!("https://www.youtube.com/embed/{}", id),
            thumbnail_url: format!("https://img.youtube.com/vi/{}/hqdefault.jpg", id),
        });
    }

    if let Some(id) = first_capture(&LOOM_PATTERNS, url) {
        return Ok(VideoLink {
            provider: VideoProvider::Loom,
            video_id: id.to_string(),
            embed_url: format!("https://www.loom.com/embed/{}", id),
            thumbnail_url: format!("https://cdn.loom.com/sessions/thumbnails/{}-with-play.gif", id),
        });
    }

    Err(InvalidVideoUrl)
}
