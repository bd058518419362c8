//! Source URL inspection

use crate::error::FetchError;
use regex::Regex;

/// A media locator handed to yt-dlp, with whatever YouTube ids it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrl {
    raw: String,
    video_id: Option<String>,
    playlist_id: Option<String>,
}

impl SourceUrl {
    pub fn parse(input: &str) -> Result<Self, FetchError> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(FetchError::InvalidUrl(input.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            video_id: parse_video_id(raw),
            playlist_id: parse_playlist_id(raw),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn video_id(&self) -> Option<&str> {
        self.video_id.as_deref()
    }

    pub fn playlist_id(&self) -> Option<&str> {
        self.playlist_id.as_deref()
    }

    pub fn is_youtube(&self) -> bool {
        validate_youtube_url(&self.raw)
    }
}

impl std::fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_video_id(url: &str) -> Option<String> {
    // watch?v=<id>, shorts/<id> or youtu.be/<id>; ids are 11 chars
    let re = Regex::new(
        r"(?:youtube\.com/(?:watch\?(?:.*&)?v=|shorts/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .ok()?;
    let caps = re.captures(url)?;
    Some(caps.get(1)?.as_str().to_string())
}

fn parse_playlist_id(url: &str) -> Option<String> {
    let re = Regex::new(r"[?&]list=([A-Za-z0-9_-]+)").ok()?;
    let caps = re.captures(url)?;
    Some(caps.get(1)?.as_str().to_string())
}

/// Validate that a string looks like a YouTube URL
pub fn validate_youtube_url(url: &str) -> bool {
    url.contains("youtube.com/watch")
        || url.contains("youtu.be/")
        || url.contains("youtube.com/playlist")
        || url.contains("youtube.com/shorts")
        || url.contains("music.youtube.com")
}
