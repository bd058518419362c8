//! Option mapping handed to yt-dlp

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Stream selector: best audio-only stream, else best combined stream.
pub const BEST_AUDIO: &str = "bestaudio/best";

/// yt-dlp post-processor that extracts and transcodes audio with FFmpeg.
pub const EXTRACT_AUDIO: &str = "FFmpegExtractAudio";

pub const MP3_CODEC: &str = "mp3";

/// Target bitrate in kbps.
pub const MP3_QUALITY: &str = "192";

/// Template used when the caller gives none: title-named file in the current directory.
pub const CURRENT_DIR_TEMPLATE: &str = "%(title)s.%(ext)s";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostProcessor {
    pub key: String,
    #[serde(rename = "preferredcodec")]
    pub preferred_codec: String,
    #[serde(rename = "preferredquality")]
    pub preferred_quality: String,
}

impl PostProcessor {
    pub fn extract_audio(codec: &str, quality: &str) -> Self {
        Self {
            key: EXTRACT_AUDIO.to_string(),
            preferred_codec: codec.to_string(),
            preferred_quality: quality.to_string(),
        }
    }

    fn push_args(&self, args: &mut Vec<String>) {
        if self.key != EXTRACT_AUDIO {
            return;
        }
        args.push("-x".to_string());
        args.push("--audio-format".to_string());
        args.push(self.preferred_codec.clone());
        args.push("--audio-quality".to_string());
        args.push(audio_quality_arg(&self.preferred_quality));
    }
}

/// yt-dlp reads 0-10 as a VBR level and anything above as a bitrate.
fn audio_quality_arg(quality: &str) -> String {
    match quality.parse::<u32>() {
        Ok(q) if q > 10 => format!("{}K", q),
        _ => quality.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOptions {
    pub format: String,
    #[serde(rename = "outtmpl")]
    pub output_template: String,
    pub postprocessors: Vec<PostProcessor>,
    pub quiet: bool,
    #[serde(rename = "noplaylist")]
    pub no_playlist: bool,
}

impl FetchOptions {
    /// Best audio, transcoded to 192 kbps MP3, single item only.
    pub fn audio_mp3(output_template: impl Into<String>) -> Self {
        Self {
            format: BEST_AUDIO.to_string(),
            output_template: output_template.into(),
            postprocessors: vec![PostProcessor::extract_audio(MP3_CODEC, MP3_QUALITY)],
            quiet: false,
            no_playlist: true,
        }
    }

    /// Command-line arguments for yt-dlp, without the URLs.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            self.format.clone(),
            "-o".to_string(),
            self.output_template.clone(),
        ];

        for pp in &self.postprocessors {
            pp.push_args(&mut args);
        }

        if self.no_playlist {
            args.push("--no-playlist".to_string());
        }
        if self.quiet {
            args.push("--quiet".to_string());
        }

        args
    }

    /// True if the template contains yt-dlp placeholder tokens like `%(title)s`.
    pub fn has_placeholders(&self) -> bool {
        self.output_template.contains("%(")
    }

    /// Where the transcoded file lands, when the template is a plain path.
    ///
    /// yt-dlp appends the codec extension to a literal template; dots already
    /// in the name are kept.
    pub fn resolved_output_path(&self) -> Option<PathBuf> {
        if self.has_placeholders() {
            return None;
        }
        let codec = self
            .postprocessors
            .iter()
            .find(|pp| pp.key == EXTRACT_AUDIO)
            .map(|pp| pp.preferred_codec.as_str())?;
        Some(PathBuf::from(format!("{}.{}", self.output_template, codec)))
    }
}
