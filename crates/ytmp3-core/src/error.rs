//! Error types for ytmp3-core

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("yt-dlp not found. Install with: pip install yt-dlp")]
    YtDlpNotFound,

    /// Any failure inside yt-dlp: network, unavailable stream, transcoding.
    #[error("yt-dlp failed with exit code: {0:?}")]
    PipelineFailed(Option<i32>),

    #[error("Invalid URL: {0:?}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}
