//! ytmp3-core: fetch a video's audio as MP3 by delegating to yt-dlp

pub mod config;
pub mod error;
pub mod fetcher;
pub mod request;
pub mod url;

pub use config::Config;
pub use error::{ConfigError, FetchError, Result};
pub use fetcher::{AudioFetcher, Pipeline, YtDlp};
pub use request::{FetchOptions, PostProcessor};
