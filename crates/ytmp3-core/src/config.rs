//! Configuration management for ytmp3

use crate::error::ConfigError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// URL fetched when the CLI is run without arguments.
pub const DEFAULT_URL: &str =
    "https://www.youtube.com/watch?v=0yUIL3-xjkM&list=RDGMEMCMFH2exzjBeE_zAHHJOdxgVM0yUIL3-xjkM&index=1";

/// Output template used when the CLI is run without arguments.
pub const DEFAULT_OUTPUT: &str = "output/audio";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Path to yt-dlp binary (auto-detected if not set)
    pub yt_dlp: Option<PathBuf>,
    /// Path to FFmpeg binary, forwarded to yt-dlp (yt-dlp searches PATH if not set)
    pub ffmpeg: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// URL fetched when none is given on the command line
    pub default_url: String,
    /// Output path template used when none is given on the command line
    pub default_output: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            fetch: FetchConfig {
                default_url: DEFAULT_URL.to_string(),
                default_output: DEFAULT_OUTPUT.to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(default_config) = Self::default_config_file() {
            if default_config.exists() {
                figment = figment.merge(Toml::file(&default_config));
            }
        }

        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ConfigError::LoadError(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        // Field names contain underscores, so nesting uses a double underscore
        figment = figment.merge(Env::prefixed("YTMP3_").split("__"));

        figment.extract().map_err(|e| ConfigError::LoadError(e.to_string()))
    }

    /// `$CONFIG_DIR/ytmp3/config.toml`, if the platform has a config dir
    pub fn default_config_file() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ytmp3/config.toml"))
    }

    /// Get yt-dlp path, auto-detecting if not configured
    pub fn yt_dlp_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.paths.yt_dlp {
            Ok(path.clone())
        } else {
            which::which("yt-dlp")
                .map_err(|_| ConfigError::InvalidValue("yt-dlp not found in PATH".to_string()))
        }
    }
}
