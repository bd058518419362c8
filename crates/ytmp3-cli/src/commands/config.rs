use anyhow::Result;
use std::path::Path;
use ytmp3_core::config::Config;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("ytmp3 configuration\n");
    print!("{}", toml::to_string_pretty(&config)?);

    if config.paths.yt_dlp.is_none() {
        println!("\n# paths.yt_dlp: auto-detect from PATH");
    }
    if config.paths.ffmpeg.is_none() {
        println!("# paths.ffmpeg: left to yt-dlp");
    }

    // Show config file locations
    println!("\nConfig sources (later entries override earlier ones):");
    if let Some(default_config) = Config::default_config_file() {
        println!("  1. {}", default_config.display());
    }
    if let Some(p) = config_path {
        println!("  2. {} (specified)", p.display());
    }
    println!("  3. Environment variables (YTMP3_*, nested with __, e.g. YTMP3_FETCH__DEFAULT_URL)");

    Ok(())
}
