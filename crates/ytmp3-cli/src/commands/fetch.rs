use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

use ytmp3_core::{config::Config, AudioFetcher, FetchOptions, YtDlp};

pub async fn run(
    url: Option<&str>,
    output: Option<&str>,
    dry_run: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = Config::load(config_path)?;

    let url = url.unwrap_or(&config.fetch.default_url);
    let output = output.unwrap_or(&config.fetch.default_output);
    let options = FetchOptions::audio_mp3(output);

    if dry_run {
        // A dry run still works when yt-dlp is not installed
        let pipeline = YtDlp::from_config(&config).unwrap_or_else(|_| {
            YtDlp::new(PathBuf::from("yt-dlp")).with_ffmpeg(config.paths.ffmpeg.clone())
        });
        print!("{}", dry_run_report(&pipeline, &options, url)?);
        return Ok(());
    }

    let pipeline = YtDlp::from_config(&config)?;
    debug!("Using yt-dlp at: {}", pipeline.path().display());

    println!("Downloading audio from: {}", url);
    println!("Output path: {}", output);

    AudioFetcher::new(pipeline).fetch(url, Some(output)).await?;

    match options.resolved_output_path() {
        Some(path) => println!("\nDownload complete: {}", path.display()),
        None => println!("\nDownload complete"),
    }

    Ok(())
}

/// Option mapping as JSON, then the exact command line a real run executes.
fn dry_run_report(pipeline: &YtDlp, options: &FetchOptions, url: &str) -> Result<String> {
    let mut line = pipeline.path().display().to_string();
    for arg in pipeline.command_args(options, &[url.to_string()]) {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }

    Ok(format!(
        "{}\n\n{}\n",
        serde_json::to_string_pretty(options)?,
        line
    ))
}
