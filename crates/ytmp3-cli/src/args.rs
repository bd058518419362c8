use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ytmp3")]
#[command(author, version, about = "Download a YouTube video's audio as MP3")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Video URL (defaults to the configured URL)
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    /// Output path template; yt-dlp placeholders such as %(title)s are allowed
    #[arg(short, long, value_name = "TEMPLATE")]
    pub output: Option<String>,

    /// Print the yt-dlp options and arguments without downloading
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that yt-dlp and FFmpeg are installed
    Doctor,

    /// Show configuration
    Config,
}
