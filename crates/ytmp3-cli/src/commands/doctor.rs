use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;
use which::which;
use ytmp3_core::config::Config;

pub async fn run(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    println!("ytmp3 dependency check\n");

    let mut all_ok = true;

    // Check yt-dlp
    print!("yt-dlp:  ");
    match locate(config.paths.yt_dlp.as_ref(), "yt-dlp") {
        Some(path) => match Command::new(&path).arg("--version").output() {
            Ok(out) if out.status.success() => {
                let v = String::from_utf8_lossy(&out.stdout);
                println!("OK ({})", v.trim());
            }
            _ => {
                println!("FOUND at {} but failed to get version", path.display());
                all_ok = false;
            }
        },
        None => {
            println!("NOT FOUND");
            println!("         Install with: pip install yt-dlp");
            all_ok = false;
        }
    }

    // Check FFmpeg, which yt-dlp needs for MP3 extraction
    print!("ffmpeg:  ");
    match locate(config.paths.ffmpeg.as_ref(), "ffmpeg") {
        Some(path) => match Command::new(&path).arg("-version").output() {
            Ok(out) if out.status.success() => {
                let first_line = String::from_utf8_lossy(&out.stdout)
                    .lines()
                    .next()
                    .unwrap_or("")
                    .to_string();
                println!("OK ({})", ffmpeg_version(&first_line));
            }
            _ => {
                println!("FOUND at {} but failed to get version", path.display());
                all_ok = false;
            }
        },
        None => {
            println!("NOT FOUND");
            println!("         Install with: brew install ffmpeg (or your package manager)");
            all_ok = false;
        }
    }

    println!();
    if all_ok {
        println!("All dependencies OK!");
    } else {
        println!("Some dependencies are missing. See above for installation instructions.");
    }

    Ok(())
}

/// Configured path if set, otherwise the first match on PATH.
///
/// A configured ffmpeg location may be a directory; the binary inside it is used.
fn locate(configured: Option<&PathBuf>, name: &str) -> Option<PathBuf> {
    match configured {
        Some(path) if path.is_dir() => Some(path.join(name)),
        Some(path) => Some(path.clone()),
        None => which(name).ok(),
    }
}

/// "ffmpeg version 6.1.1 Copyright ..." -> "6.1.1"
fn ffmpeg_version(first_line: &str) -> &str {
    first_line.split_whitespace().nth(2).unwrap_or("unknown")
}
