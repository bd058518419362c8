//! Audio fetcher: builds the option mapping and hands it to yt-dlp

use crate::config::Config;
use crate::error::FetchError;
use crate::request::{FetchOptions, CURRENT_DIR_TEMPLATE};
use crate::url::SourceUrl;

use async_trait::async_trait;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// External retrieval + transcode pipeline.
///
/// Owns network access, format negotiation and the encoder run. Implementations
/// make a single attempt; failures are returned as-is.
#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn download(&self, options: &FetchOptions, urls: &[String]) -> Result<(), FetchError>;
}

/// Pipeline backed by the yt-dlp binary
#[derive(Debug, Clone)]
pub struct YtDlp {
    yt_dlp_path: PathBuf,
    ffmpeg_path: Option<PathBuf>,
}

impl YtDlp {
    pub fn new(yt_dlp_path: PathBuf) -> Self {
        Self {
            yt_dlp_path,
            ffmpeg_path: None,
        }
    }

    /// Point yt-dlp at a specific FFmpeg binary or directory
    pub fn with_ffmpeg(mut self, ffmpeg_path: Option<PathBuf>) -> Self {
        self.ffmpeg_path = ffmpeg_path;
        self
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let yt_dlp_path = config
            .yt_dlp_path()
            .map_err(|_| FetchError::YtDlpNotFound)?;
        Ok(Self::new(yt_dlp_path).with_ffmpeg(config.paths.ffmpeg.clone()))
    }

    pub fn path(&self) -> &Path {
        &self.yt_dlp_path
    }

    /// Full argument list passed to yt-dlp for `options` and `urls`.
    pub fn command_args(&self, options: &FetchOptions, urls: &[String]) -> Vec<OsString> {
        let mut args: Vec<OsString> = options.to_args().into_iter().map(OsString::from).collect();

        if let Some(ref ffmpeg) = self.ffmpeg_path {
            args.push("--ffmpeg-location".into());
            args.push(ffmpeg.clone().into_os_string());
        }

        // URLs after "--" so one starting with '-' is never read as a flag
        args.push("--".into());
        args.extend(urls.iter().map(OsString::from));
        args
    }
}

#[async_trait]
impl Pipeline for YtDlp {
    async fn download(&self, options: &FetchOptions, urls: &[String]) -> Result<(), FetchError> {
        let mut cmd = Command::new(&self.yt_dlp_path);
        cmd.args(self.command_args(options, urls));

        debug!("Running: {:?}", cmd);

        // stdio is inherited: yt-dlp's own progress output goes straight to the console
        let status = match cmd.status().await {
            Ok(status) => status,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(FetchError::YtDlpNotFound),
            Err(e) => return Err(e.into()),
        };

        if !status.success() {
            return Err(FetchError::PipelineFailed(status.code()));
        }

        Ok(())
    }
}

/// Downloads one item's audio as MP3 per call
#[derive(Debug)]
pub struct AudioFetcher<P> {
    pipeline: P,
}

impl<P: Pipeline> AudioFetcher<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Download the audio of `url` as MP3.
    ///
    /// `output_template` defaults to a title-named file in the current
    /// directory. Only the referenced item is fetched, even when the URL also
    /// names a playlist. No retry is made; pipeline errors propagate unchanged.
    pub async fn fetch(&self, url: &str, output_template: Option<&str>) -> Result<(), FetchError> {
        let source = SourceUrl::parse(url)?;

        if !source.is_youtube() {
            warn!("Not a YouTube URL, passing to yt-dlp anyway: {}", source);
        }
        if let Some(id) = source.video_id() {
            debug!("Video id: {}", id);
        }
        if let Some(list) = source.playlist_id() {
            info!("URL references playlist {}; fetching the linked item only", list);
        }

        let options = FetchOptions::audio_mp3(output_template.unwrap_or(CURRENT_DIR_TEMPLATE));

        // Ensure output directory exists
        if let Some(parent) = plain_parent_dir(&options) {
            tokio::fs::create_dir_all(parent).await?;
        }

        debug!("Downloading audio from: {}", source);
        debug!("Output template: {}", options.output_template);

        self.pipeline
            .download(&options, &[source.as_str().to_string()])
            .await?;

        match options.resolved_output_path() {
            Some(path) => debug!("Download complete: {}", path.display()),
            None => debug!("Download complete"),
        }

        Ok(())
    }
}

fn plain_parent_dir(options: &FetchOptions) -> Option<&Path> {
    if options.has_placeholders() {
        return None;
    }
    Path::new(&options.output_template)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every call; optionally writes the resolved output file or fails.
    #[derive(Default)]
    struct MockPipeline {
        calls: Mutex<Vec<(FetchOptions, Vec<String>)>>,
        write_output: bool,
        fail_with: Option<i32>,
    }

    #[async_trait]
    impl Pipeline for MockPipeline {
        async fn download(&self, options: &FetchOptions, urls: &[String]) -> Result<(), FetchError> {
            self.calls
                .lock()
                .unwrap()
                .push((options.clone(), urls.to_vec()));

            if let Some(code) = self.fail_with {
                return Err(FetchError::PipelineFailed(Some(code)));
            }
            if self.write_output {
                if let Some(path) = options.resolved_output_path() {
                    std::fs::write(path, b"ID3\x04\x00")?;
                }
            }
            Ok(())
        }
    }

    const PLAYLIST_URL: &str =
        "https://www.youtube.com/watch?v=0yUIL3-xjkM&list=RDGMEMCMFH2exzjBeE_zAHHJOdxgVM0yUIL3-xjkM&index=1";

    #[tokio::test]
    async fn test_fetch_writes_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("output/audio");
        let fetcher = AudioFetcher::new(MockPipeline {
            write_output: true,
            ..Default::default()
        });

        fetcher
            .fetch("https://youtu.be/dQw4w9WgXcQ", template.to_str())
            .await
            .unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("output"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(entries, vec![dir.path().join("output/audio.mp3")]);
        assert!(std::fs::read(&entries[0]).unwrap().starts_with(b"ID3"));
    }

    #[tokio::test]
    async fn test_playlist_url_fetches_single_item() {
        let fetcher = AudioFetcher::new(MockPipeline::default());
        fetcher.fetch(PLAYLIST_URL, Some("%(id)s.%(ext)s")).await.unwrap();

        let calls = fetcher.pipeline().calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (options, urls) = &calls[0];
        assert_eq!(urls, &vec![PLAYLIST_URL.to_string()]);
        assert!(options.no_playlist);
        assert!(options.to_args().contains(&"--no-playlist".to_string()));
    }

    #[tokio::test]
    async fn test_options_fixed_regardless_of_url() {
        let fetcher = AudioFetcher::new(MockPipeline::default());
        for url in [
            PLAYLIST_URL,
            "https://youtube.com/shorts/dQw4w9WgXcQ",
            "https://soundcloud.com/artist/track",
        ] {
            fetcher.fetch(url, None).await.unwrap();
        }

        let calls = fetcher.pipeline().calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        for (options, urls) in calls.iter() {
            assert_eq!(urls.len(), 1);
            assert_eq!(options, &FetchOptions::audio_mp3(CURRENT_DIR_TEMPLATE));
        }
    }

    #[tokio::test]
    async fn test_empty_url_never_reaches_pipeline() {
        let fetcher = AudioFetcher::new(MockPipeline::default());
        let err = fetcher.fetch("  ", None).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
        assert!(fetcher.pipeline().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("audio");
        let fetcher = AudioFetcher::new(MockPipeline {
            write_output: true,
            fail_with: Some(1),
            ..Default::default()
        });

        let err = fetcher
            .fetch("https://www.youtube.com/watch?v=xxxxxxxxxxx", template.to_str())
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::PipelineFailed(Some(1))));
        assert_eq!(fetcher.pipeline().calls.lock().unwrap().len(), 1);
        assert!(!dir.path().join("audio.mp3").exists());
    }

    #[tokio::test]
    async fn test_repeat_fetch_delegates_overwrite_policy() {
        let fetcher = AudioFetcher::new(MockPipeline::default());
        fetcher.fetch(PLAYLIST_URL, Some("%(title)s")).await.unwrap();
        fetcher.fetch(PLAYLIST_URL, Some("%(title)s")).await.unwrap();

        let calls = fetcher.pipeline().calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
        let args = calls[0].0.to_args();
        assert!(!args.iter().any(|a| a.contains("overwrites")));
    }

    #[test]
    fn test_plain_parent_dir() {
        let opts = FetchOptions::audio_mp3("output/audio");
        assert_eq!(plain_parent_dir(&opts), Some(Path::new("output")));
        assert_eq!(plain_parent_dir(&FetchOptions::audio_mp3("audio")), None);
        assert_eq!(
            plain_parent_dir(&FetchOptions::audio_mp3("%(uploader)s/%(title)s")),
            None
        );
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let pipeline = YtDlp::new(PathBuf::from("/nonexistent/bin/yt-dlp"));
        let err = pipeline
            .download(&FetchOptions::audio_mp3("a"), &["https://youtu.be/dQw4w9WgXcQ".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::YtDlpNotFound));
    }

    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_status_lines_stay_below_info() {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let fetcher = AudioFetcher::new(MockPipeline::default());
        fetcher.fetch(PLAYLIST_URL, Some("%(title)s")).await.unwrap();

        let logged = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("fetching the linked item only"));
        assert!(!logged.contains("Downloading audio from"));
        assert!(!logged.contains("Download complete"));
    }

    #[test]
    fn test_command_args_with_ffmpeg() {
        let pipeline = YtDlp::new(PathBuf::from("yt-dlp"))
            .with_ffmpeg(Some(PathBuf::from("/opt/ffmpeg")));
        let args = pipeline.command_args(
            &FetchOptions::audio_mp3("output/audio"),
            &[PLAYLIST_URL.to_string()],
        );
        let expected: Vec<OsString> = [
            "-f", "bestaudio/best",
            "-o", "output/audio",
            "-x", "--audio-format", "mp3", "--audio-quality", "192K",
            "--no-playlist",
            "--ffmpeg-location", "/opt/ffmpeg",
            "--", PLAYLIST_URL,
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        assert_eq!(args, expected);
    }

    #[test]
    fn test_command_args_without_ffmpeg() {
        let pipeline = YtDlp::new(PathBuf::from("yt-dlp"));
        let args = pipeline.command_args(&FetchOptions::audio_mp3("a"), &["u".to_string()]);
        assert!(!args.contains(&OsString::from("--ffmpeg-location")));
        assert_eq!(&args[args.len() - 2..], &[OsString::from("--"), OsString::from("u")]);
    }

    #[cfg(unix)]
    mod fake_yt_dlp {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn write_script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("yt-dlp");
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn test_invocation_args() {
            let dir = tempfile::tempdir().unwrap();
            let args_file = dir.path().join("args.txt");
            let out = dir.path().join("out/audio");
            let script = write_script(
                dir.path(),
                &format!(
                    "printf '%s\\n' \"$@\" > '{}'\n: > '{}.mp3'",
                    args_file.display(),
                    out.display()
                ),
            );

            let fetcher = AudioFetcher::new(
                YtDlp::new(script).with_ffmpeg(Some(PathBuf::from("/opt/ffmpeg/bin"))),
            );
            fetcher.fetch(PLAYLIST_URL, out.to_str()).await.unwrap();

            let recorded = std::fs::read_to_string(&args_file).unwrap();
            let args: Vec<&str> = recorded.lines().collect();
            let planned: Vec<String> = fetcher
                .pipeline()
                .command_args(&FetchOptions::audio_mp3(out.to_str().unwrap()), &[PLAYLIST_URL.to_string()])
                .into_iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect();
            assert_eq!(args, planned);
            let template = out.to_str().unwrap();
            assert_eq!(
                args,
                vec![
                    "-f", "bestaudio/best",
                    "-o", template,
                    "-x", "--audio-format", "mp3", "--audio-quality", "192K",
                    "--no-playlist",
                    "--ffmpeg-location", "/opt/ffmpeg/bin",
                    "--", PLAYLIST_URL,
                ]
            );
            assert!(dir.path().join("out/audio.mp3").exists());
        }

        #[tokio::test]
        async fn test_dotted_template_output_path() {
            let dir = tempfile::tempdir().unwrap();
            // $4 is the -o value; append the extension the way yt-dlp does
            let script = write_script(dir.path(), ": > \"$4.mp3\"");
            let template = dir.path().join("out/Artist - Song ft. X");

            let fetcher = AudioFetcher::new(YtDlp::new(script));
            fetcher
                .fetch("https://youtu.be/dQw4w9WgXcQ", template.to_str())
                .await
                .unwrap();

            let resolved = FetchOptions::audio_mp3(template.to_str().unwrap())
                .resolved_output_path()
                .unwrap();
            assert_eq!(resolved, dir.path().join("out/Artist - Song ft. X.mp3"));
            assert!(resolved.exists());
        }

        #[tokio::test]
        async fn test_nonzero_exit() {
            let dir = tempfile::tempdir().unwrap();
            let script = write_script(dir.path(), "echo 'ERROR: Unsupported URL' >&2\nexit 2");

            let fetcher = AudioFetcher::new(YtDlp::new(script));
            let err = fetcher
                .fetch("https://example.invalid/nothing", Some(dir.path().join("a").to_str().unwrap()))
                .await
                .unwrap_err();

            assert!(matches!(err, FetchError::PipelineFailed(Some(2))));
            assert!(!dir.path().join("a.mp3").exists());
        }
    }
}
