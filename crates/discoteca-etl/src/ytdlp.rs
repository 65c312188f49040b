//! The external media tool that fetches platform metadata and audio.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::DownloadError;

/// Platform metadata for one video, as reported by `yt-dlp --dump-json`.
///
/// Every field is optional in practice; missing ones deserialize to
/// their defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VideoInfo {
    pub id: Option<String>,
    pub title: String,
    /// Track name from the platform's music metadata, when present.
    pub track: Option<String>,
    pub artist: Option<String>,
    pub artists: Vec<String>,
    pub creator: Option<String>,
    pub uploader: Option<String>,
    pub channel: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub release_year: Option<i32>,
    /// `YYYYMMDD`
    pub release_date: Option<String>,
    /// `YYYYMMDD`
    pub upload_date: Option<String>,
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    pub webpage_url: Option<String>,
}

impl VideoInfo {
    /// The channel name, preferring `channel` over `uploader`.
    pub fn channel_name(&self) -> Option<&str> {
        self.channel
            .as_deref()
            .or(self.uploader.as_deref())
            .filter(|c| !c.trim().is_empty())
    }

    /// Cover image URL. YouTube thumbnails are requested as JPEG since the
    /// default thumbnail is often WebP, which not every player shows.
    pub fn cover_url(&self) -> Option<String> {
        let is_youtube = self
            .webpage_url
            .as_deref()
            .is_some_and(|u| u.contains("youtube.com") || u.contains("youtu.be"));
        match (&self.id, is_youtube) {
            (Some(id), true) => Some(format!("https://i.ytimg.com/vi/{id}/hqdefault.jpg")),
            _ => self.thumbnail.clone(),
        }
    }
}

/// A tool that turns a URL into platform metadata and a local audio file.
#[async_trait]
pub trait MediaTool: Send + Sync + std::fmt::Debug {
    /// Check that the tool can run at all.
    async fn check_available(&self) -> Result<(), DownloadError>;

    /// Fetch metadata without downloading the media.
    async fn fetch_info(&self, url: &str) -> Result<VideoInfo, DownloadError>;

    /// Download the best available audio into `dest_dir`, named
    /// `<stem>.<ext>`, and return the file's path.
    async fn fetch_audio(
        &self,
        url: &str,
        dest_dir: &Path,
        stem: &str,
    ) -> Result<PathBuf, DownloadError>;
}

/// `yt-dlp` invoked as a subprocess.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    cookies_file: Option<PathBuf>,
}

impl YtDlp {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            cookies_file: None,
        }
    }

    /// Pass a cookies file to every invocation.
    #[must_use]
    pub fn with_cookies(mut self, cookies_file: Option<PathBuf>) -> Self {
        self.cookies_file = cookies_file;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--no-playlist").arg("--no-warnings");
        if let Some(cookies) = &self.cookies_file {
            cmd.arg("--cookies").arg(cookies);
        }
        cmd.kill_on_drop(true);
        cmd
    }

    async fn run(&self, mut cmd: Command) -> Result<Vec<u8>, DownloadError> {
        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DownloadError::ToolNotFound(self.program.clone())
            } else {
                DownloadError::Io(e)
            }
        })?;

        if !output.status.success() {
            return Err(DownloadError::Failed(failure_message(
                &output.stderr,
                &output.status,
            )));
        }
        Ok(output.stdout)
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl MediaTool for YtDlp {
    async fn check_available(&self) -> Result<(), DownloadError> {
        which::which(&self.program)
            .map(|_| ())
            .map_err(|_| DownloadError::ToolNotFound(self.program.clone()))
    }

    async fn fetch_info(&self, url: &str) -> Result<VideoInfo, DownloadError> {
        let mut cmd = self.command();
        cmd.arg("--dump-json").arg("--no-download").arg(url);

        let stdout = self.run(cmd).await?;
        serde_json::from_slice(&stdout)
            .map_err(|e| DownloadError::Failed(format!("unreadable metadata: {e}")))
    }

    async fn fetch_audio(
        &self,
        url: &str,
        dest_dir: &Path,
        stem: &str,
    ) -> Result<PathBuf, DownloadError> {
        let template = dest_dir.join(format!("{stem}.%(ext)s"));

        let mut cmd = self.command();
        cmd.arg("-f")
            .arg("bestaudio/best")
            .arg("-x")
            .arg("--audio-format")
            .arg("mp3")
            .arg("--audio-quality")
            .arg("0")
            .arg("--no-progress")
            .arg("-o")
            .arg(&template)
            .arg(url);

        log::debug!("Running {} for {}", self.program, url);
        self.run(cmd).await?;

        find_output(dest_dir, stem)
    }
}

/// Locate the file a download produced: `<stem>.mp3` if the conversion
/// ran, otherwise any `<stem>.*` left behind.
pub(crate) fn find_output(dest_dir: &Path, stem: &str) -> Result<PathBuf, DownloadError> {
    let expected = dest_dir.join(format!("{stem}.mp3"));
    if expected.is_file() {
        return Ok(expected);
    }

    let prefix = format!("{stem}.");
    for entry in std::fs::read_dir(dest_dir)? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&prefix) && !n.ends_with(".part"));
        if matches && path.is_file() {
            return Ok(path);
        }
    }

    Err(DownloadError::MissingOutput(dest_dir.to_path_buf()))
}

/// Reduce the tool's stderr to the message worth showing a user.
fn failure_message(stderr: &[u8], status: &std::process::ExitStatus) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR"))
        .or_else(|| lines.last())
        .map_or_else(|| format!("exited with {status}"), |l| (*l).to_string())
}
