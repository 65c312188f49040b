//! Download Executor: turns a URL into a raw audio file in the scratch area.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::error::DownloadError;
use crate::ytdlp::MediaTool;

/// A freshly downloaded, untagged audio file.
///
/// Each download gets its own scratch subdirectory so concurrent requests
/// never see each other's files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAudio {
    pub path: PathBuf,
    pub scratch_dir: PathBuf,
}

/// Fetches audio through a [`MediaTool`] into a scratch directory.
#[derive(Debug, Clone)]
pub struct DownloadExecutor {
    tool: Arc<dyn MediaTool>,
    scratch_root: PathBuf,
}

impl DownloadExecutor {
    pub fn new(tool: Arc<dyn MediaTool>, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            scratch_root: scratch_root.into(),
        }
    }

    pub fn tool(&self) -> &Arc<dyn MediaTool> {
        &self.tool
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Download the best available audio for `url`.
    ///
    /// On failure the scratch subdirectory is removed, so a failed download
    /// leaves nothing behind. No retry is attempted.
    pub async fn fetch(&self, url: &str, video_id: Option<&str>) -> Result<RawAudio, DownloadError> {
        let scratch_dir = self.scratch_root.join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&scratch_dir).await?;

        let stem = video_id.unwrap_or("audio");
        match self.tool.fetch_audio(url, &scratch_dir, stem).await {
            Ok(path) => {
                log::info!("Downloaded {} to {}", url, path.display());
                Ok(RawAudio { path, scratch_dir })
            }
            Err(e) => {
                remove_scratch_dir(&scratch_dir).await;
                Err(e)
            }
        }
    }

    /// Remove a download's scratch directory once its file has moved on.
    pub async fn cleanup(&self, raw: &RawAudio) {
        remove_scratch_dir(&raw.scratch_dir).await;
    }
}

async fn remove_scratch_dir(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            log::warn!("Failed to remove scratch directory {}: {}", dir.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ytdlp::VideoInfo;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct FailingTool;

    #[async_trait]
    impl MediaTool for FailingTool {
        async fn check_available(&self) -> Result<(), DownloadError> {
            Ok(())
        }

        async fn fetch_info(&self, _url: &str) -> Result<VideoInfo, DownloadError> {
            Err(DownloadError::Failed("Video unavailable".into()))
        }

        async fn fetch_audio(
            &self,
            _url: &str,
            dest_dir: &Path,
            stem: &str,
        ) -> Result<PathBuf, DownloadError> {
            std::fs::write(dest_dir.join(format!("{stem}.webm.part")), b"partial")?;
            Err(DownloadError::Failed(
                "ERROR: Video unavailable in your country".into(),
            ))
        }
    }

    #[derive(Debug)]
    struct WritingTool;

    #[async_trait]
    impl MediaTool for WritingTool {
        async fn check_available(&self) -> Result<(), DownloadError> {
            Ok(())
        }

        async fn fetch_info(&self, _url: &str) -> Result<VideoInfo, DownloadError> {
            Ok(VideoInfo::default())
        }

        async fn fetch_audio(
            &self,
            _url: &str,
            dest_dir: &Path,
            stem: &str,
        ) -> Result<PathBuf, DownloadError> {
            let path = dest_dir.join(format!("{stem}.mp3"));
            std::fs::write(&path, b"audio")?;
            Ok(path)
        }
    }

    #[tokio::test]
    async fn test_failed_download_leaves_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let executor = DownloadExecutor::new(Arc::new(FailingTool), dir.path());

        let err = executor
            .fetch("https://www.youtube.com/watch?v=abc", Some("abc"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unavailable"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_download_uses_private_scratch_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let executor = DownloadExecutor::new(Arc::new(WritingTool), dir.path());

        let first = executor.fetch("https://a", Some("abc")).await.unwrap();
        let second = executor.fetch("https://a", Some("abc")).await.unwrap();
        assert_ne!(first.scratch_dir, second.scratch_dir);
        assert!(first.path.is_file());
        assert!(first.path.starts_with(&first.scratch_dir));

        executor.cleanup(&first).await;
        assert!(!first.scratch_dir.exists());
        assert!(second.path.is_file());
    }
}
