//! The download pipeline: resolve → download → tag → organize.
//!
//! One call to [`Pipeline::run`] handles one URL from start to finish. Runs
//! may be issued concurrently from several tasks; they only serialize on the
//! catalog writer inside the organizer.

use std::path::Path;
use std::sync::Arc;

use discoteca_core::model::{DownloadSource, MetadataCandidate, Overrides, SongRecord};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::download::DownloadExecutor;
use crate::error::{OrganizeError, PipelineError};
use crate::link::SourceLink;
use crate::organize::{Organizer, Placement};
use crate::resolve::MetadataResolver;
use crate::tag::Tagger;
use crate::ytdlp::{MediaTool, YtDlp};

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// A new song was added to the library.
    Stored(SongRecord),
    /// The content was already in the catalog; nothing changed.
    Duplicate(SongRecord),
}

impl PipelineOutcome {
    pub fn record(&self) -> &SongRecord {
        match self {
            Self::Stored(record) | Self::Duplicate(record) => record,
        }
    }

    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

impl From<Placement> for PipelineOutcome {
    fn from(placement: Placement) -> Self {
        match placement {
            Placement::Stored(record) => Self::Stored(record),
            Placement::Duplicate(record) => Self::Duplicate(record),
        }
    }
}

/// All pipeline components, built once from a [`Config`].
#[derive(Debug)]
pub struct Pipeline {
    resolver: MetadataResolver,
    downloader: DownloadExecutor,
    tagger: Tagger,
    organizer: Arc<Organizer>,
}

impl Pipeline {
    /// Build a pipeline that downloads with yt-dlp.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be opened.
    pub fn from_config(config: &Config) -> discoteca_core::Result<Self> {
        let tool = YtDlp::new(config.ytdlp_path.clone()).with_cookies(config.cookies_file.clone());
        Self::new(config, Arc::new(tool))
    }

    /// Build a pipeline around any media tool, opening the configured catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be opened.
    pub fn new(config: &Config, tool: Arc<dyn MediaTool>) -> discoteca_core::Result<Self> {
        let catalog = Arc::new(Catalog::open(&config.database_path)?);
        Ok(Self::with_catalog(config, tool, catalog))
    }

    /// Build a pipeline around an already open catalog.
    pub fn with_catalog(config: &Config, tool: Arc<dyn MediaTool>, catalog: Arc<Catalog>) -> Self {
        Self {
            resolver: MetadataResolver::new(config, Arc::clone(&tool), Arc::clone(&catalog)),
            downloader: DownloadExecutor::new(tool, config.scratch_dir.clone()),
            tagger: Tagger::new(config.embed_cover),
            organizer: Arc::new(Organizer::new(config.music_folder.clone(), catalog)),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        self.organizer.catalog()
    }

    pub fn resolver(&self) -> &MetadataResolver {
        &self.resolver
    }

    pub fn tagger(&self) -> &Tagger {
        &self.tagger
    }

    pub fn organizer(&self) -> &Arc<Organizer> {
        &self.organizer
    }

    pub fn downloader(&self) -> &DownloadExecutor {
        &self.downloader
    }

    /// Download, tag and file one URL.
    ///
    /// A video already catalogued with its file still on disk is reported
    /// as a duplicate without downloading. Metadata resolution never fails. A failed download leaves nothing on
    /// disk; a failed tag or organize step leaves the audio file where it
    /// was and names it in the error.
    ///
    /// # Errors
    ///
    /// Returns the [`PipelineError`] of the first stage that failed.
    pub async fn run(&self, url: &str, overrides: &Overrides) -> Result<PipelineOutcome, PipelineError> {
        let link = SourceLink::parse(url).map_err(PipelineError::DownloadFailed)?;
        log::info!("Processing {}", link);

        if let Some(existing) = self.already_in_library(&link) {
            log::info!(
                "{} is already in the library at {}",
                link,
                existing.file_path.display()
            );
            return Ok(PipelineOutcome::Duplicate(existing));
        }

        let candidate = self.resolver.resolve(&link, overrides).await;

        let raw = self
            .downloader
            .fetch(link.as_str(), link.video_id())
            .await
            .map_err(PipelineError::DownloadFailed)?;

        let tagged = self
            .tagger
            .apply(&raw.path, &candidate)
            .await
            .map_err(|source| PipelineError::TagWriteFailed {
                path: raw.path.clone(),
                source,
            })?;
        log::info!("Tagged {}", candidate.display_name());

        let placement = place(&self.organizer, &tagged, candidate, DownloadSource::Download)
            .await
            .map_err(|source| PipelineError::OrganizeFailed {
                path: tagged.clone(),
                source,
            })?;

        self.downloader.cleanup(&raw).await;
        Ok(placement.into())
    }

    /// The catalogued song for this video, if its file is still on disk.
    fn already_in_library(&self, link: &SourceLink) -> Option<SongRecord> {
        let video_id = link.video_id()?;
        match self.catalog().find_by_video_id(video_id) {
            Ok(existing) => existing.filter(|song| song.file_path.exists()),
            Err(e) => {
                log::warn!("Catalog lookup for {} failed: {}", video_id, e);
                None
            }
        }
    }
}

/// Run the organizer off the async runtime.
pub(crate) async fn place(
    organizer: &Arc<Organizer>,
    tagged: &Path,
    candidate: MetadataCandidate,
    download_source: DownloadSource,
) -> Result<Placement, OrganizeError> {
    let organizer = Arc::clone(organizer);
    let tagged = tagged.to_path_buf();
    tokio::task::spawn_blocking(move || organizer.place(&tagged, &candidate, download_source))
        .await
        .map_err(|e| OrganizeError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DownloadError;
    use crate::ytdlp::VideoInfo;
    use async_trait::async_trait;
    use discoteca_core::provenance::{Resolved, Source};
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[derive(Debug)]
    struct NoTool;

    #[async_trait]
    impl MediaTool for NoTool {
        async fn check_available(&self) -> Result<(), DownloadError> {
            Err(DownloadError::ToolNotFound("yt-dlp".into()))
        }

        async fn fetch_info(&self, _url: &str) -> Result<VideoInfo, DownloadError> {
            Err(DownloadError::ToolNotFound("yt-dlp".into()))
        }

        async fn fetch_audio(&self, _url: &str, _dir: &Path, _stem: &str) -> Result<PathBuf, DownloadError> {
            Err(DownloadError::ToolNotFound("yt-dlp".into()))
        }
    }

    fn config(dir: &TempDir) -> Config {
        Config::default()
            .offline()
            .with_music_folder(dir.path().join("Music"))
            .with_db_path(dir.path().join("catalog.db"))
    }

    #[tokio::test]
    async fn test_invalid_url_is_download_failure() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(&config(&dir), Arc::new(NoTool)).unwrap();

        let err = pipeline.run("not a url", &Overrides::default()).await.unwrap_err();
        assert_eq!(err.stage(), "download");
        assert!(matches!(err, PipelineError::DownloadFailed(DownloadError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_missing_tool_is_download_failure() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.scratch_dir = dir.path().join("scratch");
        let pipeline = Pipeline::new(&config, Arc::new(NoTool)).unwrap();

        let err = pipeline
            .run("https://youtu.be/tKi9Z-f6qX4", &Overrides::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::DownloadFailed(DownloadError::ToolNotFound(_))));
        assert_eq!(pipeline.catalog().count().unwrap(), 0);
        assert!(!dir.path().join("Music").exists());
    }

    #[test]
    fn test_outcome_accessors() {
        let candidate = MetadataCandidate::untitled(
            "https://www.youtube.com/watch?v=x",
            Resolved::new("x".to_string(), Source::Sentinel),
        );
        let record = SongRecord::from_candidate(
            &candidate,
            PathBuf::from("/m/x.mp3"),
            1,
            "cp:1".into(),
            DownloadSource::Download,
        );
        let outcome = PipelineOutcome::Duplicate(record.clone());
        assert!(outcome.is_duplicate());
        assert_eq!(outcome.record(), &record);
    }
}
