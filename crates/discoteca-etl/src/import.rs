//! Importer: brings existing audio files into the library.
//!
//! Each file is read for its tags, resolved through the same chains as a
//! download (without platform metadata), copied to scratch, tagged and
//! organized. The source files are only ever read.

use std::path::{Path, PathBuf};

use uuid::Uuid;
use walkdir::WalkDir;

use discoteca_core::model::{DownloadSource, MetadataCandidate, Overrides, SongRecord};

use crate::error::ImportError;
use crate::organize::Placement;
use crate::pipeline::{place, Pipeline};
use crate::resolve::{EmbeddedTags, ResolveContext};
use crate::tag::read_tags;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "oga", "opus", "wav", "m4a", "aac"];

/// What an import run did.
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub scanned: usize,
    pub stored: Vec<SongRecord>,
    pub duplicates: Vec<SongRecord>,
    pub failed: Vec<(PathBuf, ImportError)>,
}

#[derive(Debug)]
pub struct Importer<'a> {
    pipeline: &'a Pipeline,
}

impl<'a> Importer<'a> {
    pub fn new(pipeline: &'a Pipeline) -> Self {
        Self { pipeline }
    }

    /// Import every audio file under `dir`.
    ///
    /// Files already inside the library root are skipped. A file that fails
    /// is recorded in the summary and the walk continues.
    pub async fn import_dir(&self, dir: &Path, overrides: &Overrides) -> ImportSummary {
        let library = self.pipeline.organizer().music_root().to_path_buf();
        let files: Vec<PathBuf> = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| is_audio_file(path))
            .filter(|path| !absolute(path).starts_with(&library))
            .collect();

        log::info!("Found {} audio files in {}", files.len(), dir.display());

        let mut summary = ImportSummary {
            scanned: files.len(),
            ..ImportSummary::default()
        };

        for path in files {
            match self.import_file(&path, overrides).await {
                Ok(Placement::Stored(record)) => summary.stored.push(record),
                Ok(Placement::Duplicate(record)) => {
                    log::info!("Skipping duplicate {}", path.display());
                    summary.duplicates.push(record);
                }
                Err(e) => {
                    log::warn!("Import of {} failed: {}", path.display(), e);
                    summary.failed.push((path, e));
                }
            }
        }

        log::info!(
            "Import finished: {} stored, {} duplicates, {} failed",
            summary.stored.len(),
            summary.duplicates.len(),
            summary.failed.len()
        );
        summary
    }

    /// Import a single file.
    ///
    /// Unreadable tags are not an error: the file is resolved from its name.
    pub async fn import_file(
        &self,
        path: &Path,
        overrides: &Overrides,
    ) -> Result<Placement, ImportError> {
        let source = absolute(path);
        let read_path = source.clone();
        let (embedded, duration) = tokio::task::spawn_blocking(move || read_tags(&read_path))
            .await
            .map_err(|e| ImportError::Task(e.to_string()))?
            .unwrap_or_else(|e| {
                log::warn!("{}; resolving from the file name", e);
                (EmbeddedTags::default(), 0.0)
            });

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let source_url = url::Url::from_file_path(&source)
            .map_or_else(|()| source.display().to_string(), |u| u.to_string());

        let ctx = ResolveContext::for_import(source_url, &stem, embedded, overrides.clone());
        let mut candidate = self.pipeline.resolver().resolve_context(ctx).await;
        if duration > 0.0 {
            candidate.duration_secs = Some(duration);
        }

        let scratch = self
            .pipeline
            .downloader()
            .scratch_root()
            .join(Uuid::new_v4().to_string());
        let result = self.copy_tag_place(&source, &scratch, candidate).await;
        if let Err(e) = tokio::fs::remove_dir_all(&scratch).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove scratch directory {}: {}", scratch.display(), e);
            }
        }
        result
    }

    async fn copy_tag_place(
        &self,
        source: &Path,
        scratch: &Path,
        candidate: MetadataCandidate,
    ) -> Result<Placement, ImportError> {
        tokio::fs::create_dir_all(scratch)
            .await
            .map_err(|e| ImportError::io("create directory", scratch, e))?;

        let file_name = source
            .file_name()
            .ok_or_else(|| ImportError::NoFileName(source.to_path_buf()))?;
        let working = scratch.join(file_name);
        tokio::fs::copy(source, &working)
            .await
            .map_err(|e| ImportError::io("copy", source, e))?;

        let tagged = self.pipeline.tagger().apply(&working, &candidate).await?;
        let placement =
            place(self.pipeline.organizer(), &tagged, candidate, DownloadSource::Import).await?;
        Ok(placement)
    }
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
