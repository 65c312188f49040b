use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::ids::SongId;
use super::metadata::MetadataCandidate;
use crate::taxonomy::Decade;

/// Longest description kept in the catalog.
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// How a song entered the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DownloadSource {
    /// Fetched from a URL by the pipeline.
    Download,
    /// Copied in from an existing audio file.
    Import,
}

impl DownloadSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Import => "import",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "download" => Some(Self::Download),
            "import" => Some(Self::Import),
            _ => None,
        }
    }
}

impl fmt::Display for DownloadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A song in the catalog.
///
/// Created only once the file is tagged and sitting at its final path;
/// `file_path` points at that file and `content_fingerprint` is unique
/// across the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    pub id: SongId,
    pub source_url: String,
    pub video_id: Option<String>,
    pub title: String,
    pub artist: Option<String>,
    pub year: Option<i32>,
    pub genre: String,
    pub file_path: PathBuf,
    pub file_size: u64,
    pub duration_secs: Option<f64>,
    pub content_fingerprint: String,
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
    pub download_source: DownloadSource,
    pub created_at: DateTime<Utc>,
}

impl SongRecord {
    /// Build a record from the metadata that was written into the file.
    #[must_use]
    pub fn from_candidate(
        candidate: &MetadataCandidate,
        file_path: PathBuf,
        file_size: u64,
        content_fingerprint: String,
        download_source: DownloadSource,
    ) -> Self {
        Self {
            id: SongId::new(),
            source_url: candidate.source_url.clone(),
            video_id: candidate.video_id.clone(),
            title: candidate.title().to_string(),
            artist: candidate.artist().map(str::to_string),
            year: candidate.year(),
            genre: candidate.genre().to_string(),
            file_path,
            file_size,
            duration_secs: candidate.duration_secs,
            content_fingerprint,
            thumbnail_url: candidate.thumbnail_url.clone(),
            description: candidate
                .description
                .as_deref()
                .map(|d| d.chars().take(MAX_DESCRIPTION_CHARS).collect()),
            download_source,
            created_at: Utc::now(),
        }
    }

    pub fn decade(&self) -> Decade {
        Decade::from_year(self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provenance::{Resolved, Source};

    #[test]
    fn test_download_source_round_trip() {
        for source in [DownloadSource::Download, DownloadSource::Import] {
            assert_eq!(DownloadSource::parse(source.as_str()), Some(source));
        }
        assert_eq!(DownloadSource::parse("torrent"), None);
    }

    #[test]
    fn test_from_candidate_copies_resolved_fields() {
        let mut candidate = MetadataCandidate::untitled(
            "https://www.youtube.com/watch?v=tKi9Z-f6qX4",
            Resolved::new("Strobe".to_string(), Source::TitlePattern),
        );
        candidate.artist = Some(Resolved::new("Deadmau5".to_string(), Source::TitlePattern));
        candidate.year = Some(Resolved::new(2009, Source::Platform));
        candidate.description = Some("x".repeat(MAX_DESCRIPTION_CHARS + 50));

        let record = SongRecord::from_candidate(
            &candidate,
            PathBuf::from("/music/Sin Clasificar/Unknown/Deadmau5 - Strobe.mp3"),
            4096,
            "cp:abc".to_string(),
            DownloadSource::Download,
        );

        assert_eq!(record.title, "Strobe");
        assert_eq!(record.artist.as_deref(), Some("Deadmau5"));
        assert_eq!(record.year, Some(2009));
        assert_eq!(record.decade(), Decade::Known(2000));
        assert_eq!(record.genre, "Sin Clasificar");
        assert_eq!(
            record.description.as_ref().map(|d| d.chars().count()),
            Some(MAX_DESCRIPTION_CHARS)
        );
    }
}
