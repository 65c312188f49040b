use serde::{Deserialize, Serialize};

use crate::provenance::{Resolved, Source};
use crate::taxonomy::{Decade, UNCLASSIFIED};

/// Caller-supplied values that win over every automated source.
///
/// Each field is independent: an unset override falls through to
/// automated resolution for that field only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overrides {
    pub artist: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
}

impl Overrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank strings are treated as "not overridden".
    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into()).filter(|a| !a.trim().is_empty());
        self
    }

    #[must_use]
    pub const fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Blank strings are treated as "not overridden".
    #[must_use]
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into()).filter(|g| !g.trim().is_empty());
        self
    }
}

/// Best-effort metadata for one download, produced before tagging.
///
/// Never persisted: the Tagger writes it into the file and the Organizer
/// turns it into a [`SongRecord`](super::SongRecord).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataCandidate {
    /// Normalized source URL.
    pub source_url: String,
    /// Platform video id, when known.
    pub video_id: Option<String>,
    pub title: Resolved<String>,
    /// `None` means the artist is unknown.
    pub artist: Option<Resolved<String>>,
    /// `None` means the year is unknown.
    pub year: Option<Resolved<i32>>,
    /// Always set; falls back to [`UNCLASSIFIED`] with [`Source::Sentinel`].
    pub genre: Resolved<String>,
    pub duration_secs: Option<f64>,
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
}

impl MetadataCandidate {
    /// A candidate with only a title; everything else unknown.
    #[must_use]
    pub fn untitled(source_url: impl Into<String>, title: Resolved<String>) -> Self {
        Self {
            source_url: source_url.into(),
            video_id: None,
            title,
            artist: None,
            year: None,
            genre: Resolved::new(UNCLASSIFIED.to_string(), Source::Sentinel),
            duration_secs: None,
            thumbnail_url: None,
            description: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title.value
    }

    pub fn artist(&self) -> Option<&str> {
        self.artist.as_ref().map(|a| a.value.as_str())
    }

    pub fn year(&self) -> Option<i32> {
        self.year.as_ref().map(|y| y.value)
    }

    pub fn genre(&self) -> &str {
        &self.genre.value
    }

    pub fn decade(&self) -> Decade {
        Decade::from_year(self.year())
    }

    /// "Artist - Title", or just the title when the artist is unknown.
    pub fn display_name(&self) -> String {
        match self.artist() {
            Some(artist) => format!("{artist} - {}", self.title()),
            None => self.title().to_string(),
        }
    }
}
