use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a resolved metadata field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// Explicit override supplied by the caller.
    User,
    /// Structured fields of the video platform's own metadata.
    Platform,
    /// Parsed out of an "Artist - Title" style video title.
    TitlePattern,
    /// Read from tags already embedded in an audio file.
    EmbeddedTag,
    /// Last.fm folksonomy tags.
    LastFm,
    /// `MusicBrainz` recording tags.
    MusicBrainz,
    /// The artist's most common genre already in the catalog.
    CatalogHistory,
    /// Keyword table matched against title, tags and description.
    Keyword,
    /// Keyword table matched against web search results.
    WebSearch,
    /// Nothing resolved the field; a sentinel value was used.
    Sentinel,
}

const SOURCE_NAMES: &[(Source, &str)] = &[
    (Source::User, "user"),
    (Source::Platform, "platform"),
    (Source::TitlePattern, "title_pattern"),
    (Source::EmbeddedTag, "embedded_tag"),
    (Source::LastFm, "lastfm"),
    (Source::MusicBrainz, "musicbrainz"),
    (Source::CatalogHistory, "catalog_history"),
    (Source::Keyword, "keyword"),
    (Source::WebSearch, "web_search"),
    (Source::Sentinel, "sentinel"),
];

impl Source {
    /// Canonical lowercase name, as shown in logs and CLI output.
    pub fn as_str(self) -> &'static str {
        SOURCE_NAMES
            .iter()
            .find(|(s, _)| *s == self)
            .map(|(_, name)| *name)
            .unwrap_or("unknown")
    }

    /// Parse a canonical name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        SOURCE_NAMES
            .iter()
            .find(|(_, canonical)| canonical.eq_ignore_ascii_case(name))
            .map(|(s, _)| *s)
    }

    /// Whether the value came from an automated source rather than the
    /// caller or a sentinel.
    pub const fn is_automated(self) -> bool {
        !matches!(self, Self::User | Self::Sentinel)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field value tagged with the source that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolved<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Resolved<T> {
    #[must_use]
    pub const fn new(value: T, source: Source) -> Self {
        Self { value, source }
    }

    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        Resolved {
            value: f(self.value),
            source: self.source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_name_round_trip() {
        for &(source, name) in SOURCE_NAMES {
            assert_eq!(source.as_str(), name);
            assert_eq!(Source::from_name(name), Some(source));
        }
    }

    #[test]
    fn test_source_from_name_case_insensitive() {
        assert_eq!(Source::from_name("LastFm"), Some(Source::LastFm));
        assert_eq!(Source::from_name("nope"), None);
    }

    #[test]
    fn test_is_automated() {
        assert!(Source::LastFm.is_automated());
        assert!(Source::Platform.is_automated());
        assert!(!Source::User.is_automated());
        assert!(!Source::Sentinel.is_automated());
    }

    #[test]
    fn test_resolved_map_keeps_source() {
        let resolved = Resolved::new("2008", Source::Platform).map(|s| s.len());
        assert_eq!(resolved.value, 4);
        assert_eq!(resolved.source, Source::Platform);
    }
}
