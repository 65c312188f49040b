//! MusicBrainz genre lookup.
//!
//! Searches recordings by artist and title and reads the community tags of
//! the best match. No API key is needed, but MusicBrainz allows one request
//! per second per client, enforced by a shared [`RateLimiter`].

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use discoteca_core::taxonomy::normalize_genre;

use crate::enrich::resilience::RateLimiter;
use crate::enrich::{http_client, USER_AGENT};
use crate::error::{EnrichError, EnrichResult};

const MUSICBRAINZ_API_BASE: &str = "https://musicbrainz.org/ws/2/recording/";
const SOURCE_NAME: &str = "MusicBrainz";

/// Search hits scoring below this are treated as a different song.
const MIN_SCORE: u32 = 80;

#[derive(Debug, Deserialize)]
struct RecordingSearch {
    #[serde(default)]
    recordings: Vec<MbRecording>,
}

/// A recording from a MusicBrainz search.
#[derive(Debug, Clone, Deserialize)]
pub struct MbRecording {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub tags: Vec<MbTag>,
}

/// A community tag on a MusicBrainz entity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MbTag {
    pub name: String,
    #[serde(default)]
    pub count: i32,
}

/// MusicBrainz API client.
#[derive(Debug, Clone)]
pub struct MusicBrainzClient {
    http: Client,
    rate_limiter: RateLimiter,
}

impl MusicBrainzClient {
    /// Create a new MusicBrainz client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> EnrichResult<Self> {
        Ok(Self {
            http: http_client(USER_AGENT, Duration::from_secs(10))?,
            rate_limiter: RateLimiter::new(1),
        })
    }

    /// Search recordings by artist and title.
    pub async fn search_recordings(&self, artist: &str, title: &str) -> EnrichResult<Vec<MbRecording>> {
        self.rate_limiter.acquire().await;

        let query = format!(
            "artist:\"{}\" AND recording:\"{}\"",
            escape_query(artist),
            escape_query(title)
        );

        let response = self
            .http
            .get(MUSICBRAINZ_API_BASE)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("query", query.as_str()), ("fmt", "json"), ("limit", "5")])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(EnrichError::RateLimited {
                source_name: SOURCE_NAME.to_string(),
            });
        }

        let response = response
            .error_for_status()
            .map_err(|e| EnrichError::http(SOURCE_NAME, e))?;

        let result: RecordingSearch = response
            .json()
            .await
            .map_err(|e| EnrichError::parse(SOURCE_NAME, e))?;

        Ok(result.recordings)
    }

    /// Look up the genre of a recording.
    pub async fn recording_genre(&self, artist: &str, title: &str) -> EnrichResult<Option<String>> {
        let recordings = self.search_recordings(artist, title).await?;
        Ok(pick_genre(&recordings))
    }
}

/// The most-voted tag of the best-scoring recording that has tags.
pub fn pick_genre(recordings: &[MbRecording]) -> Option<String> {
    recordings
        .iter()
        .filter(|r| r.score >= MIN_SCORE)
        .find_map(|r| {
            let mut tags: Vec<&MbTag> = r.tags.iter().filter(|t| t.count > 0).collect();
            tags.sort_by(|a, b| b.count.cmp(&a.count));
            tags.into_iter()
                .filter(|t| t.name.chars().count() > 2)
                .find_map(|t| normalize_genre(&t.name))
        })
}

/// Escape Lucene special characters inside a quoted phrase.
fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
