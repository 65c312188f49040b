//! Last.fm genre lookup.
//!
//! Fetches folksonomy tags for a track through `track.getTopTags`. Tags
//! are community labels with popularity counts (0--100, relative to the
//! top tag); the most popular one that reads like a genre wins.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use discoteca_core::taxonomy::normalize_genre;

use crate::enrich::resilience::RateLimiter;
use crate::enrich::{http_client, USER_AGENT};
use crate::error::{EnrichError, EnrichResult};

const LASTFM_API_BASE: &str = "https://ws.audioscrobbler.com/2.0/";
const SOURCE_NAME: &str = "Last.fm";

/// Minimum tag count to consider (filters noise from low-vote tags).
const MIN_TAG_COUNT: u32 = 10;

/// Popular tags that say nothing about the genre.
const NOISE_TAGS: &[&str] = &[
    "seen live",
    "favorites",
    "favourites",
    "favorite",
    "favourite",
    "love",
    "awesome",
    "beautiful",
    "catchy",
    "male vocalists",
    "female vocalists",
    "under 2000 listeners",
    "my music",
];

// Last.fm reports errors as JSON bodies with a 200 status.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LastFmResponse {
    Tags(TopTagsResponse),
    Error { error: u32, message: String },
}

#[derive(Debug, Deserialize)]
struct TopTagsResponse {
    toptags: TopTags,
}

#[derive(Debug, Deserialize)]
struct TopTags {
    #[serde(default)]
    tag: Vec<LastFmTag>,
}

/// A single folksonomy tag returned by the Last.fm API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LastFmTag {
    /// Human-readable tag name (e.g. "deep house", "seen live").
    pub name: String,
    /// Popularity relative to the top tag.
    pub count: u32,
}

/// Last.fm API client.
///
/// The Last.fm API allows up to 5 requests per second for non-commercial
/// use.
#[derive(Debug, Clone)]
pub struct LastFmClient {
    http: Client,
    api_key: String,
    rate_limiter: RateLimiter,
}

impl LastFmClient {
    /// Create a new Last.fm API client.
    ///
    /// The `api_key` must be a valid Last.fm API key obtained from
    /// <https://www.last.fm/api/account/create>.
    pub fn new(api_key: String) -> EnrichResult<Self> {
        Ok(Self {
            http: http_client(USER_AGENT, Duration::from_secs(10))?,
            api_key,
            rate_limiter: RateLimiter::new(5),
        })
    }

    /// Get top tags for a track, unfiltered.
    pub async fn get_track_tags(&self, artist: &str, track: &str) -> EnrichResult<Vec<LastFmTag>> {
        self.rate_limiter.acquire().await;

        let response = self
            .http
            .get(LASTFM_API_BASE)
            .query(&[
                ("method", "track.getTopTags"),
                ("artist", artist),
                ("track", track),
                ("autocorrect", "1"),
                ("api_key", &self.api_key),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| EnrichError::http(SOURCE_NAME, e))?;

        let result: LastFmResponse = response
            .json()
            .await
            .map_err(|e| EnrichError::parse(SOURCE_NAME, e))?;

        match result {
            LastFmResponse::Tags(tags) => Ok(tags.toptags.tag),
            LastFmResponse::Error { error, message } => Err(api_error(error, message, artist, track)),
        }
    }

    /// Look up the genre of a track.
    pub async fn track_genre(&self, artist: &str, track: &str) -> EnrichResult<Option<String>> {
        let tags = self.get_track_tags(artist, track).await?;
        Ok(pick_genre(&tags))
    }
}

fn api_error(code: u32, message: String, artist: &str, track: &str) -> EnrichError {
    match code {
        6 => EnrichError::NotFound {
            entity: format!("{artist} - {track}"),
            source_name: SOURCE_NAME.to_string(),
        },
        29 => EnrichError::RateLimited {
            source_name: SOURCE_NAME.to_string(),
        },
        _ => EnrichError::Http {
            source_name: SOURCE_NAME.to_string(),
            message: format!("error {code}: {message}"),
        },
    }
}

/// The most popular tag that looks like a genre, normalized for display.
pub fn pick_genre(tags: &[LastFmTag]) -> Option<String> {
    tags.iter()
        .filter(|tag| tag.count >= MIN_TAG_COUNT)
        .filter(|tag| is_genre_like(&tag.name))
        .find_map(|tag| normalize_genre(&tag.name))
}

fn is_genre_like(name: &str) -> bool {
    let lowered = name.trim().to_lowercase();
    if lowered.chars().count() <= 2 && lowered != "r&b" {
        return false;
    }
    if NOISE_TAGS.contains(&lowered.as_str()) {
        return false;
    }
    // Years and decades ("2009", "80s", "00s")
    !lowered.trim_end_matches('s').chars().all(|c| c.is_ascii_digit())
}
