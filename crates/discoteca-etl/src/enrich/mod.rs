//! External genre lookups.
//!
//! Each client wraps one service and returns raw candidates; turning
//! them into a genre (and deciding what to do on failure) is the job of
//! the strategies in [`crate::resolve::genre`].

use std::time::Duration;

use reqwest::Client;

use crate::error::{EnrichError, EnrichResult};

pub mod lastfm;
pub mod musicbrainz;
pub mod resilience;
pub mod websearch;

pub use lastfm::LastFmClient;
pub use musicbrainz::MusicBrainzClient;
pub use resilience::RateLimiter;
pub use websearch::WebSearchClient;

pub(crate) const USER_AGENT: &str = concat!(
    "discoteca/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/discoteca/discoteca)"
);

/// Build an HTTP client with the given user agent and request timeout.
pub(crate) fn http_client(user_agent: &str, timeout: Duration) -> EnrichResult<Client> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(EnrichError::Request)
}
