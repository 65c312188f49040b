//! Genre strategies.
//!
//! Chain order: override, embedded tag (imports), Last.fm, MusicBrainz,
//! the artist's usual genre in the catalog, keyword table, web search.
//! Anything left falls back to the unclassified sentinel in the resolver.

use std::sync::Arc;

use async_trait::async_trait;

use discoteca_core::provenance::Source;
use discoteca_core::taxonomy::normalize_genre;

use super::keywords::KeywordTable;
use super::pattern::hashtags;
use super::{Chain, ResolveContext, Strategy};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::enrich::{websearch, LastFmClient, MusicBrainzClient, WebSearchClient};
use crate::error::EnrichResult;

/// The standard genre chain for a configuration.
///
/// Network sources that are disabled, lack a key, or whose client cannot
/// be built are left out.
pub fn chain(config: &Config, catalog: Arc<Catalog>) -> Chain<String> {
    let keywords = Arc::new(KeywordTable::new());
    let mut chain: Chain<String> = vec![Box::new(OverrideGenre), Box::new(EmbeddedGenre)];

    if let Some(key) = &config.lastfm_api_key {
        match LastFmClient::new(key.clone()) {
            Ok(client) => chain.push(Box::new(LastFmGenre::new(client))),
            Err(e) => log::warn!("Last.fm genre source disabled: {}", e),
        }
    }

    if config.musicbrainz_lookup {
        match MusicBrainzClient::new() {
            Ok(client) => chain.push(Box::new(MusicBrainzGenre::new(client))),
            Err(e) => log::warn!("MusicBrainz genre source disabled: {}", e),
        }
    }

    chain.push(Box::new(CatalogHistoryGenre::new(catalog)));
    chain.push(Box::new(KeywordGenre::new(Arc::clone(&keywords))));

    if config.web_search {
        match WebSearchClient::new() {
            Ok(client) => chain.push(Box::new(WebSearchGenre::new(client, keywords))),
            Err(e) => log::warn!("web search genre source disabled: {}", e),
        }
    }

    chain
}

/// The user-supplied genre, used exactly as given.
#[derive(Debug)]
pub struct OverrideGenre;

#[async_trait]
impl Strategy<String> for OverrideGenre {
    fn source(&self) -> Source {
        Source::User
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<String>> {
        Ok(ctx.overrides.genre.clone())
    }
}

#[derive(Debug)]
pub struct EmbeddedGenre;

#[async_trait]
impl Strategy<String> for EmbeddedGenre {
    fn source(&self) -> Source {
        Source::EmbeddedTag
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<String>> {
        Ok(ctx.embedded.genre.as_deref().and_then(normalize_genre))
    }
}

/// Last.fm track tags. Needs a resolved artist.
#[derive(Debug)]
pub struct LastFmGenre {
    client: LastFmClient,
}

impl LastFmGenre {
    pub fn new(client: LastFmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Strategy<String> for LastFmGenre {
    fn source(&self) -> Source {
        Source::LastFm
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<String>> {
        let Some(artist) = &ctx.artist else {
            return Ok(None);
        };
        self.client.track_genre(artist, &ctx.title).await
    }
}

/// MusicBrainz recording tags. Needs a resolved artist.
#[derive(Debug)]
pub struct MusicBrainzGenre {
    client: MusicBrainzClient,
}

impl MusicBrainzGenre {
    pub fn new(client: MusicBrainzClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Strategy<String> for MusicBrainzGenre {
    fn source(&self) -> Source {
        Source::MusicBrainz
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<String>> {
        let Some(artist) = &ctx.artist else {
            return Ok(None);
        };
        self.client.recording_genre(artist, &ctx.title).await
    }
}

/// The genre the artist is most often filed under already.
#[derive(Debug)]
pub struct CatalogHistoryGenre {
    catalog: Arc<Catalog>,
}

impl CatalogHistoryGenre {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Strategy<String> for CatalogHistoryGenre {
    fn source(&self) -> Source {
        Source::CatalogHistory
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<String>> {
        let Some(artist) = &ctx.artist else {
            return Ok(None);
        };
        Ok(self.catalog.most_common_genre_for_artist(artist)?)
    }
}

/// Keyword table over hashtags, video tags, channel, title and
/// description, in that order.
#[derive(Debug)]
pub struct KeywordGenre {
    keywords: Arc<KeywordTable>,
}

impl KeywordGenre {
    pub fn new(keywords: Arc<KeywordTable>) -> Self {
        Self { keywords }
    }

    fn find(&self, ctx: &ResolveContext) -> Option<&'static str> {
        let description = ctx.description().unwrap_or_default();
        let info = ctx.info.as_ref();

        let from_hashtags = || {
            hashtags(&ctx.raw_title)
                .into_iter()
                .chain(hashtags(description))
                .find_map(|tag| self.keywords.find_hashtag(&tag))
        };
        let from_tags = || {
            info.into_iter()
                .flat_map(|i| i.tags.iter().chain(i.categories.iter()))
                .find_map(|tag| self.keywords.find(tag))
        };
        let from_channel = || {
            info.and_then(|i| i.channel_name())
                .and_then(|c| self.keywords.find(c))
        };

        from_hashtags()
            .or_else(from_tags)
            .or_else(from_channel)
            .or_else(|| self.keywords.find(&ctx.raw_title))
            .or_else(|| self.keywords.find(description))
    }
}

#[async_trait]
impl Strategy<String> for KeywordGenre {
    fn source(&self) -> Source {
        Source::Keyword
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<String>> {
        Ok(self.find(ctx).map(str::to_string))
    }
}

/// Keyword table over web search results for the song.
#[derive(Debug)]
pub struct WebSearchGenre {
    client: WebSearchClient,
    keywords: Arc<KeywordTable>,
}

impl WebSearchGenre {
    pub fn new(client: WebSearchClient, keywords: Arc<KeywordTable>) -> Self {
        Self { client, keywords }
    }
}

#[async_trait]
impl Strategy<String> for WebSearchGenre {
    fn source(&self) -> Source {
        Source::WebSearch
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<String>> {
        if ctx.title.is_empty() {
            return Ok(None);
        }
        let queries = websearch::queries(ctx.artist.as_deref(), &ctx.title);
        self.client.find_genre(&queries, &self.keywords).await
    }
}
