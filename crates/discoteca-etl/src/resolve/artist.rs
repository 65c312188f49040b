//! Artist strategies: override, platform field, embedded tag, title
//! pattern, auto-generated "Topic" channel.

use async_trait::async_trait;

use discoteca_core::provenance::Source;

use super::pattern::split_artist_title;
use super::{Chain, ResolveContext, Strategy};
use crate::error::EnrichResult;

const TOPIC_SUFFIX: &str = " - Topic";

/// The standard artist chain.
pub fn chain() -> Chain<String> {
    vec![
        Box::new(OverrideArtist),
        Box::new(PlatformArtist),
        Box::new(EmbeddedArtist),
        Box::new(TitlePatternArtist),
        Box::new(TopicChannelArtist),
    ]
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug)]
pub struct OverrideArtist;

#[async_trait]
impl Strategy<String> for OverrideArtist {
    fn source(&self) -> Source {
        Source::User
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<String>> {
        Ok(ctx.overrides.artist.clone())
    }
}

/// The platform's own music metadata (`artists`, `artist`, `creator`).
#[derive(Debug)]
pub struct PlatformArtist;

#[async_trait]
impl Strategy<String> for PlatformArtist {
    fn source(&self) -> Source {
        Source::Platform
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<String>> {
        let Some(info) = &ctx.info else {
            return Ok(None);
        };
        let artist = if info.artists.is_empty() {
            non_empty(info.artist.as_deref()).or_else(|| non_empty(info.creator.as_deref()))
        } else {
            non_empty(Some(&info.artists.join(", ")))
        };
        Ok(artist)
    }
}

#[derive(Debug)]
pub struct EmbeddedArtist;

#[async_trait]
impl Strategy<String> for EmbeddedArtist {
    fn source(&self) -> Source {
        Source::EmbeddedTag
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<String>> {
        Ok(non_empty(ctx.embedded.artist.as_deref()))
    }
}

/// Left-hand side of "Artist - Title".
#[derive(Debug)]
pub struct TitlePatternArtist;

#[async_trait]
impl Strategy<String> for TitlePatternArtist {
    fn source(&self) -> Source {
        Source::TitlePattern
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<String>> {
        Ok(split_artist_title(&ctx.raw_title).map(|(artist, _)| artist))
    }
}

/// YouTube's auto-generated "<Artist> - Topic" channels.
#[derive(Debug)]
pub struct TopicChannelArtist;

#[async_trait]
impl Strategy<String> for TopicChannelArtist {
    fn source(&self) -> Source {
        Source::Platform
    }

    fn name(&self) -> &'static str {
        "topic_channel"
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<String>> {
        let channel = ctx.info.as_ref().and_then(|i| i.channel_name());
        Ok(non_empty(channel.and_then(|c| c.strip_suffix(TOPIC_SUFFIX))))
    }
}
