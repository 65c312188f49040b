//! Title strategies: platform track field, embedded tag, title pattern,
//! raw title. Every value is cleaned of upload noise.

use async_trait::async_trait;

use discoteca_core::provenance::Source;

use super::pattern::{clean_title, split_artist_title};
use super::{Chain, ResolveContext, Strategy};
use crate::error::EnrichResult;

/// The standard title chain.
pub fn chain() -> Chain<String> {
    vec![
        Box::new(PlatformTrack),
        Box::new(EmbeddedTitle),
        Box::new(TitlePatternTitle),
        Box::new(RawTitle),
    ]
}

fn cleaned(value: Option<&str>) -> Option<String> {
    value.map(clean_title).filter(|t| !t.is_empty())
}

#[derive(Debug)]
pub struct PlatformTrack;

#[async_trait]
impl Strategy<String> for PlatformTrack {
    fn source(&self) -> Source {
        Source::Platform
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<String>> {
        Ok(cleaned(ctx.info.as_ref().and_then(|i| i.track.as_deref())))
    }
}

#[derive(Debug)]
pub struct EmbeddedTitle;

#[async_trait]
impl Strategy<String> for EmbeddedTitle {
    fn source(&self) -> Source {
        Source::EmbeddedTag
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<String>> {
        Ok(cleaned(ctx.embedded.title.as_deref()))
    }
}

/// Right-hand side of "Artist - Title".
#[derive(Debug)]
pub struct TitlePatternTitle;

#[async_trait]
impl Strategy<String> for TitlePatternTitle {
    fn source(&self) -> Source {
        Source::TitlePattern
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<String>> {
        Ok(split_artist_title(&ctx.raw_title).map(|(_, title)| title))
    }
}

/// The upload title (or file name) as-is, minus noise.
#[derive(Debug)]
pub struct RawTitle;

#[async_trait]
impl Strategy<String> for RawTitle {
    fn source(&self) -> Source {
        Source::Platform
    }

    fn name(&self) -> &'static str {
        "raw_title"
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<String>> {
        Ok(cleaned(Some(&ctx.raw_title)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve_field;
    use crate::ytdlp::VideoInfo;

    fn ctx(title: &str, track: Option<&str>) -> ResolveContext {
        ResolveContext {
            raw_title: title.to_string(),
            info: Some(VideoInfo {
                title: title.to_string(),
                track: track.map(str::to_string),
                ..VideoInfo::default()
            }),
            ..ResolveContext::default()
        }
    }

    #[tokio::test]
    async fn test_track_field_wins() {
        let title = resolve_field("title", &chain(), &ctx("deadmau5 - Strobe (Live)", Some("Strobe")))
            .await
            .unwrap();
        assert_eq!(title.value, "Strobe");
        assert_eq!(title.source, Source::Platform);
    }

    #[tokio::test]
    async fn test_pattern_title() {
        let title = resolve_field(
            "title",
            &chain(),
            &ctx("Avicii - Levels (Official Video) [2011]", None),
        )
        .await
        .unwrap();
        assert_eq!(title.value, "Levels");
        assert_eq!(title.source, Source::TitlePattern);
    }

    #[tokio::test]
    async fn test_raw_title_fallback() {
        let title = resolve_field("title", &chain(), &ctx("Strobe (Lyrics)", None))
            .await
            .unwrap();
        assert_eq!(title.value, "Strobe");
        assert_eq!(title.source, Source::Platform);
    }

    #[tokio::test]
    async fn test_empty_title_resolves_nothing() {
        assert!(resolve_field("title", &chain(), &ctx("  ", None)).await.is_none());
    }
}
