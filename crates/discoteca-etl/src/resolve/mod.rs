//! Metadata Resolver.
//!
//! Every field is resolved by an ordered chain of [`Strategy`]s. The first
//! strategy that returns a value wins and tags the field with its
//! [`Source`]. A strategy that errors is logged as degraded and skipped, so
//! resolution itself never fails: at worst the artist and year stay
//! unknown and the genre falls back to [`UNCLASSIFIED`].

use std::sync::Arc;

use async_trait::async_trait;

use discoteca_core::model::{MetadataCandidate, Overrides};
use discoteca_core::provenance::{Resolved, Source};
use discoteca_core::taxonomy::UNCLASSIFIED;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::EnrichResult;
use crate::link::SourceLink;
use crate::ytdlp::{MediaTool, VideoInfo};

pub mod artist;
pub mod genre;
pub mod keywords;
pub mod pattern;
pub mod title;
pub mod year;

pub use keywords::KeywordTable;

/// One way of resolving a field.
///
/// `Ok(None)` means "nothing to offer, try the next source"; `Err` means
/// the source itself failed and is reported as degraded.
#[async_trait]
pub trait Strategy<T: Send>: Send + Sync + std::fmt::Debug {
    /// Provenance attached to values this strategy produces.
    fn source(&self) -> Source;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        self.source().as_str()
    }

    async fn attempt(&self, ctx: &ResolveContext) -> EnrichResult<Option<T>>;
}

/// A boxed strategy chain for one field.
pub type Chain<T> = Vec<Box<dyn Strategy<T>>>;

/// Tags already present in a file being imported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbeddedTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
}

/// Everything the strategies may look at.
///
/// `artist` and `title` start empty and are filled in once those fields
/// resolve, so the year and genre chains can use them.
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    pub source_url: String,
    pub video_id: Option<String>,
    pub info: Option<VideoInfo>,
    pub embedded: EmbeddedTags,
    /// The upload title, or the file name for imports.
    pub raw_title: String,
    pub overrides: Overrides,
    pub artist: Option<String>,
    pub title: String,
}

impl ResolveContext {
    /// Context for a platform download.
    pub fn for_download(link: &SourceLink, info: Option<VideoInfo>, overrides: Overrides) -> Self {
        let video_id = link
            .video_id()
            .map(str::to_string)
            .or_else(|| info.as_ref().and_then(|i| i.id.clone()));
        let raw_title = info.as_ref().map(|i| i.title.trim().to_string()).unwrap_or_default();
        Self {
            source_url: link.as_str().to_string(),
            video_id,
            info,
            raw_title,
            overrides,
            ..Self::default()
        }
    }

    /// Context for a local file being imported.
    pub fn for_import(
        source_url: String,
        file_stem: &str,
        embedded: EmbeddedTags,
        overrides: Overrides,
    ) -> Self {
        Self {
            source_url,
            embedded,
            raw_title: file_stem.trim().to_string(),
            overrides,
            ..Self::default()
        }
    }

    /// The platform description, if any.
    pub fn description(&self) -> Option<&str> {
        self.info.as_ref().and_then(|i| i.description.as_deref())
    }
}

/// Run a chain and return the first value offered.
pub async fn resolve_field<T: Send>(
    field: &str,
    chain: &[Box<dyn Strategy<T>>],
    ctx: &ResolveContext,
) -> Option<Resolved<T>> {
    for strategy in chain {
        match strategy.attempt(ctx).await {
            Ok(Some(value)) => {
                log::debug!("Resolved {} from {}", field, strategy.name());
                return Some(Resolved::new(value, strategy.source()));
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("{} source {} degraded: {}", field, strategy.name(), e);
            }
        }
    }
    None
}

/// Produces a [`MetadataCandidate`] for a URL or a local file.
#[derive(Debug)]
pub struct MetadataResolver {
    tool: Arc<dyn MediaTool>,
    artist: Chain<String>,
    title: Chain<String>,
    year: Chain<i32>,
    genre: Chain<String>,
}

impl MetadataResolver {
    /// Build the standard chains from configuration.
    ///
    /// Sources whose client cannot be built are left out of the chain.
    pub fn new(config: &Config, tool: Arc<dyn MediaTool>, catalog: Arc<Catalog>) -> Self {
        Self {
            tool,
            artist: artist::chain(),
            title: title::chain(),
            year: year::chain(),
            genre: genre::chain(config, catalog),
        }
    }

    /// Replace the genre chain.
    #[must_use]
    pub fn with_genre_chain(mut self, genre: Chain<String>) -> Self {
        self.genre = genre;
        self
    }

    /// Resolve metadata for a download.
    ///
    /// A failure to fetch platform metadata degrades to resolving from the
    /// URL and overrides alone.
    pub async fn resolve(&self, link: &SourceLink, overrides: &Overrides) -> MetadataCandidate {
        let info = match self.tool.fetch_info(link.as_str()).await {
            Ok(info) => Some(info),
            Err(e) => {
                log::warn!("platform metadata for {} degraded: {}", link, e);
                None
            }
        };
        self.resolve_context(ResolveContext::for_download(link, info, overrides.clone()))
            .await
    }

    /// Resolve metadata from a prepared context.
    pub async fn resolve_context(&self, mut ctx: ResolveContext) -> MetadataCandidate {
        let artist = resolve_field("artist", &self.artist, &ctx).await;
        let title = resolve_field("title", &self.title, &ctx)
            .await
            .unwrap_or_else(|| Resolved::new(fallback_title(&ctx), Source::Sentinel));

        ctx.artist = artist.as_ref().map(|a| a.value.clone());
        ctx.title = title.value.clone();

        let year = resolve_field("year", &self.year, &ctx).await;
        let genre = resolve_field("genre", &self.genre, &ctx)
            .await
            .unwrap_or_else(|| Resolved::new(UNCLASSIFIED.to_string(), Source::Sentinel));

        let info = ctx.info.as_ref();
        let candidate = MetadataCandidate {
            source_url: ctx.source_url.clone(),
            video_id: ctx.video_id.clone(),
            title,
            artist,
            year,
            genre,
            duration_secs: info.and_then(|i| i.duration),
            thumbnail_url: info.and_then(VideoInfo::cover_url),
            description: info.and_then(|i| i.description.clone()),
        };

        log::info!(
            "Resolved {} [{} / {}]",
            candidate.display_name(),
            candidate.genre(),
            candidate.decade()
        );
        candidate
    }
}

fn fallback_title(ctx: &ResolveContext) -> String {
    if !ctx.raw_title.is_empty() {
        return ctx.raw_title.clone();
    }
    ctx.video_id.clone().unwrap_or_else(|| "Untitled".to_string())
}
