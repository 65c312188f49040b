//! The discoteca pipeline.
//!
//! A URL goes through four stages: the [`MetadataResolver`] picks artist,
//! title, year and genre from a chain of sources; the [`DownloadExecutor`]
//! fetches the audio with yt-dlp; the [`Tagger`] writes the metadata into
//! the file; the [`Organizer`] fingerprints it, rejects duplicates and files
//! it under `<genre>/<decade>/` before recording it in the [`Catalog`].
//! [`Pipeline`] wires the stages together from a [`Config`].

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod audio;
pub mod catalog;
pub mod config;
pub mod download;
pub mod enrich;
pub mod error;
pub mod import;
pub mod link;
pub mod organize;
pub mod pipeline;
pub mod resolve;
pub mod tag;
pub mod ytdlp;

pub use catalog::Catalog;
pub use config::Config;
pub use download::{DownloadExecutor, RawAudio};
pub use error::{
    DownloadError, EnrichError, EnrichResult, ImportError, OrganizeError, PipelineError, TagError,
};
pub use import::{ImportSummary, Importer};
pub use link::SourceLink;
pub use organize::{Organizer, Placement};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use resolve::{EmbeddedTags, MetadataResolver, ResolveContext};
pub use tag::Tagger;
pub use ytdlp::{MediaTool, VideoInfo, YtDlp};
