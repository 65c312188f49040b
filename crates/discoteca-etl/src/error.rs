//! Error types for the download pipeline.
//!
//! Metadata lookups fail with [`EnrichError`], which the resolver turns
//! into a logged, non-fatal degradation. Every other stage has its own
//! error type, and [`PipelineError`] wraps them with the stage name for the
//! caller of [`Pipeline::run`](crate::Pipeline::run).

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by automated metadata sources.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// An HTTP request to an external source failed.
    #[error("HTTP error from {source_name}: {message}")]
    Http {
        source_name: String,
        message: String,
    },

    /// The external source returned a rate-limit response.
    #[error("rate limited by {source_name}")]
    RateLimited { source_name: String },

    /// The requested entity was not found at the external source.
    #[error("not found: {entity} at {source_name}")]
    NotFound { entity: String, source_name: String },

    /// A response from an external source could not be parsed.
    #[error("parse error from {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// An error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The local catalog could not be queried.
    #[error("catalog error: {0}")]
    Catalog(#[from] discoteca_core::Error),
}

impl EnrichError {
    pub(crate) fn http(source_name: &str, err: impl std::fmt::Display) -> Self {
        Self::Http {
            source_name: source_name.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn parse(source_name: &str, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            source_name: source_name.to_string(),
            message: err.to_string(),
        }
    }
}

/// Convenience alias for enrichment results.
pub type EnrichResult<T> = std::result::Result<T, EnrichError>;

/// Errors raised while fetching audio with the external media tool.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The media tool binary is not installed or not on `PATH`.
    #[error("media tool not found: {0}")]
    ToolNotFound(String),

    /// The URL could not be parsed.
    #[error("invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// The media tool ran and reported a failure.
    #[error("download failed: {0}")]
    Failed(String),

    /// The media tool exited cleanly but left no audio file behind.
    #[error("no audio file produced in {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while writing tags into an audio file.
#[derive(Debug, Error)]
pub enum TagError {
    /// The file could not be opened or its container is not recognized.
    #[error("cannot read {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    /// The container does not accept the tag type it should carry.
    #[error("unsupported tag container in {}: {message}", .path.display())]
    Unsupported { path: PathBuf, message: String },

    /// Writing the tag back to disk failed.
    #[error("cannot write tags to {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },

    /// The blocking tag writer task did not complete.
    #[error("tag writer task failed: {0}")]
    Task(String),
}

/// Errors raised while placing a tagged file into the library.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// A filesystem operation failed.
    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog refused or failed the insert.
    #[error("catalog error: {0}")]
    Catalog(#[from] discoteca_core::Error),

    /// The blocking organizer task did not complete.
    #[error("organizer task failed: {0}")]
    Task(String),
}

impl OrganizeError {
    pub(crate) fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Errors raised while importing one existing audio file.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Staging the file in scratch failed.
    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The path names a directory entry without a file name.
    #[error("{} has no file name", .0.display())]
    NoFileName(PathBuf),

    #[error(transparent)]
    Tag(#[from] TagError),

    #[error(transparent)]
    Organize(#[from] OrganizeError),

    /// The blocking tag reader task did not complete.
    #[error("tag reader task failed: {0}")]
    Task(String),
}

impl ImportError {
    pub(crate) fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Fatal pipeline errors, one per stage.
///
/// Tag and organize failures carry the path of the file left on disk so the
/// caller can recover the successful download.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("download failed: {0}")]
    DownloadFailed(#[source] DownloadError),

    #[error("tag write failed (file kept at {}): {source}", .path.display())]
    TagWriteFailed {
        path: PathBuf,
        #[source]
        source: TagError,
    },

    #[error("organize failed (file kept at {}): {source}", .path.display())]
    OrganizeFailed {
        path: PathBuf,
        #[source]
        source: OrganizeError,
    },
}

impl PipelineError {
    /// Name of the stage that failed.
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::DownloadFailed(_) => "download",
            Self::TagWriteFailed { .. } => "tag",
            Self::OrganizeFailed { .. } => "organize",
        }
    }

    /// The audio file left on disk by a failed run, if any.
    pub fn kept_file(&self) -> Option<&Path> {
        match self {
            Self::DownloadFailed(_) => None,
            Self::TagWriteFailed { path, .. } | Self::OrganizeFailed { path, .. } => Some(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_error_keeps_the_failed_stage() {
        let err: ImportError = TagError::Read {
            path: PathBuf::from("/in/broken.mp3"),
            message: "no frames".into(),
        }
        .into();
        assert!(matches!(err, ImportError::Tag(TagError::Read { .. })));
        assert_eq!(err.to_string(), "cannot read /in/broken.mp3: no frames");

        let err: ImportError = OrganizeError::Task("cancelled".into()).into();
        assert!(matches!(err, ImportError::Organize(OrganizeError::Task(_))));
    }

    #[test]
    fn test_pipeline_error_stage_and_kept_file() {
        let err = PipelineError::DownloadFailed(DownloadError::Failed("geo-blocked".into()));
        assert_eq!(err.stage(), "download");
        assert!(err.kept_file().is_none());
        assert!(err.to_string().contains("geo-blocked"));

        let err = PipelineError::TagWriteFailed {
            path: PathBuf::from("/tmp/raw.mp3"),
            source: TagError::Read {
                path: PathBuf::from("/tmp/raw.mp3"),
                message: "corrupt".into(),
            },
        };
        assert_eq!(err.stage(), "tag");
        assert_eq!(err.kept_file(), Some(Path::new("/tmp/raw.mp3")));
    }
}
