//! Tagger: writes resolved metadata into the audio file.
//!
//! Title, artist, year and genre go into the file's primary tag (ID3v2 for
//! MP3 and WAV). A cover image, when the platform offers one, is fetched
//! once and stored as the front cover. Existing values for these fields are
//! replaced rather than appended, so tagging the same file twice with the
//! same metadata yields the same tag.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::config::WriteOptions;
use lofty::file::{AudioFile, FileType, TaggedFileExt};
use lofty::picture::{Picture, PictureType};
use lofty::probe::Probe;
use lofty::tag::{Accessor, Tag, TagExt, TagType};
use reqwest::Client;

use discoteca_core::model::MetadataCandidate;

use crate::enrich::{http_client, USER_AGENT};
use crate::error::TagError;
use crate::resolve::EmbeddedTags;

/// Writes tags and cover art.
#[derive(Debug, Clone)]
pub struct Tagger {
    http: Option<Client>,
}

impl Tagger {
    /// A tagger that embeds cover art when `embed_cover` is set.
    pub fn new(embed_cover: bool) -> Self {
        let http = if embed_cover {
            http_client(USER_AGENT, Duration::from_secs(15))
                .map_err(|e| log::warn!("Cover art disabled: {}", e))
                .ok()
        } else {
            None
        };
        Self { http }
    }

    /// Tag `path` in place with `candidate` and return the tagged path.
    ///
    /// A cover that cannot be fetched is skipped; only failures to read or
    /// write the file itself are errors.
    pub async fn apply(&self, path: &Path, candidate: &MetadataCandidate) -> Result<PathBuf, TagError> {
        let cover = match (&self.http, &candidate.thumbnail_url) {
            (Some(http), Some(url)) => fetch_cover(http, url).await,
            _ => None,
        };

        let owned_path = path.to_path_buf();
        let candidate = candidate.clone();
        tokio::task::spawn_blocking(move || {
            write_tags(&owned_path, &candidate, cover.as_deref()).map(|()| owned_path)
        })
        .await
        .map_err(|e| TagError::Task(e.to_string()))?
    }
}

async fn fetch_cover(http: &Client, url: &str) -> Option<Vec<u8>> {
    let result = async {
        let response = http.get(url).send().await?.error_for_status()?;
        response.bytes().await
    }
    .await;

    match result {
        Ok(bytes) if !bytes.is_empty() => Some(bytes.to_vec()),
        Ok(_) => None,
        Err(e) => {
            log::warn!("Cover art from {} skipped: {}", url, e);
            None
        }
    }
}

/// The tag type a file's metadata belongs in.
fn tag_type_for(file_type: FileType) -> TagType {
    match file_type {
        FileType::Wav => TagType::Id3v2,
        other => other.primary_tag_type(),
    }
}

/// Write metadata (and optional cover image bytes) into `path`.
pub fn write_tags(path: &Path, candidate: &MetadataCandidate, cover: Option<&[u8]>) -> Result<(), TagError> {
    let mut tagged_file = Probe::open(path)
        .map_err(|e| read_error(path, e))?
        .guess_file_type()
        .map_err(|e| read_error(path, e))?
        .read()
        .map_err(|e| read_error(path, e))?;

    let tag_type = tag_type_for(tagged_file.file_type());
    if tagged_file.tag(tag_type).is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let tag = tagged_file
        .tag_mut(tag_type)
        .ok_or_else(|| TagError::Unsupported {
            path: path.to_path_buf(),
            message: format!("file does not support {tag_type:?} tags"),
        })?;

    tag.set_title(candidate.title().to_string());
    match candidate.artist() {
        Some(artist) => tag.set_artist(artist.to_string()),
        None => tag.remove_artist(),
    }
    match candidate.year().and_then(|y| u32::try_from(y).ok()) {
        Some(year) => tag.set_year(year),
        None => tag.remove_year(),
    }
    tag.set_genre(candidate.genre().to_string());

    if let Some(data) = cover {
        match Picture::from_reader(&mut Cursor::new(data)) {
            Ok(mut picture) => {
                picture.set_pic_type(PictureType::CoverFront);
                tag.remove_picture_type(PictureType::CoverFront);
                tag.push_picture(picture);
            }
            Err(e) => log::warn!("Cover image for {} not embedded: {}", path.display(), e),
        }
    }

    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| TagError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    log::debug!("Tagged {} as {}", path.display(), candidate.display_name());
    Ok(())
}

/// Read title, artist, year and genre already in a file, plus its
/// duration in seconds.
pub fn read_tags(path: &Path) -> Result<(EmbeddedTags, f64), TagError> {
    let tagged_file = Probe::open(path)
        .map_err(|e| read_error(path, e))?
        .guess_file_type()
        .map_err(|e| read_error(path, e))?
        .read()
        .map_err(|e| read_error(path, e))?;

    let duration = tagged_file.properties().duration().as_secs_f64();
    let tag = tagged_file
        .tag(tag_type_for(tagged_file.file_type()))
        .or_else(|| tagged_file.first_tag());

    let embedded = tag.map_or_else(EmbeddedTags::default, |tag| EmbeddedTags {
        title: tag.title().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        artist: tag.artist().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        year: tag.year().and_then(|y| i32::try_from(y).ok()),
        genre: tag.genre().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
    });

    Ok((embedded, duration))
}

fn read_error(path: &Path, err: impl std::fmt::Display) -> TagError {
    TagError::Read {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
