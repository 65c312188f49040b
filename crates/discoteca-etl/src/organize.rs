//! Organizer: fingerprint, dedupe, move into the genre/decade tree, catalog.
//!
//! Layout under the music root:
//!
//! ```text
//! <root>/<genre>/<decade>/<Artist - Title>.mp3
//! <root>/<genre>/Unknown/<Title>.mp3          year unknown
//! <root>/Sin Clasificar/Unknown/<Title>.mp3   genre unknown
//! ```
//!
//! The fingerprint check, the move and the catalog insert all happen while
//! holding the catalog writer, so two requests carrying the same content
//! cannot both be stored.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use discoteca_core::model::{DownloadSource, MetadataCandidate, SongRecord};
use discoteca_core::taxonomy::{is_unclassified, Decade, UNCLASSIFIED};

use crate::audio::content_fingerprint;
use crate::catalog::Catalog;
use crate::error::OrganizeError;

/// Where a file ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// Moved into the library and catalogued.
    Stored(SongRecord),
    /// Same content was already catalogued; the new file was discarded.
    Duplicate(SongRecord),
}

#[derive(Debug)]
pub struct Organizer {
    music_root: PathBuf,
    catalog: Arc<Catalog>,
}

impl Organizer {
    pub fn new(music_root: impl Into<PathBuf>, catalog: Arc<Catalog>) -> Self {
        let music_root = music_root.into();
        let music_root = std::path::absolute(&music_root).unwrap_or(music_root);
        Self { music_root, catalog }
    }

    pub fn music_root(&self) -> &Path {
        &self.music_root
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Place a tagged file into the library.
    ///
    /// On any error the file stays where it was.
    pub fn place(
        &self,
        tagged: &Path,
        candidate: &MetadataCandidate,
        download_source: DownloadSource,
    ) -> Result<Placement, OrganizeError> {
        let fingerprint = content_fingerprint(tagged, candidate.duration_secs, candidate.title());

        let writer = self.catalog.write()?;

        if let Some(existing) = writer.find_by_fingerprint(&fingerprint)? {
            log::info!(
                "Duplicate of {} ({}), discarding new file",
                existing.title,
                existing.file_path.display()
            );
            discard(tagged);
            return Ok(Placement::Duplicate(existing));
        }

        let dir = destination_dir(&self.music_root, candidate);
        fs::create_dir_all(&dir).map_err(|e| OrganizeError::io("create directory", &dir, e))?;

        let extension = tagged
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp3")
            .to_lowercase();
        // A catalogued file may have been deleted from disk; its path is
        // still claimed by the row.
        let destination = unique_path(&dir, &file_name(candidate, &extension), |path| {
            Ok::<_, OrganizeError>(path.exists() || writer.file_path_in_use(path)?)
        })?;

        move_file(tagged, &destination)?;

        let file_size = match fs::metadata(&destination) {
            Ok(meta) => meta.len(),
            Err(e) => {
                restore(&destination, tagged);
                return Err(OrganizeError::io("stat", &destination, e));
            }
        };

        let record = SongRecord::from_candidate(
            candidate,
            destination.clone(),
            file_size,
            fingerprint.clone(),
            download_source,
        );

        if let Err(e) = writer.insert(&record) {
            restore(&destination, tagged);
            if e.is_constraint_violation() {
                if let Some(existing) = writer.find_by_fingerprint(&fingerprint)? {
                    discard(tagged);
                    return Ok(Placement::Duplicate(existing));
                }
            }
            return Err(e.into());
        }

        log::info!("Stored {} at {}", candidate.display_name(), destination.display());
        Ok(Placement::Stored(record))
    }
}

/// The folder a song belongs in.
pub fn destination_dir(root: &Path, candidate: &MetadataCandidate) -> PathBuf {
    let genre = candidate.genre();
    if is_unclassified(genre) {
        return root.join(UNCLASSIFIED).join(Decade::Unknown.to_string());
    }
    let genre_dir = sanitize(genre);
    let genre_dir = if genre_dir.is_empty() {
        UNCLASSIFIED.to_string()
    } else {
        genre_dir
    };
    root.join(genre_dir).join(candidate.decade().to_string())
}

/// `"Artist - Title.ext"`, or `"Title.ext"` without an artist.
pub fn file_name(candidate: &MetadataCandidate, extension: &str) -> String {
    let stem = sanitize(&candidate.display_name());
    let stem = if stem.is_empty() { "Untitled".to_string() } else { stem };
    format!("{stem}.{extension}")
}

/// `dir/name`, or `dir/stem (N).ext` for the first N that `taken` rejects.
pub fn unique_path<E>(
    dir: &Path,
    name: &str,
    mut taken: impl FnMut(&Path) -> Result<bool, E>,
) -> Result<PathBuf, E> {
    let candidate = dir.join(name);
    if !taken(&candidate)? {
        return Ok(candidate);
    }

    let path = Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    let extension = path.extension().and_then(|e| e.to_str());

    for n in 2.. {
        let numbered = match extension {
            Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
            None => dir.join(format!("{stem} ({n})")),
        };
        if !taken(&numbered)? {
            return Ok(numbered);
        }
    }
    Ok(candidate)
}

fn sanitize(name: &str) -> String {
    let options = sanitize_filename::Options {
        truncate: true,
        windows: true,
        replacement: "",
    };
    sanitize_filename::sanitize_with_options(name, options)
        .trim()
        .trim_end_matches('.')
        .to_string()
}

/// Rename, or copy and remove when the rename crosses filesystems.
fn move_file(from: &Path, to: &Path) -> Result<(), OrganizeError> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    if let Err(e) = fs::copy(from, to) {
        if to.exists() {
            if let Err(cleanup) = fs::remove_file(to) {
                log::warn!("Could not remove partial copy {}: {}", to.display(), cleanup);
            }
        }
        return Err(OrganizeError::io("copy", to, e));
    }
    if let Err(e) = fs::remove_file(from) {
        log::warn!("Could not remove {} after copy: {}", from.display(), e);
    }
    Ok(())
}

fn restore(placed: &Path, original: &Path) {
    if let Err(e) = move_file(placed, original) {
        log::warn!(
            "Could not move {} back to {}: {}",
            placed.display(),
            original.display(),
            e
        );
    }
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        log::warn!("Could not remove duplicate {}: {}", path.display(), e);
    }
}
