//! Concurrency-safe access to the song catalog.
//!
//! Writers take [`Catalog::write`], which holds the single writer lock for
//! as long as the returned [`CatalogWriter`] lives. The Organizer keeps it
//! across "check fingerprint, move file, insert record" so two downloads of
//! the same audio can never both pass the duplicate check. Reads on a
//! file-backed catalog each check out a read-only connection from a small
//! idle pool, so searches and stats neither wait on a writer nor on each
//! other; SQLite's WAL journal guarantees a reader sees a row either
//! completely or not at all.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use discoteca_core::model::SongRecord;
use discoteca_core::schema::{CatalogStats, Database, SongFilter};
use discoteca_core::{Error, Result};

/// Idle read connections kept open between reads.
const MAX_IDLE_READERS: usize = 4;

/// The persistent song catalog.
#[derive(Debug)]
pub struct Catalog {
    writer: Mutex<Database>,
    /// `None` for in-memory catalogs, whose reads share the writer.
    path: Option<PathBuf>,
    readers: Mutex<Vec<Database>>,
}

/// Exclusive write access to the catalog.
#[derive(Debug)]
pub struct CatalogWriter<'a> {
    db: MutexGuard<'a, Database>,
}

impl Catalog {
    /// Open (or create) a file-backed catalog.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let writer = Database::open(path)?;
        log::debug!("Opened catalog at {}", path.display());
        Ok(Self {
            writer: Mutex::new(writer),
            path: Some(path.to_path_buf()),
            readers: Mutex::new(Vec::new()),
        })
    }

    /// Open an in-memory catalog (for tests). Reads share the writer's
    /// connection.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            writer: Mutex::new(Database::open_in_memory()?),
            path: None,
            readers: Mutex::new(Vec::new()),
        })
    }

    /// Take the writer lock.
    pub fn write(&self) -> Result<CatalogWriter<'_>> {
        Ok(CatalogWriter {
            db: lock(&self.writer)?,
        })
    }

    fn read<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let Some(path) = &self.path else {
            let writer = lock(&self.writer)?;
            return f(&writer);
        };

        let idle = lock(&self.readers)?.pop();
        let db = match idle {
            Some(db) => db,
            None => Database::open_reader(path)?,
        };
        let result = f(&db);

        let mut readers = lock(&self.readers)?;
        if readers.len() < MAX_IDLE_READERS {
            readers.push(db);
        }
        result
    }

    pub fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<SongRecord>> {
        self.read(|db| db.find_by_fingerprint(fingerprint))
    }

    pub fn find_by_video_id(&self, video_id: &str) -> Result<Option<SongRecord>> {
        self.read(|db| db.find_by_video_id(video_id))
    }

    pub fn search(&self, filter: &SongFilter) -> Result<Vec<SongRecord>> {
        self.read(|db| db.search(filter))
    }

    pub fn stats(&self) -> Result<CatalogStats> {
        self.read(Database::stats)
    }

    pub fn most_common_genre_for_artist(&self, artist: &str) -> Result<Option<String>> {
        self.read(|db| db.most_common_genre_for_artist(artist))
    }

    pub fn count(&self) -> Result<u64> {
        self.read(Database::count_songs)
    }
}

impl CatalogWriter<'_> {
    pub fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<SongRecord>> {
        self.db.find_by_fingerprint(fingerprint)
    }

    /// Whether a catalogued song already claims `path`, even if the file
    /// itself has since been deleted.
    pub fn file_path_in_use(&self, path: &Path) -> Result<bool> {
        self.db.file_path_in_use(path)
    }

    /// Insert a record. Callers must have checked the fingerprint under
    /// this same writer.
    pub fn insert(&self, record: &SongRecord) -> Result<()> {
        self.db.insert_song(record)?;
        log::info!("Catalogued {} ({})", record.title, record.id);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| Error::InvalidData("catalog lock poisoned".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use discoteca_core::model::{DownloadSource, MetadataCandidate};
    use discoteca_core::provenance::{Resolved, Source};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn record(title: &str) -> SongRecord {
        let candidate = MetadataCandidate::untitled(
            "https://www.youtube.com/watch?v=x",
            Resolved::new(title.to_string(), Source::Platform),
        );
        SongRecord::from_candidate(
            &candidate,
            PathBuf::from(format!("/music/{title}.mp3")),
            1,
            format!("fp-{title}"),
            DownloadSource::Download,
        )
    }

    #[test]
    fn test_file_backed_reader_sees_committed_writes() {
        let dir = tempfile::TempDir::new().unwrap();
        let catalog = Catalog::open(dir.path().join("nested").join("catalog.db")).unwrap();

        catalog.write().unwrap().insert(&record("A")).unwrap();
        assert_eq!(catalog.count().unwrap(), 1);
        assert!(catalog.find_by_fingerprint("fp-A").unwrap().is_some());
    }

    #[test]
    fn test_reads_do_not_wait_for_writer() {
        let dir = tempfile::TempDir::new().unwrap();
        let catalog = Catalog::open(dir.path().join("catalog.db")).unwrap();
        catalog.write().unwrap().insert(&record("A")).unwrap();

        let writer = catalog.write().unwrap();
        writer.insert(&record("B")).unwrap();
        // Reads proceed while the writer lock is still held.
        assert_eq!(catalog.stats().unwrap().total_songs, 2);
        drop(writer);
    }

    #[test]
    fn test_reads_do_not_wait_for_each_other() {
        let dir = tempfile::TempDir::new().unwrap();
        let catalog = Catalog::open(dir.path().join("catalog.db")).unwrap();
        catalog.write().unwrap().insert(&record("A")).unwrap();

        // A second read on another thread completes while the first one is
        // still holding its connection.
        let inner = catalog
            .read(|_| Ok(std::thread::scope(|s| s.spawn(|| catalog.count()).join().unwrap())))
            .unwrap();
        assert_eq!(inner.unwrap(), 1);
    }

    #[test]
    fn test_idle_readers_are_bounded() {
        let dir = tempfile::TempDir::new().unwrap();
        let catalog = Arc::new(Catalog::open(dir.path().join("catalog.db")).unwrap());
        catalog.write().unwrap().insert(&record("A")).unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let catalog = Arc::clone(&catalog);
                std::thread::spawn(move || catalog.search(&SongFilter::new()).unwrap().len())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }

        let idle = catalog.readers.lock().unwrap().len();
        assert!((1..=MAX_IDLE_READERS).contains(&idle));
    }

    #[test]
    fn test_writer_reports_claimed_file_paths() {
        let catalog = Catalog::open_in_memory().unwrap();
        let song = record("A");
        let writer = catalog.write().unwrap();
        writer.insert(&song).unwrap();
        assert!(writer.file_path_in_use(&song.file_path).unwrap());
        assert!(!writer.file_path_in_use(Path::new("/music/B.mp3")).unwrap());
    }

    #[test]
    fn test_concurrent_writers_are_serialized() {
        let dir = tempfile::TempDir::new().unwrap();
        let catalog = Arc::new(Catalog::open(dir.path().join("catalog.db")).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let catalog = Arc::clone(&catalog);
                std::thread::spawn(move || {
                    let writer = catalog.write().unwrap();
                    // Everyone tries to insert the same audio.
                    if writer.find_by_fingerprint("fp-same").unwrap().is_none() {
                        let mut song = record("same");
                        song.file_path = PathBuf::from(format!("/music/same-{i}.mp3"));
                        writer.insert(&song).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(catalog.count().unwrap(), 1);
    }
}
