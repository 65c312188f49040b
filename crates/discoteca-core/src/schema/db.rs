use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::model::{DownloadSource, SongId, SongRecord};
use crate::taxonomy::UNCLASSIFIED;

use super::migrations::MIGRATIONS;
use super::query::{CatalogStats, SongFilter};

const SONG_COLUMNS: &str = "id, source_url, video_id, title, artist, year, genre, decade,
    file_path, file_size, duration_secs, content_fingerprint, thumbnail_url,
    description, download_source, created_at";

/// A connection to the song catalog.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a catalog at the given path and apply migrations.
    ///
    /// File-backed catalogs use WAL journaling so readers in other
    /// connections never see a half-written row.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        log::debug!("Catalog journal mode: {}", mode);
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Open an extra connection to an existing catalog for reads only.
    ///
    /// Migrations are not applied; the catalog must already have been
    /// opened with [`Database::open`].
    pub fn open_reader(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self { conn })
    }

    /// Open an in-memory catalog (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for migration in MIGRATIONS {
            if applied.contains(&migration.version) {
                continue;
            }
            log::info!(
                "Applying migration {} ({})",
                migration.version,
                migration.name
            );
            let tx = self.conn.unchecked_transaction()?;
            tx.execute_batch(migration.sql)?;
            tx.execute(
                "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                rusqlite::params![migration.version, migration.name],
            )?;
            tx.commit()?;
        }

        Ok(())
    }
}

// Song writes
impl Database {
    /// Insert a new song.
    ///
    /// Fails with [`Error::Duplicate`] when another row already holds the
    /// same content fingerprint or file path.
    pub fn insert_song(&self, song: &SongRecord) -> Result<()> {
        if song.file_path.as_os_str().is_empty() {
            return Err(Error::InvalidData(format!(
                "song {} has an empty file path",
                song.id
            )));
        }

        let result = self.conn.execute(
            &format!(
                "INSERT INTO songs ({SONG_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
            ),
            rusqlite::params![
                song.id.to_string(),
                song.source_url,
                song.video_id,
                song.title,
                song.artist,
                song.year.map(i64::from),
                song.genre,
                song.decade().to_string(),
                song.file_path.to_string_lossy().as_ref(),
                i64::try_from(song.file_size).unwrap_or(i64::MAX),
                song.duration_secs,
                song.content_fingerprint,
                song.thumbnail_url,
                song.description,
                song.download_source.as_str(),
                song.created_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, message))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                let message = message.unwrap_or_default();
                if message.contains("content_fingerprint") {
                    Err(Error::Duplicate {
                        field: "content_fingerprint",
                        value: song.content_fingerprint.clone(),
                    })
                } else if message.contains("file_path") {
                    Err(Error::Duplicate {
                        field: "file_path",
                        value: song.file_path.display().to_string(),
                    })
                } else {
                    Err(Error::InvalidData(message))
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

// Song reads
impl Database {
    /// Get a song by id.
    pub fn get_song(&self, id: &SongId) -> Result<Option<SongRecord>> {
        self.query_one("id = ?1", &id.to_string())
    }

    /// Find the song holding a content fingerprint, if any.
    pub fn find_by_fingerprint(&self, fingerprint: &str) -> Result<Option<SongRecord>> {
        self.query_one("content_fingerprint = ?1", fingerprint)
    }

    /// Find the most recent song downloaded from a platform video id.
    pub fn find_by_video_id(&self, video_id: &str) -> Result<Option<SongRecord>> {
        self.query_one("video_id = ?1 ORDER BY created_at DESC LIMIT 1", video_id)
    }

    /// Whether a row already claims this file path, whether or not the
    /// file is still on disk.
    pub fn file_path_in_use(&self, path: &Path) -> Result<bool> {
        let in_use = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM songs WHERE file_path = ?1)",
            [path.to_string_lossy().as_ref()],
            |row| row.get(0),
        )?;
        Ok(in_use)
    }

    /// Search songs, newest first.
    pub fn search(&self, filter: &SongFilter) -> Result<Vec<SongRecord>> {
        let (clause, params) = filter.to_sql();
        let mut sql = format!("SELECT {SONG_COLUMNS} FROM songs{clause} ORDER BY created_at DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let songs = stmt
            .query_map(rusqlite::params_from_iter(params.iter()), row_to_song)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(songs)
    }

    /// Aggregate counts by genre and decade.
    ///
    /// All queries run inside one read transaction so the counts agree
    /// with each other even while a writer is active.
    pub fn stats(&self) -> Result<CatalogStats> {
        let tx = self.conn.unchecked_transaction()?;

        let total_songs: i64 = tx.query_row("SELECT COUNT(*) FROM songs", [], |row| row.get(0))?;
        let total_size: i64 = tx.query_row(
            "SELECT COALESCE(SUM(file_size), 0) FROM songs",
            [],
            |row| row.get(0),
        )?;

        let by_genre = grouped_counts(
            &tx,
            "SELECT genre, COUNT(*) AS n FROM songs GROUP BY genre ORDER BY n DESC, genre",
        )?;
        let by_decade = grouped_counts(
            &tx,
            "SELECT decade, COUNT(*) FROM songs GROUP BY decade
             ORDER BY decade = 'Unknown', decade DESC",
        )?;

        tx.commit()?;

        Ok(CatalogStats {
            total_songs: u64::try_from(total_songs).unwrap_or(0),
            total_size_bytes: u64::try_from(total_size).unwrap_or(0),
            by_genre,
            by_decade,
        })
    }

    /// The genre an artist is most often filed under, ignoring the
    /// unclassified folder. Ties go to the most recently added genre.
    pub fn most_common_genre_for_artist(&self, artist: &str) -> Result<Option<String>> {
        let genre = self
            .conn
            .query_row(
                "SELECT genre FROM songs
                 WHERE artist = ?1 COLLATE NOCASE AND genre <> ?2
                 GROUP BY genre
                 ORDER BY COUNT(*) DESC, MAX(created_at) DESC
                 LIMIT 1",
                rusqlite::params![artist, UNCLASSIFIED],
                |row| row.get(0),
            )
            .optional()?;
        Ok(genre)
    }

    /// Number of songs in the catalog.
    pub fn count_songs(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM songs", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn query_one(&self, condition: &str, param: &str) -> Result<Option<SongRecord>> {
        let song = self
            .conn
            .query_row(
                &format!("SELECT {SONG_COLUMNS} FROM songs WHERE {condition}"),
                [param],
                row_to_song,
            )
            .optional()?;
        Ok(song)
    }
}

fn grouped_counts(conn: &Connection, sql: &str) -> Result<Vec<(String, u64)>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], |row| {
            let key: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((key, u64::try_from(count).unwrap_or(0)))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn row_to_song(row: &rusqlite::Row) -> rusqlite::Result<SongRecord> {
    let id: String = row.get(0)?;
    let file_path: String = row.get(8)?;
    let file_size: i64 = row.get(9)?;
    let download_source: String = row.get(14)?;
    let created_at: String = row.get(15)?;

    Ok(SongRecord {
        id: id.parse::<SongId>().map_err(|e| conversion_error(0, e))?,
        source_url: row.get(1)?,
        video_id: row.get(2)?,
        title: row.get(3)?,
        artist: row.get(4)?,
        year: row
            .get::<_, Option<i64>>(5)?
            .and_then(|y| i32::try_from(y).ok()),
        genre: row.get(6)?,
        file_path: PathBuf::from(file_path),
        file_size: u64::try_from(file_size).unwrap_or(0),
        duration_secs: row.get(10)?,
        content_fingerprint: row.get(11)?,
        thumbnail_url: row.get(12)?,
        description: row.get(13)?,
        download_source: DownloadSource::parse(&download_source).ok_or_else(|| {
            conversion_error(
                14,
                Error::InvalidData(format!("unknown download source: {download_source}")),
            )
        })?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| conversion_error(15, e))?
            .with_timezone(&Utc),
    })
}
