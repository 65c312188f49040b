/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
-- Songs: one row per organized audio file
CREATE TABLE IF NOT EXISTS songs (
    id TEXT PRIMARY KEY,
    source_url TEXT NOT NULL,
    video_id TEXT,
    title TEXT NOT NULL,
    artist TEXT,
    year INTEGER,
    genre TEXT NOT NULL,
    decade TEXT NOT NULL,
    file_path TEXT NOT NULL UNIQUE,
    file_size INTEGER NOT NULL,
    duration_secs REAL,
    content_fingerprint TEXT NOT NULL UNIQUE,
    thumbnail_url TEXT,
    description TEXT,
    download_source TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_songs_video_id ON songs(video_id);
CREATE INDEX IF NOT EXISTS idx_songs_artist ON songs(artist);
CREATE INDEX IF NOT EXISTS idx_songs_genre ON songs(genre);
CREATE INDEX IF NOT EXISTS idx_songs_decade ON songs(decade);
CREATE INDEX IF NOT EXISTS idx_songs_created_at ON songs(created_at);
"#;

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "songs",
    sql: MIGRATION_001,
}];
