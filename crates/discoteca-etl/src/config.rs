use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Unprefixed variables honoured for compatibility with older setups.
const LEGACY_MUSIC_FOLDER: &str = "MUSIC_FOLDER";
const LEGACY_DB_PATH: &str = "DB_PATH";
const LEGACY_LASTFM_API_KEY: &str = "LASTFM_API_KEY";

/// Configuration for discoteca.
///
/// Built once at process start and passed by reference to every component.
/// Sources, highest priority first:
/// 1. CLI arguments
/// 2. Legacy variables (`MUSIC_FOLDER`, `DB_PATH`, `LASTFM_API_KEY`)
/// 3. Environment variables (`DISCOTECA_*` prefix)
/// 4. Config file (~/.config/discoteca/config.toml)
/// 5. Built-in defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the genre/decade library tree.
    ///
    /// Can be set via:
    /// - CLI: --music-folder /path
    /// - ENV: MUSIC_FOLDER or DISCOTECA_MUSIC_FOLDER
    /// - Config: music_folder = "/path"
    /// - Default: the user's Music directory
    pub music_folder: PathBuf,

    /// Path to the SQLite catalog.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: DB_PATH or DISCOTECA_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    /// - Default: ~/.discoteca.db
    pub database_path: PathBuf,

    /// Where raw downloads live until they are organized.
    pub scratch_dir: PathBuf,

    /// Last.fm API key. When absent the Last.fm genre source is skipped.
    ///
    /// Can be set via:
    /// - ENV: LASTFM_API_KEY or DISCOTECA_LASTFM_API_KEY
    /// - Config: lastfm_api_key = "..."
    pub lastfm_api_key: Option<String>,

    /// yt-dlp executable name or path.
    pub ytdlp_path: String,

    /// Netscape-format cookies file handed to yt-dlp for restricted videos.
    pub cookies_file: Option<PathBuf>,

    /// Query MusicBrainz recording tags for the genre.
    pub musicbrainz_lookup: bool,

    /// Fall back to a web search for the genre.
    pub web_search: bool,

    /// Embed the video thumbnail as front cover art.
    pub embed_cover: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            music_folder: default_music_folder(),
            database_path: default_db_path(),
            scratch_dir: default_scratch_dir(),
            lastfm_api_key: None,
            ytdlp_path: "yt-dlp".to_string(),
            cookies_file: None,
            musicbrainz_lookup: true,
            web_search: true,
            embed_cover: true,
        }
    }
}

impl Config {
    /// Load configuration from the default config file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific config file and the environment.
    ///
    /// A missing file is not an error; defaults and environment apply.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("discoteca");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let mut config: Self = builder
            .build()
            .context("Failed to build configuration")?;

        config.apply_legacy_env(|name| std::env::var(name).ok());
        config.lastfm_api_key = config.lastfm_api_key.filter(|k| !k.trim().is_empty());

        Ok(config)
    }

    /// Apply the unprefixed legacy variables, looked up through `lookup`.
    pub fn apply_legacy_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(folder) = non_empty(LEGACY_MUSIC_FOLDER) {
            self.music_folder = PathBuf::from(folder);
        }
        if let Some(db) = non_empty(LEGACY_DB_PATH) {
            self.database_path = PathBuf::from(db);
        }
        if let Some(key) = non_empty(LEGACY_LASTFM_API_KEY) {
            self.lastfm_api_key = Some(key);
        }
    }

    /// Override the catalog path (the --db CLI flag).
    #[must_use]
    pub fn with_db_path(mut self, db_path: PathBuf) -> Self {
        self.database_path = db_path;
        self
    }

    /// Override the library root (the --music-folder CLI flag).
    #[must_use]
    pub fn with_music_folder(mut self, music_folder: PathBuf) -> Self {
        self.music_folder = music_folder;
        self
    }

    /// A configuration that never touches the network for metadata.
    ///
    /// Used by tests and the `--offline` flag.
    #[must_use]
    pub fn offline(mut self) -> Self {
        self.lastfm_api_key = None;
        self.musicbrainz_lookup = false;
        self.web_search = false;
        self.embed_cover = false;
        self
    }
}

/// Get the default library root: the platform Music directory, or ~/Music.
fn default_music_folder() -> PathBuf {
    dirs::audio_dir().unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Music")
    })
}

/// Get the default catalog path: a dotfile in the home directory.
fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".discoteca.db")
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("discoteca")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/discoteca/config.toml
/// - macOS: ~/Library/Application Support/discoteca/config.toml
/// - Windows: %APPDATA%\discoteca\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("discoteca")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Discoteca Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. MUSIC_FOLDER, DB_PATH and LASTFM_API_KEY environment variables
# 3. Environment variables (DISCOTECA_* prefix)
# 4. This config file
# 5. Built-in defaults (lowest priority)

# Root of the library. Songs are filed as <music_folder>/<Genre>/<Decade>/
#
# Default: your Music directory
#music_folder = "/home/me/Music"

# Path to the SQLite catalog
#
# Default: ~/.discoteca.db
#database_path = "/home/me/.discoteca.db"

# Scratch directory for downloads in progress
#scratch_dir = "/tmp/discoteca"

# Last.fm API key for genre lookup. Leave unset to skip Last.fm.
#
# Get one at: https://www.last.fm/api/account/create
#lastfm_api_key = "your-lastfm-api-key-here"

# yt-dlp executable
#ytdlp_path = "yt-dlp"

# Cookies file (Netscape format) for age- or region-restricted videos
#cookies_file = "/home/me/.config/discoteca/cookies.txt"

# Genre sources that need no API key
#musicbrainz_lookup = true
#web_search = true

# Embed the video thumbnail as cover art
#embed_cover = true
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
