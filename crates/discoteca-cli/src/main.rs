use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use discoteca_core::model::Overrides;
use discoteca_core::schema::SongFilter;
use discoteca_core::taxonomy::Decade;
use discoteca_etl::Config;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "discoteca", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the catalog database (default: ~/.discoteca.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Root of the genre/decade library (default: your Music folder)
    #[arg(long, global = true)]
    music_folder: Option<PathBuf>,

    /// Skip every network lookup except the download itself
    #[arg(long, global = true)]
    offline: bool,
}

/// Values that take precedence over anything resolved automatically.
#[derive(Debug, Clone, clap::Args)]
struct OverrideArgs {
    /// Artist to use instead of the detected one
    #[arg(long)]
    artist: Option<String>,

    /// Release year to use instead of the detected one
    #[arg(long)]
    year: Option<i32>,

    /// Genre folder to use instead of the detected one
    #[arg(long)]
    genre: Option<String>,
}

impl OverrideArgs {
    fn into_overrides(self) -> Overrides {
        let mut overrides = Overrides::default();
        if let Some(artist) = self.artist {
            overrides = overrides.with_artist(artist);
        }
        if let Some(year) = self.year {
            overrides = overrides.with_year(year);
        }
        if let Some(genre) = self.genre {
            overrides = overrides.with_genre(genre);
        }
        overrides
    }
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Download audio from one or more URLs into the library
    ///
    /// For each URL:
    ///
    /// - Resolves artist, title, year and genre (overrides first, then
    ///   platform metadata, title patterns, Last.fm, MusicBrainz, your
    ///   catalog, keywords and web search)
    /// - Downloads the best audio as MP3 with yt-dlp
    /// - Writes the tags and cover art into the file
    /// - Files it under <music folder>/<genre>/<decade>/ and records it in
    ///   the catalog
    ///
    /// A URL whose audio is already in the catalog is reported as a
    /// duplicate and nothing changes. Requires yt-dlp (and ffmpeg) on PATH.
    Download {
        /// Video URLs
        #[arg(required = true)]
        urls: Vec<String>,

        #[command(flatten)]
        overrides: OverrideArgs,
    },
    /// Import existing audio files from a directory
    ///
    /// Files are copied, never moved or modified. Existing tags and
    /// "Artist - Title" file names are used for the metadata.
    Import {
        /// Directory to import from
        path: PathBuf,

        #[command(flatten)]
        overrides: OverrideArgs,
    },
    /// Search the catalog
    Search {
        /// Artist contains (case-insensitive)
        #[arg(long)]
        artist: Option<String>,

        /// Title contains (case-insensitive)
        #[arg(long)]
        title: Option<String>,

        /// Exact genre
        #[arg(long)]
        genre: Option<String>,

        /// Exact decade, e.g. 1990s or Unknown
        #[arg(long, value_parser = parse_decade)]
        decade: Option<Decade>,

        /// Maximum number of results
        #[arg(long, short = 'n')]
        limit: Option<u32>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show catalog statistics
    Stats {
        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Get a config value, or print the config file
    Get {
        /// Key to look up
        key: Option<String>,
    },
    /// Set a value in the config file
    Set { key: String, value: String },
    /// Print the config file path
    Path,
    /// Create the config file with defaults
    Init,
    /// Print an example config file
    Example,
}

fn parse_decade(s: &str) -> Result<Decade, String> {
    Decade::parse(s).ok_or_else(|| format!("expected a decade like 1990s or Unknown, got {s:?}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Config { action } = cli.command {
        return match action {
            ConfigAction::Show => commands::config::show_config(),
            ConfigAction::Get { key } => commands::config::get_config(key),
            ConfigAction::Set { key, value } => commands::config::set_config(&key, &value),
            ConfigAction::Path => commands::config::show_path(),
            ConfigAction::Init => commands::config::init_config(),
            ConfigAction::Example => commands::config::show_example(),
        };
    }

    let mut config = Config::load()?;
    if let Some(db) = cli.db {
        config = config.with_db_path(db);
    }
    if let Some(music_folder) = cli.music_folder {
        config = config.with_music_folder(music_folder);
    }
    if cli.offline {
        config = config.offline();
    }

    match cli.command {
        Commands::Download { urls, overrides } => {
            commands::run_download(&config, &urls, &overrides.into_overrides()).await?;
        }
        Commands::Import { path, overrides } => {
            commands::run_import(&config, &path, &overrides.into_overrides()).await?;
        }
        Commands::Search {
            artist,
            title,
            genre,
            decade,
            limit,
            json,
        } => {
            let mut filter = SongFilter::new();
            if let Some(artist) = artist {
                filter = filter.artist(artist);
            }
            if let Some(title) = title {
                filter = filter.title(title);
            }
            if let Some(genre) = genre {
                filter = filter.genre(genre);
            }
            if let Some(decade) = decade {
                filter = filter.decade(decade);
            }
            if let Some(limit) = limit {
                filter = filter.limit(limit);
            }
            commands::run_search(&config, &filter, json)?;
        }
        Commands::Stats { json } => {
            commands::show_stats(&config, json)?;
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}
