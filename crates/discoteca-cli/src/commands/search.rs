use anyhow::Result;
use discoteca_core::schema::SongFilter;
use discoteca_etl::{Catalog, Config};

pub fn run_search(config: &Config, filter: &SongFilter, json: bool) -> Result<()> {
    let catalog = Catalog::open(&config.database_path)?;
    let songs = catalog.search(filter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&songs)?);
        return Ok(());
    }

    if songs.is_empty() {
        println!("No songs found.");
        return Ok(());
    }

    println!("\n🔍 {} songs\n", songs.len());
    for song in &songs {
        let artist = song.artist.as_deref().unwrap_or("Unknown artist");
        let year = song.year.map_or_else(|| "----".to_string(), |y| y.to_string());
        println!("  {} - {} ({year}) [{}]", artist, song.title, song.genre);
        println!("    {}", song.file_path.display());
    }
    Ok(())
}
