use anyhow::Result;
use discoteca_etl::{Catalog, Config};

pub fn show_stats(config: &Config, json: bool) -> Result<()> {
    let catalog = Catalog::open(&config.database_path)?;
    let stats = catalog.stats()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("\n📊 Discoteca Stats\n");
    println!("  Catalog: {}", config.database_path.display());
    println!("  Library: {}", config.music_folder.display());
    println!("  Songs: {}", stats.total_songs);
    #[allow(clippy::cast_precision_loss)]
    let megabytes = stats.total_size_bytes as f64 / (1024.0 * 1024.0);
    println!("  Size: {megabytes:.1} MB");

    if !stats.by_genre.is_empty() {
        println!("\n  By genre:");
        for (genre, count) in &stats.by_genre {
            println!("    {genre:<24} {count}");
        }
    }
    if !stats.by_decade.is_empty() {
        println!("\n  By decade:");
        for (decade, count) in &stats.by_decade {
            println!("    {decade:<24} {count}");
        }
    }

    if stats.total_songs == 0 {
        println!("\n  Run `discoteca download <url>` to add songs");
    }
    Ok(())
}
