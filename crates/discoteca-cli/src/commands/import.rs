use anyhow::{Context, Result};
use discoteca_core::model::Overrides;
use discoteca_etl::{Config, Importer, Pipeline};
use std::path::Path;

pub async fn run_import(config: &Config, dir: &Path, overrides: &Overrides) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }
    let pipeline = Pipeline::from_config(config).context("Failed to open catalog")?;

    println!("\n⏳ Importing from {}", dir.display());
    let summary = Importer::new(&pipeline).import_dir(dir, overrides).await;

    for record in &summary.stored {
        println!("  ✓ {} [{} / {}]", record.title, record.genre, record.decade());
    }
    for (path, err) in &summary.failed {
        eprintln!("  ✗ {}: {err}", path.display());
    }

    println!(
        "\n✓ Import complete: {} files, {} added, {} already present, {} failed",
        summary.scanned,
        summary.stored.len(),
        summary.duplicates.len(),
        summary.failed.len()
    );
    Ok(())
}
