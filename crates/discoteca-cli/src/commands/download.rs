use anyhow::{Context, Result};
use discoteca_core::model::Overrides;
use discoteca_etl::{Config, Pipeline, PipelineOutcome};

pub async fn run_download(config: &Config, urls: &[String], overrides: &Overrides) -> Result<()> {
    let pipeline = Pipeline::from_config(config).context("Failed to open catalog")?;

    pipeline
        .downloader()
        .tool()
        .check_available()
        .await
        .context("yt-dlp is required for downloads")?;

    let mut failed = 0usize;
    for url in urls {
        println!("\n⏳ {url}");
        match pipeline.run(url, overrides).await {
            Ok(PipelineOutcome::Stored(record)) => {
                println!("  ✓ {} [{} / {}]", record.title, record.genre, record.decade());
                println!("    {}", record.file_path.display());
            }
            Ok(PipelineOutcome::Duplicate(record)) => {
                println!("  ↺ Already in library: {}", record.file_path.display());
            }
            Err(e) => {
                failed += 1;
                eprintln!("  ✗ [{}] {e}", e.stage());
                if let Some(kept) = e.kept_file() {
                    eprintln!("    Audio kept at {}", kept.display());
                }
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} downloads failed", urls.len());
    }
    Ok(())
}
