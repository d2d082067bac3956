use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use release_harvest_lib::infrastructure::{
    ConfigManager, HttpPageFetcher, JsonStateStore, init_logging_with_config,
};
use release_harvest_lib::ScrapeOrchestrator;

/// Scrape new release changelogs and append them to the local dataset
#[derive(Parser, Debug)]
#[command(name = "release-harvest", version, about)]
struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Landing page to start from
    #[arg(long)]
    landing_url: Option<String>,

    /// Directory holding the ledger and dataset files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let mut config = manager.load_config().await?;

    if let Some(url) = cli.landing_url {
        config.source.landing_url = url;
    }
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_logging_with_config(&config.logging)?;
    info!("🚀 Starting release harvest from {}", config.source.landing_url);

    let fetcher = HttpPageFetcher::new(&config.http, config.timing.poll_interval())
        .context("Failed to create page fetcher")?;
    let store = JsonStateStore::from_config(&config.storage);
    let orchestrator = ScrapeOrchestrator::from_config(Arc::new(fetcher), store, &config)?;

    let summary = orchestrator.run(&config.source.landing_url).await?;

    println!(
        "{} new releases, {} total ({} products, {} skipped, {} failed extractions) in {:.2?}",
        summary.new_record_count,
        summary.total_record_count,
        summary.products_discovered,
        summary.products_skipped,
        summary.extraction_failures,
        summary.elapsed,
    );
    Ok(())
}
