//! Reference-data ingest.
//!
//! Creates the reference tables and fills them from the configured source
//! documents, or truncates and reloads them with `--reset`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use georef::{Config, Gazetteer};

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Load GeoNames reference tables into the store")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database URL (overrides the configuration file)
    #[arg(long)]
    database_url: Option<String>,

    /// Rows per INSERT statement (overrides the configuration file)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Truncate and reload every table
    #[arg(long)]
    reset: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(url) = args.database_url {
        config.database.url = url;
    }
    if let Some(batch_size) = args.batch_size {
        anyhow::ensure!(batch_size > 0, "--batch-size must be at least 1");
        config.ingest.batch_size = batch_size;
    }

    info!("Georef Ingest");
    info!("Places source: {}", config.sources.places);

    let gazetteer = Gazetteer::connect(&config)
        .await
        .context("Failed to connect to the reference store")?;

    let start = Utc::now();
    if args.reset {
        gazetteer
            .reset_all()
            .await
            .context("Failed to reset reference tables")?;
    } else {
        gazetteer
            .ensure_all_loaded()
            .await
            .context("Failed to load reference tables")?;
    }

    let stats = gazetteer.stats().await?;
    info!(
        "Ingest complete in {}s: {} countries, {} admin codes, {} feature codes, {} places, {} alternate names",
        (Utc::now() - start).num_seconds(),
        stats.country_codes,
        stats.admin_codes,
        stats.feature_codes,
        stats.places,
        stats.alternate_names
    );

    Ok(())
}
