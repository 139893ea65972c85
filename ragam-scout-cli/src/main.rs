//! Ragam Scout - command-line entry point
//!
//! Runs one discovery for a ragam, stores the songs found and exports the
//! whole store as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use ragam_scout::prelude::*;
use ragam_scout::store::DEFAULT_STORE_FILE;

/// Command-line arguments for ragam-scout
#[derive(Parser, Debug)]
#[command(name = "ragam-scout")]
#[command(about = "Find songs set in a Carnatic ragam on the web")]
#[command(version)]
struct Args {
    /// Ragam name to search
    #[arg(long)]
    ragam: String,

    /// Result pages per engine (minimum 1)
    #[arg(long)]
    max_pages: Option<usize>,

    /// Local model used for extraction
    #[arg(long)]
    model: Option<String>,

    /// Pages extracted at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Song store file
    #[arg(long, env = "RAGAM_DB", default_value = DEFAULT_STORE_FILE)]
    db: PathBuf,

    /// Export file (default: <ragam>_songs.json)
    #[arg(long)]
    export: Option<PathBuf>,

    /// Log output format: pretty or json
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,

    /// User agent for search and page requests
    #[arg(long, env = "USER_AGENT")]
    user_agent: Option<String>,
}

fn load_config(args: &Args) -> Result<DiscoveryConfig> {
    let mut config = match &args.config {
        Some(path) => DiscoveryConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DiscoveryConfig::default(),
    };
    if let Some(pages) = args.max_pages {
        config = config.with_pages_per_engine(pages);
    }
    if let Some(model) = &args.model {
        config = config.with_model(model.clone());
    }
    if let Some(concurrency) = args.concurrency {
        config = config.with_max_concurrent(concurrency);
    }
    if let Some(user_agent) = &args.user_agent {
        config.fetch = config.fetch.with_user_agent(user_agent.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format).context("Failed to initialize logging")?;

    let config = load_config(&args)?;
    info!(
        ragam = %args.ragam,
        model = %config.oracle.model,
        pages_per_engine = config.pages_per_engine,
        concurrency = config.max_concurrent,
        "Starting discovery"
    );

    let engine = HttpSearchEngine::new(&config.fetch)
        .context("Failed to build search client")?
        .with_wrapper_params(config.wrapper_params.clone());
    let fetcher = HttpFetcher::new(&config.fetch).context("Failed to build page fetcher")?;
    let oracle = OllamaOracle::new(&config.oracle);
    let scout = RagamScout::new(config, Arc::new(engine), Arc::new(fetcher), Arc::new(oracle));

    let report = scout
        .discover_and_extract(&args.ragam)
        .await
        .context("Discovery failed")?;
    info!(
        run_id = %report.run_id,
        candidates = report.candidates.len(),
        songs = report.songs.len(),
        dropped = report.drops.total,
        by_stage = ?report.drops.by_stage,
        "Discovery report"
    );

    let store = JsonFileStore::open(&args.db)
        .await
        .with_context(|| format!("Failed to open song store {}", args.db.display()))?;
    let summary = persist_songs(&store, &args.ragam, &report.songs).await;
    info!(inserted = summary.inserted, skipped = summary.skipped, "Inserted/confirmed songs");

    let export_path = args
        .export
        .clone()
        .unwrap_or_else(|| default_export_path(&args.ragam));
    match export_songs(&store, &export_path).await {
        Ok(count) => info!(path = %export_path.display(), songs = count, "Export complete"),
        Err(e) => warn!(path = %export_path.display(), error = %e, "Export failed"),
    }

    info!("Done");
    Ok(())
}
