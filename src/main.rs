//! Sumi-Index main entry point
//!
//! This is the command-line interface for the Sumi-Index site indexer.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sumi_index::config::{load_config_with_hash, Config};
use sumi_index::crawler::{run_once, IndexingCoordinator};
use sumi_index::output::{load_statistics, print_statistics};
use sumi_index::storage::{SqliteStorage, Storage};
use tracing_subscriber::EnvFilter;

/// Sumi-Index: a polite site indexer
///
/// Sumi-Index crawls each configured site from its root URL, following
/// every link that stays within the site, and stores the fetched pages for
/// a search stage to build on. By default it serves an HTTP API for
/// starting and stopping indexing runs.
#[derive(Parser, Debug)]
#[command(name = "sumi-index")]
#[command(version = "1.0.0")]
#[command(about = "A polite site indexer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Index every configured site once and exit instead of serving
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    once: bool,

    /// Validate config and show what would be indexed without indexing
    #[arg(long, conflicts_with_all = ["once", "stats"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["once", "dry_run"])]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.once {
        handle_once(&config).await?;
    } else {
        handle_serve(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_index=info,warn"),
            1 => EnvFilter::new("sumi_index=debug,info"),
            2 => EnvFilter::new("sumi_index=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_storage(config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    Ok(Arc::new(storage))
}

/// Handles --dry-run: validates config and shows what would be indexed
fn handle_dry_run(config: &Config) {
    println!("=== Sumi-Index Dry Run ===\n");

    println!("Indexer Configuration:");
    println!("  User agent: {}", config.indexer.user_agent);
    println!("  Referrer: {}", config.indexer.referrer);
    println!("  Request delay: {}ms", config.indexer.request_delay);
    println!("  Request timeout: {}s", config.indexer.request_timeout);
    println!("  Fetches per site: {}", config.indexer.fetch_concurrency());
    println!("  Site workers: {}", config.indexer.worker_count());
    match config.indexer.max_depth {
        Some(depth) => println!("  Max depth: {}", depth),
        None => println!("  Max depth: unlimited"),
    }
    println!();

    println!("Server:");
    println!("  Bind address: {}", config.server.bind_address);
    println!();

    println!("Output:");
    println!("  Database: {}", config.output.database_path);
    println!();

    println!("Sites ({}):", config.sites.len());
    for site in &config.sites {
        println!("  - {} ({})", site.name, site.url);
    }
    println!();

    println!("Configuration is valid. Run without --dry-run to start indexing.");
}

/// Handles --stats: prints per-site statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let stats = load_statistics(storage.as_ref())?;
    print_statistics(&stats);
    Ok(())
}

/// Handles --once: indexes every configured site and exits
async fn handle_once(config: &Config) -> anyhow::Result<()> {
    let summary = run_once(config).await?;

    println!("\n=== Indexing Complete ===");
    println!("  Indexed: {}", summary.indexed);
    println!("  Failed: {}", summary.failed);
    println!("  Skipped: {}", summary.skipped);

    Ok(())
}

/// Default mode: serves the indexing API until the process is killed
async fn handle_serve(config: &Config) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let coordinator = Arc::new(IndexingCoordinator::new(config, storage)?);
    sumi_index::server::serve(coordinator, &config.server.bind_address).await
}
