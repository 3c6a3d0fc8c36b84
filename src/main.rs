//! Crawlkeep main entry point
//!
//! This is the command-line interface for the Crawlkeep web crawler.

use anyhow::Context;
use clap::Parser;
use crawlkeep::config::{load_config, validate, Config};
use crawlkeep::crawler::crawl;
use crawlkeep::output::{load_statistics, print_report, print_statistics};
use crawlkeep::storage::open_storage;
use crawlkeep::url::validate_seed_url;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Crawlkeep: a polite, resumable web crawler
///
/// Crawlkeep walks outward from a seed URL, storing page titles, descriptions
/// and frequent words in SQLite. Interrupt it at any time; running it again with
/// the same database picks up the remaining queue.
#[derive(Parser, Debug)]
#[command(name = "crawlkeep")]
#[command(version)]
#[command(about = "A polite, resumable web crawler", long_about = None)]
struct Cli {
    /// URL to start the crawl at, e.g. https://www.example.com
    #[arg(value_name = "URL", required_unless_present = "stats")]
    url: Option<String>,

    /// Name of the crawl database (stored as <db-dir>/<DB_NAME>.sqlite3)
    #[arg(value_name = "DB_NAME", required_unless_present = "stats")]
    db_name: Option<String>,

    /// Sleep time in seconds between requests
    #[arg(short, long)]
    sleep: Option<f64>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding crawl databases
    #[arg(long, value_name = "DIR")]
    db_dir: Option<PathBuf>,

    /// Show statistics from the named database and exit
    #[arg(long, value_name = "DB_NAME", conflicts_with_all = ["url", "db_name"])]
    stats: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.debug);

    let config = resolve_config(&cli)?;

    if let Some(db_name) = &cli.stats {
        return handle_stats(&config.storage.database_path(db_name));
    }

    let (Some(raw_url), Some(db_name)) = (cli.url.as_deref(), cli.db_name.as_deref()) else {
        anyhow::bail!("URL and DB_NAME are required unless --stats is given");
    };
    let database_path = config.storage.database_path(db_name);

    let seed = match validate_seed_url(raw_url) {
        Ok(seed) => seed,
        Err(e) => {
            tracing::error!(
                "Invalid URL ({}). It should be in the format: https://www.website.com",
                e
            );
            return Err(e.into());
        }
    };

    handle_crawl(&config, seed, database_path).await
}

/// Sets up the logging/tracing subscriber
///
/// `RUST_LOG` takes precedence over the `--debug` flag when set.
fn setup_logging(debug: bool) {
    let default_filter = if debug {
        "crawlkeep=debug,info"
    } else {
        "crawlkeep=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(debug)
        .with_file(false)
        .init();
}

/// Loads the config file (if any) and applies command-line overrides
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(sleep) = cli.sleep {
        config.crawler.sleep_time = sleep;
    }
    if let Some(dir) = &cli.db_dir {
        config.storage.directory = dir.clone();
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(database_path: &std::path::Path) -> anyhow::Result<()> {
    println!("Database: {}\n", database_path.display());

    let storage = open_storage(database_path)
        .with_context(|| format!("Failed to open {}", database_path.display()))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, seed_url: &str, database_path: PathBuf) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling from {} into {} (sleep {}s)",
        seed_url,
        database_path.display(),
        config.crawler.sleep_time
    );

    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone());

    match crawl(config, seed_url, &database_path, cancel).await {
        Ok(report) => {
            tracing::info!("Crawl completed successfully");
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Cancels `token` on Ctrl-C or SIGTERM
///
/// The crawl notices at its next iteration boundary; an in-flight request
/// always completes first.
fn spawn_signal_listener(token: CancellationToken) {
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        tracing::info!("Received shutdown signal, stopping after the current request");
        token.cancel();
    });
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn wait_for_ctrl_c() {
    signal_received(tokio::signal::ctrl_c().await).await;
}

/// Passes a delivered signal through; a listener error must not read as a signal
async fn signal_received(result: std::io::Result<()>) {
    if let Err(e) = result {
        tracing::warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!("Could not install SIGTERM handler: {}", e);
            wait_for_ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = wait_for_ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    wait_for_ctrl_c().await;
}
