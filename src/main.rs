//! hn-ingest main entry point
//!
//! This is the command-line interface for the Hacker News ingester.

use anyhow::Context;
use clap::{Parser, Subcommand};
use hn_ingest::config::{load_config, Config};
use hn_ingest::crawler::Coordinator;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// hn-ingest: mirror the Hacker News item graph into SQLite
///
/// Backfills historical stories with their comment trees, follows live
/// updates, and records top stories snapshots.
#[derive(Parser, Debug)]
#[command(name = "hn-ingest")]
#[command(version)]
#[command(about = "Mirror the Hacker News item graph into SQLite", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Backfill stories and their comments over a range of item ids
    Backfill {
        /// First item id (inclusive); defaults to backfill.start-id
        #[arg(long)]
        start: Option<i64>,

        /// Last item id (exclusive); defaults to backfill.end-id or the latest upstream id
        #[arg(long)]
        end: Option<i64>,

        /// Keep following live updates once the backfill finishes
        #[arg(long)]
        follow: bool,
    },

    /// Follow live updates until interrupted
    Listen,

    /// Record the current top stories (periodically if top-stories.interval-secs is set)
    TopStories,

    /// Show statistics from the database and exit
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    setup_logging(cli.verbose, cli.quiet);

    // Load configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    // Dispatch to the selected job
    match cli.command {
        Command::Backfill { start, end, follow } => handle_backfill(config, start, end, follow).await,
        Command::Listen => handle_listen(config).await,
        Command::TopStories => handle_top_stories(config).await,
        Command::Stats => handle_stats(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("hn_ingest=info,warn"),
            1 => EnvFilter::new("hn_ingest=debug,info"),
            2 => EnvFilter::new("hn_ingest=trace,debug"),
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

/// Returns a token that is cancelled on Ctrl-C
fn shutdown_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested, finishing current cycle");
            trigger.cancel();
        }
    });

    cancel
}

/// Handles the `backfill` command
async fn handle_backfill(
    config: Config,
    start: Option<i64>,
    end: Option<i64>,
    follow: bool,
) -> anyhow::Result<()> {
    let coordinator = Coordinator::connect(config)?;

    let report = coordinator
        .run_backfill(start, end)
        .await
        .context("backfill failed")?;

    println!(
        "✓ Backfill saved {} stories and {} comments ({} ids fetched, {} already stored)",
        report.stories_saved, report.comments_saved, report.fetched, report.skipped
    );

    // Keep following live updates until Ctrl-C
    if follow {
        coordinator
            .run_listener(shutdown_token())
            .await
            .context("live poller failed")?;
    }

    Ok(())
}

/// Handles the `listen` command
async fn handle_listen(config: Config) -> anyhow::Result<()> {
    let coordinator = Coordinator::connect(config)?;

    coordinator
        .run_listener(shutdown_token())
        .await
        .context("live poller failed")?;

    Ok(())
}

/// Handles the `top-stories` command
async fn handle_top_stories(config: Config) -> anyhow::Result<()> {
    let coordinator = Coordinator::connect(config)?;

    coordinator
        .run_top_stories(shutdown_token())
        .await
        .context("top stories sync failed")?;

    Ok(())
}

/// Handles the `stats` command: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use hn_ingest::output::{load_statistics, print_statistics};
    use hn_ingest::storage::SqliteStorage;

    println!("Database: {}\n", config.database.path);

    let storage = SqliteStorage::new(Path::new(&config.database.path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}
