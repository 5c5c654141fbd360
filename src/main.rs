//! CLI entry point for the magazine monitor.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use magwatch::{
    CheckpointStore, DownloadEngine, HttpFetcher, MonitorConfig, Notifier, RunContext, run_once,
};
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cli;

use cli::{Args, NotifyChannel};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Every run logs to stderr and to a per-day file under the log directory.
    let log_file = open_log_file(&args.log_dir)?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(log_file)),
        )
        .init();

    debug!(?args, "CLI arguments parsed");
    info!("magazine monitor starting");

    let mut config = MonitorConfig::new(args.search_url);
    config.download_dir = args.download_dir;
    config.state_file = args.state_file;
    config.max_attempts = args.max_retries;
    config.min_file_size = args.min_file_size;
    config.connect_timeout_secs = args.connect_timeout;
    config.read_timeout_secs = args.read_timeout;

    let fetcher = HttpFetcher::new(&config).context("building HTTP session")?;
    let engine = DownloadEngine::new(
        fetcher.client().clone(),
        config.max_attempts,
        config.backoff_unit,
        config.min_file_size,
    );
    let store = CheckpointStore::load(&config.state_file).context("loading checkpoint")?;
    let notifier = match args.notify {
        NotifyChannel::Desktop => Notifier::Desktop,
        NotifyChannel::Noop => Notifier::Noop,
    };

    let mut ctx = RunContext {
        fetcher,
        engine,
        store,
        notifier,
        config,
    };

    let summary = run_once(&mut ctx).await.context("monitor run failed")?;

    info!(
        downloaded = summary.downloaded,
        skipped = summary.skipped,
        failed = summary.failed,
        "magazine monitor finished"
    );
    Ok(())
}

/// Opens (appending) the per-day log file, creating the directory first.
fn open_log_file(log_dir: &Path) -> Result<std::fs::File> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;
    let path = log_dir.join(format!(
        "monitor_{}.log",
        chrono::Local::now().format("%Y%m%d")
    ));
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))
}
