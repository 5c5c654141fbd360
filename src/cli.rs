//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use magwatch::config::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MIN_FILE_SIZE,
    DEFAULT_READ_TIMEOUT_SECS,
};

/// Monitor a magazine listing page and download new issues.
///
/// Magwatch checks a listing page for unseen issues, resolves each issue's
/// hosting link to a direct file URL, downloads and validates the file, and
/// records progress in a checkpoint so every issue is fetched exactly once.
#[derive(Parser, Debug)]
#[command(name = "magwatch")]
#[command(author, version, about)]
pub struct Args {
    /// Listing page URL to check for new issues
    pub search_url: String,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Directory downloaded files are written to
    #[arg(short = 'd', long, default_value = "downloads")]
    pub download_dir: PathBuf,

    /// Checkpoint file recording already-processed issues
    #[arg(long, default_value = "magazine_state.json")]
    pub state_file: PathBuf,

    /// Directory for the per-day log file
    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,

    /// Maximum download attempts per file (1-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_retries: u32,

    /// Minimum plausible file size in bytes; smaller downloads are rejected
    #[arg(long, default_value_t = DEFAULT_MIN_FILE_SIZE)]
    pub min_file_size: u64,

    /// HTTP connect timeout in seconds
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout: u64,

    /// HTTP read timeout in seconds
    #[arg(long, default_value_t = DEFAULT_READ_TIMEOUT_SECS)]
    pub read_timeout: u64,

    /// Success notification channel
    #[arg(long, value_enum, default_value_t = NotifyChannel::Desktop)]
    pub notify: NotifyChannel,
}

/// Notification channels selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NotifyChannel {
    /// Platform desktop notification
    Desktop,
    /// No notifications
    Noop,
}
