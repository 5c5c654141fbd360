//! Run configuration shared by every component.
//!
//! A single [`MonitorConfig`] is built once (from CLI arguments) and passed
//! into the run context, so there is no process-wide mutable configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default maximum download attempts per direct URL.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default minimum plausible file size in bytes.
///
/// Hosting pages sometimes answer a download URL with a tiny error body;
/// anything at or below this size is treated as a failed attempt.
pub const DEFAULT_MIN_FILE_SIZE: u64 = 1000;

/// Default backoff unit between download attempts (attempt index x unit).
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(5);

/// Default polite delay range between requests to the same host, in milliseconds.
pub const DEFAULT_POLITE_DELAY_MS: (u64, u64) = (2_000, 5_000);

/// Default hosting domain whose document links are followed.
pub const DEFAULT_HOSTING_DOMAIN: &str = "vk.com";

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default read timeout in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Tunables for one monitor run.
///
/// Timing fields exist so tests can shrink the backoff and polite delay to
/// milliseconds; production defaults come from the constants above.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Listing page to check for new issues.
    pub search_url: String,
    /// Directory downloaded files land in.
    pub download_dir: PathBuf,
    /// Checkpoint file recording already-processed detail URLs.
    pub state_file: PathBuf,
    /// Debug artifact: the last-fetched hosting page body, overwritten on
    /// every resolution attempt.
    pub debug_page_path: PathBuf,
    /// Filename prefix for derived issue filenames.
    pub filename_prefix: String,
    /// Hosting domain whose document links on detail pages are followed.
    pub hosting_domain: String,
    /// Maximum download attempts per direct URL.
    pub max_attempts: u32,
    /// Minimum plausible downloaded file size in bytes.
    pub min_file_size: u64,
    /// Backoff unit between failed download attempts.
    pub backoff_unit: Duration,
    /// Inclusive range for the randomized polite delay, in ms.
    pub polite_delay_ms: (u64, u64),
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: u64,
}

impl MonitorConfig {
    /// Creates a config with production defaults for the given listing URL.
    #[must_use]
    pub fn new(search_url: impl Into<String>) -> Self {
        Self {
            search_url: search_url.into(),
            download_dir: PathBuf::from("downloads"),
            state_file: PathBuf::from("magazine_state.json"),
            debug_page_path: PathBuf::from("debug_host_page.html"),
            filename_prefix: "The_Economist".to_string(),
            hosting_domain: DEFAULT_HOSTING_DOMAIN.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_file_size: DEFAULT_MIN_FILE_SIZE,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
            polite_delay_ms: DEFAULT_POLITE_DELAY_MS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}
