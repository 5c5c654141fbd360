//! Magwatch Core Library
//!
//! This library implements a sequential monitor for a magazine listing page:
//! it finds newly posted issues, resolves each issue's intermediary hosting
//! link to a direct file URL, downloads and validates the file, and records
//! progress in a checkpoint so no issue is handled twice.
//!
//! # Architecture
//!
//! - [`scrape`] - Selector-based listing/detail page extraction
//! - [`resolver`] - Pure direct-URL extraction from hosting page bodies
//! - [`fetch`] - Shared HTTP session with a browser-like identity
//! - [`download`] - Streaming download engine with retry and validation
//! - [`state`] - JSON checkpoint of already-processed listing items
//! - [`notify`] - Best-effort success notifications
//! - [`pipeline`] - Per-run orchestration tying the above together

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod fetch;
pub mod notify;
pub mod pipeline;
pub mod resolver;
pub mod scrape;
pub mod state;

mod user_agent;

// Re-export commonly used types
pub use config::MonitorConfig;
pub use download::{DownloadEngine, DownloadError, DownloadOutcome, derive_filename};
pub use fetch::{FetchError, HttpFetcher};
pub use notify::{EmailConfig, Notification, Notifier};
pub use pipeline::{PipelineError, RunContext, RunSummary, run_once};
pub use resolver::{Resolution, extract_direct_url};
pub use scrape::{ListingItem, parse_detail_links, parse_listing};
pub use state::{Checkpoint, CheckpointStore, StateError};
