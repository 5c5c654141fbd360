//! Per-run orchestration: listing check, resolution, download, checkpoint.
//!
//! The controller is strictly sequential: one item at a time, one candidate
//! link at a time. Any error while processing a single item is caught and
//! logged so remaining items still run; only a failure fetching the listing
//! page itself aborts the run. The checkpoint is persisted after every
//! successful item, never batched, so a crash loses at most the in-flight
//! item (whose re-attempt is idempotent).

use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::config::MonitorConfig;
use crate::download::{DownloadEngine, derive_filename};
use crate::fetch::{FetchError, HttpFetcher};
use crate::notify::Notifier;
use crate::resolver::{Resolution, extract_direct_url};
use crate::scrape::{ListingItem, parse_detail_links, parse_listing};
use crate::state::{CheckpointStore, StateError};

/// Everything one run needs, constructed once in `main` and passed down.
///
/// No component reaches for process-wide state; the context is the only
/// channel between the pipeline and its collaborators.
#[derive(Debug)]
pub struct RunContext {
    /// Shared HTTP session for listing/detail/hosting pages.
    pub fetcher: HttpFetcher,
    /// Download engine for resolved direct URLs.
    pub engine: DownloadEngine,
    /// Checkpoint of already-processed items; this context is its sole writer.
    pub store: CheckpointStore,
    /// Best-effort success notifier.
    pub notifier: Notifier,
    /// Run tunables.
    pub config: MonitorConfig,
}

/// Counters for one run, logged at completion.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Items present on the listing page.
    pub items_seen: usize,
    /// Items not yet in the checkpoint.
    pub new_items: usize,
    /// Items downloaded and validated this run.
    pub downloaded: usize,
    /// Items whose target file already existed on disk.
    pub already_present: usize,
    /// Items skipped (no hosting link, or no candidate resolved).
    pub skipped: usize,
    /// Items that errored; left unprocessed for a future run.
    pub failed: usize,
}

/// Errors fatal to an entire run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The listing page itself could not be fetched; nothing to iterate.
    #[error("listing page fetch failed: {0}")]
    Listing(#[source] FetchError),

    /// Checkpoint persistence failed at a run boundary.
    #[error(transparent)]
    State(#[from] StateError),
}

/// Per-item errors; caught by the run loop, logged, never fatal.
#[derive(Debug, Error)]
enum ItemError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    State(#[from] StateError),
}

/// What happened to one new listing item.
#[derive(Debug, PartialEq, Eq)]
enum ItemOutcome {
    /// File downloaded, validated, checkpointed, notified.
    Downloaded,
    /// Target file was already on disk; checkpointed without notifying.
    AlreadyOnDisk,
    /// Detail page carried no candidate hosting links.
    NoHostingLink,
    /// No candidate link yielded a completed download.
    Unresolved,
}

/// Executes one full check of the listing page.
///
/// # Errors
///
/// Returns [`PipelineError::Listing`] when the listing page cannot be
/// fetched, or [`PipelineError::State`] when the end-of-run checkpoint save
/// fails. Per-item failures are logged and counted, never propagated.
#[instrument(skip(ctx), fields(search_url = %ctx.config.search_url))]
pub async fn run_once(ctx: &mut RunContext) -> Result<RunSummary, PipelineError> {
    info!("starting magazine check");

    let listing_html = ctx
        .fetcher
        .fetch_text(&ctx.config.search_url)
        .await
        .map_err(PipelineError::Listing)?;
    let items = parse_listing(&listing_html);
    ctx.store.mark_checked(Utc::now());

    let mut summary = RunSummary {
        items_seen: items.len(),
        ..RunSummary::default()
    };

    for item in &items {
        if ctx.store.contains(&item.detail_url) {
            debug!(title = %item.title, "already processed");
            continue;
        }
        summary.new_items += 1;
        info!(title = %item.title, url = %item.detail_url, "found new issue");

        let outcome = process_item(
            &ctx.fetcher,
            &ctx.engine,
            &mut ctx.store,
            &ctx.notifier,
            &ctx.config,
            item,
        )
        .await;

        match outcome {
            Ok(ItemOutcome::Downloaded) => summary.downloaded += 1,
            Ok(ItemOutcome::AlreadyOnDisk) => summary.already_present += 1,
            Ok(ItemOutcome::NoHostingLink | ItemOutcome::Unresolved) => summary.skipped += 1,
            Err(e) => {
                error!(
                    url = %item.detail_url,
                    error = %e,
                    "error processing item; continuing with remaining items"
                );
                summary.failed += 1;
            }
        }
    }

    // Records last_check even when no item produced a download.
    ctx.store.save()?;

    info!(
        items_seen = summary.items_seen,
        new_items = summary.new_items,
        downloaded = summary.downloaded,
        already_present = summary.already_present,
        skipped = summary.skipped,
        failed = summary.failed,
        "check completed"
    );
    Ok(summary)
}

/// Handles one unseen listing item end to end.
async fn process_item(
    fetcher: &HttpFetcher,
    engine: &DownloadEngine,
    store: &mut CheckpointStore,
    notifier: &Notifier,
    config: &MonitorConfig,
    item: &ListingItem,
) -> Result<ItemOutcome, ItemError> {
    let detail_html = fetcher.fetch_text(&item.detail_url).await?;

    // Self-throttle before hammering the same host with hosting-page and
    // file requests.
    polite_delay(config).await;

    let links = parse_detail_links(&detail_html, &config.hosting_domain);
    if links.is_empty() {
        warn!(title = %item.title, "no hosting links on detail page");
        return Ok(ItemOutcome::NoHostingLink);
    }
    info!(count = links.len(), "found candidate hosting links");

    for link in &links {
        info!(link = %link, "fetching hosting page");
        let body = match fetcher.fetch_text(link).await {
            Ok(body) => body,
            Err(e) => {
                warn!(link = %link, error = %e, "hosting page fetch failed; trying next candidate");
                continue;
            }
        };
        write_debug_artifact(config, &body);

        let direct_url = match extract_direct_url(&body) {
            Resolution::Found(url) => url,
            Resolution::NotFound => {
                warn!(link = %link, "could not find direct download URL in hosting page");
                continue;
            }
        };
        info!(url = %direct_url, "resolved direct download URL");

        let filename = derive_filename(&item.title, &config.filename_prefix);
        let target = config.download_dir.join(&filename);

        if target.exists() {
            info!(file = %filename, "file already exists; marking processed");
            store.mark_processed(&item.detail_url);
            store.save()?;
            return Ok(ItemOutcome::AlreadyOnDisk);
        }

        if let Err(e) = std::fs::create_dir_all(&config.download_dir) {
            warn!(
                dir = %config.download_dir.display(),
                error = %e,
                "could not create download directory"
            );
        }

        match engine.download(&direct_url, &target).await {
            Ok(outcome) => {
                store.mark_processed(&item.detail_url);
                store.save()?;
                notifier.notify(
                    "Download complete",
                    &format!("{filename} ({} bytes)", outcome.bytes_written),
                );
                info!(title = %item.title, file = %filename, "issue processed");
                return Ok(ItemOutcome::Downloaded);
            }
            Err(e) => {
                warn!(
                    url = %direct_url,
                    error = %e,
                    "download failed; trying next candidate link"
                );
            }
        }
    }

    warn!(title = %item.title, "no candidate link produced a download; leaving for next run");
    Ok(ItemOutcome::Unresolved)
}

/// Randomized delay within the configured range, blocking the single task by
/// design (intentional self-throttling).
async fn polite_delay(config: &MonitorConfig) {
    let (lo, hi) = config.polite_delay_ms;
    let delay_ms = {
        let mut rng = rand::thread_rng();
        if hi > lo { rng.gen_range(lo..=hi) } else { lo }
    };
    debug!(delay_ms, "polite delay before further requests");
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
}

/// Overwrites the diagnosability artifact with the last hosting page body.
fn write_debug_artifact(config: &MonitorConfig, body: &str) {
    if let Err(e) = std::fs::write(&config.debug_page_path, body) {
        warn!(
            path = %config.debug_page_path.display(),
            error = %e,
            "failed to write hosting page debug artifact"
        );
    }
}
