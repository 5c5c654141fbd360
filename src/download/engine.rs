//! Streaming download engine with retry, backoff, and content validation.
//!
//! One engine is built per run and shares the fetch session's connection
//! pool. Each download streams the body to disk in chunks, validating the
//! declared content type before trusting the body and the resulting file
//! size after. Failed attempts delete the partial file and back off for
//! `attempt index x backoff unit` before retrying; after the attempt budget
//! is exhausted no artifact remains at the target path.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, REFERER};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::error::DownloadError;

/// Referer presented on file requests so the hosting CDN serves the document.
const HOSTING_REFERER: &str = "https://vk.com/";

/// Result of a validated, complete download.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    /// Final path of the downloaded file.
    pub path: PathBuf,
    /// Total bytes written to disk.
    pub bytes_written: u64,
}

/// Download engine for sequential, validated file downloads.
#[derive(Debug, Clone)]
pub struct DownloadEngine {
    client: Client,
    max_attempts: u32,
    backoff_unit: Duration,
    min_file_size: u64,
}

impl DownloadEngine {
    /// Creates an engine on top of an existing client (shared connection pool).
    ///
    /// `max_attempts` is clamped to at least one attempt.
    #[must_use]
    pub fn new(
        client: Client,
        max_attempts: u32,
        backoff_unit: Duration,
        min_file_size: u64,
    ) -> Self {
        Self {
            client,
            max_attempts: max_attempts.max(1),
            backoff_unit,
            min_file_size,
        }
    }

    /// Returns the configured attempt budget.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Downloads `url` to `target`, retrying transient failures.
    ///
    /// Success means a complete, validated file exists at `target`. On any
    /// failure path the partial file is deleted before backing off or
    /// returning, so a file at the target path is never corrupt.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's [`DownloadError`] once the budget is
    /// exhausted, or [`DownloadError::InvalidUrl`] immediately for a
    /// malformed URL.
    #[instrument(skip(self), fields(url = %url, target = %target.display()))]
    pub async fn download(
        &self,
        url: &str,
        target: &Path,
    ) -> Result<DownloadOutcome, DownloadError> {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!(attempt, max_attempts = self.max_attempts, "download attempt");

            match self.attempt(url, target).await {
                Ok(bytes_written) => {
                    info!(bytes = bytes_written, attempt, "download complete");
                    return Ok(DownloadOutcome {
                        path: target.to_path_buf(),
                        bytes_written,
                    });
                }
                Err(error) => {
                    remove_partial(target).await;

                    if attempt >= self.max_attempts {
                        warn!(attempt, error = %error, "all download attempts failed");
                        return Err(error);
                    }

                    let delay = self.backoff_unit.saturating_mul(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "attempt failed; backing off before retry"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// One streamed attempt: request, content-type check, stream, size check.
    async fn attempt(&self, url: &str, target: &Path) -> Result<u64, DownloadError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "*/*")
            .header(REFERER, HOSTING_REFERER)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DownloadError::timeout(url)
                } else {
                    DownloadError::network(url, e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        // The hosting server sometimes disguises an HTML error page as
        // 200 OK; reject anything that is not a document/binary type before
        // reading the body.
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !is_document_content_type(&content_type) {
            return Err(DownloadError::bad_content_type(url, content_type));
        }

        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let bytes_written = stream_to_file(response, url, target, content_length).await?;

        if bytes_written < self.min_file_size {
            return Err(DownloadError::too_small(
                target,
                bytes_written,
                self.min_file_size,
            ));
        }

        Ok(bytes_written)
    }
}

/// Returns true for content types a magazine file may legitimately carry.
fn is_document_content_type(content_type: &str) -> bool {
    content_type.contains("application/pdf") || content_type.contains("octet-stream")
}

/// Streams the response body to `target` in chunks, returning bytes written.
async fn stream_to_file(
    response: reqwest::Response,
    url: &str,
    target: &Path,
    content_length: Option<u64>,
) -> Result<u64, DownloadError> {
    let file = File::create(target)
        .await
        .map_err(|e| DownloadError::io(target, e))?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    let progress = build_progress_bar(target, content_length);

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(target, e))?;
        bytes_written += chunk.len() as u64;
        progress.inc(chunk.len() as u64);
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(target, e))?;
    progress.finish_and_clear();

    debug!(bytes = bytes_written, "body streamed to disk");
    Ok(bytes_written)
}

fn build_progress_bar(target: &Path, content_length: Option<u64>) -> ProgressBar {
    let progress = match content_length {
        Some(total) => ProgressBar::new(total),
        None => ProgressBar::new_spinner(),
    };
    progress.set_style(
        ProgressStyle::with_template("{msg} {bytes}/{total_bytes} ({bytes_per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    progress.set_message(
        target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );
    progress
}

/// Best-effort removal of a partial artifact; missing file is fine.
async fn remove_partial(target: &Path) {
    if let Err(error) = tokio::fs::remove_file(target).await {
        if error.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %target.display(), error = %error, "failed to remove partial file");
        }
    }
}
