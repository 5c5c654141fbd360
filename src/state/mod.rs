//! Checkpoint persistence for already-processed listing items.
//!
//! The checkpoint is a single JSON file: an ordered list of detail-page URLs
//! plus the last-check timestamp. It is loaded once at startup and rewritten
//! wholesale after every successful item, so a crash mid-run loses at most
//! the in-flight item. The pipeline controller is the sole writer.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors raised while loading or saving the checkpoint.
#[derive(Debug, Error)]
pub enum StateError {
    /// File system error reading or writing the checkpoint file.
    #[error("IO error on checkpoint {path}: {source}")]
    Io {
        /// The checkpoint file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The checkpoint file exists but is not valid JSON.
    ///
    /// Surfaced rather than silently reset: a reset would re-download every
    /// issue ever processed.
    #[error("malformed checkpoint {path}: {source}")]
    Malformed {
        /// The checkpoint file path.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Persisted record of which listing items have been fully processed.
///
/// `processed_urls` preserves insertion order; membership is checked
/// linearly, which is fine at the scale of a magazine archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Detail-page URLs already handled, in processing order.
    pub processed_urls: Vec<String>,
    /// RFC 3339 timestamp of the most recent listing check, if any.
    pub last_check: Option<String>,
}

/// Owns the in-memory checkpoint and its backing file for one run.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    checkpoint: Checkpoint,
}

impl CheckpointStore {
    /// Loads the checkpoint from `path`, starting empty when no file exists.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when the file cannot be read or parsed.
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StateError> {
        let path = path.as_ref().to_path_buf();
        let checkpoint = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| StateError::Malformed {
                path: path.clone(),
                source: e,
            })?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!("no checkpoint file; starting empty");
                Checkpoint::default()
            }
            Err(error) => {
                return Err(StateError::Io {
                    path,
                    source: error,
                });
            }
        };

        debug!(
            processed = checkpoint.processed_urls.len(),
            "checkpoint loaded"
        );
        Ok(Self { path, checkpoint })
    }

    /// Creates a store over an explicit checkpoint (used by tests).
    #[must_use]
    pub fn with_checkpoint(path: impl Into<PathBuf>, checkpoint: Checkpoint) -> Self {
        Self {
            path: path.into(),
            checkpoint,
        }
    }

    /// Returns true when the detail URL has already been processed.
    #[must_use]
    pub fn contains(&self, detail_url: &str) -> bool {
        self.checkpoint
            .processed_urls
            .iter()
            .any(|u| u == detail_url)
    }

    /// Records a detail URL as processed, preserving insertion order.
    pub fn mark_processed(&mut self, detail_url: impl Into<String>) {
        let detail_url = detail_url.into();
        if !self.contains(&detail_url) {
            self.checkpoint.processed_urls.push(detail_url);
        }
    }

    /// Records the time of the current listing check.
    pub fn mark_checked(&mut self, timestamp: chrono::DateTime<chrono::Utc>) {
        self.checkpoint.last_check = Some(timestamp.to_rfc3339());
    }

    /// Writes the whole checkpoint to disk, replacing the previous file.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Io`] when the file cannot be written.
    pub fn save(&self) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(&self.checkpoint).map_err(|e| {
            StateError::Malformed {
                path: self.path.clone(),
                source: e,
            }
        })?;
        std::fs::write(&self.path, json).map_err(|e| StateError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        debug!(
            processed = self.checkpoint.processed_urls.len(),
            "checkpoint saved"
        );
        Ok(())
    }

    /// Read access to the in-memory checkpoint.
    #[must_use]
    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }
}
