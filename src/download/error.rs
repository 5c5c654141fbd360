//! Error types for the download module.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during a download attempt.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS, stream read).
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Server declared a content type that cannot be the requested file.
    ///
    /// Hosting servers sometimes answer 200 OK with an HTML error page where
    /// a document was expected; the declared type is checked before any byte
    /// of the body is trusted.
    #[error("unexpected content type '{content_type}' downloading {url}")]
    BadContentType {
        /// The URL that returned the wrong type.
        url: String,
        /// The declared Content-Type value.
        content_type: String,
    },

    /// The fully streamed file is below the plausibility threshold.
    #[error("downloaded file {path} is too small: {size} bytes (minimum {min})")]
    TooSmall {
        /// Path of the undersized file (already deleted by the engine).
        path: PathBuf,
        /// Actual size in bytes.
        size: u64,
        /// Minimum plausible size in bytes.
        min: u64,
    },

    /// File system error during download (create file, write, flush).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a bad-content-type error.
    pub fn bad_content_type(url: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self::BadContentType {
            url: url.into(),
            content_type: content_type.into(),
        }
    }

    /// Creates a too-small error.
    pub fn too_small(path: impl Into<PathBuf>, size: u64, min: u64) -> Self {
        Self::TooSmall {
            path: path.into(),
            size,
            min,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}
