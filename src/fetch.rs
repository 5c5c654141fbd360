//! Shared HTTP session for page fetches.
//!
//! One [`HttpFetcher`] is built per run and reused for the listing page,
//! detail pages, and hosting pages, so connections are pooled and cookies
//! persist across requests within the run. The fetcher raises on non-2xx
//! responses and never retries; retry policy belongs to callers.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::MonitorConfig;
use crate::user_agent::BROWSER_USER_AGENT;

const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// Errors raised while fetching a page body.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection refused, TLS, body read).
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP session: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl FetchError {
    pub(crate) fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    pub(crate) fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    pub(crate) fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }
}

/// HTTP fetcher presenting a stable browser-like identity.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds the session with browser headers and the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] when client construction fails.
    pub fn new(config: &MonitorConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE),
        );
        headers.insert(
            "Upgrade-Insecure-Requests",
            HeaderValue::from_static("1"),
        );

        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.read_timeout_secs))
            .cookie_store(true)
            .gzip(true)
            .build()
            .map_err(FetchError::ClientBuild)?;

        Ok(Self { client })
    }

    /// Fetches a page and returns its text body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport failure, timeout, or non-2xx status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        debug!("fetching page");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::timeout(url)
            } else {
                FetchError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::network(url, e))
    }

    /// Returns the underlying client, shared with the download engine so the
    /// whole run reuses one connection pool.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, headers, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(url: &str) -> MonitorConfig {
        MonitorConfig::new(url)
    }

    #[tokio::test]
    async fn test_fetch_text_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/listing"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let url = format!("{}/listing", server.uri());
        let fetcher = HttpFetcher::new(&test_config(&url)).unwrap();
        let body = fetcher.fetch_text(&url).await.unwrap();
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_fetch_text_sends_browser_identity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ua"))
            .and(header("User-Agent", BROWSER_USER_AGENT))
            // wiremock splits comma-separated header values, so the Accept
            // header must be matched with the multi-value `headers` matcher.
            .and(headers(
                "Accept",
                BROWSER_ACCEPT.split(',').map(str::trim).collect(),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string("seen"))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/ua", server.uri());
        let fetcher = HttpFetcher::new(&test_config(&url)).unwrap();
        assert_eq!(fetcher.fetch_text(&url).await.unwrap(), "seen");
    }

    #[tokio::test]
    async fn test_fetch_text_raises_on_non_2xx() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/gone", server.uri());
        let fetcher = HttpFetcher::new(&test_config(&url)).unwrap();
        match fetcher.fetch_text(&url).await {
            Err(FetchError::HttpStatus { status: 404, .. }) => {}
            other => panic!("expected HttpStatus 404, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_reuses_session_across_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x"))
            .expect(2)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&test_config(&server.uri())).unwrap();
        fetcher
            .fetch_text(&format!("{}/a", server.uri()))
            .await
            .unwrap();
        fetcher
            .fetch_text(&format!("{}/b", server.uri()))
            .await
            .unwrap();
    }
}
