//! Direct-URL extraction from hosting page bodies.
//!
//! Hosting pages embed the real file URL in one of several places depending
//! on the page variant served. [`extract_direct_url`] tries the known
//! strategies in a fixed priority order and stops at the first hit:
//!
//! 1. hidden form field named `url` carrying the direct link;
//! 2. the `Docs.initDoc({...})` inline initialization payload's `docUrl`;
//! 3. any literal `https://...pdf` substring in the raw text.
//!
//! A miss is a normal outcome (page layouts vary, links rot), so the result
//! is an explicit [`Resolution`] variant the caller branches on, never an
//! error. All functions here are pure; fetching the page is the caller's job.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Query marker instructing the hosting server to serve a raw download.
const FORCE_DOWNLOAD_MARKER: &str = "?dl=1";

static HIDDEN_INPUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"<input\s+name="url"\s+type="hidden"\s+value="([^"]+)""#)
});
static INIT_DOC_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"Docs\.initDoc\((\{[^}]+\})\)"));
static DOC_URL_FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#""docUrl"\s*:\s*"([^"]+)""#));
static PDF_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"https://[^"'\s]+\.pdf"#));

fn compile_static_regex(pattern: &str) -> Regex {
    #[allow(clippy::unwrap_used)]
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Outcome of a resolution attempt against one hosting page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Direct file URL, normalized with the force-download marker.
    Found(String),
    /// No known strategy matched; the caller should skip this candidate.
    NotFound,
}

/// Attempts to recover a direct download URL from a hosting page body.
#[must_use]
pub fn extract_direct_url(body: &str) -> Resolution {
    if let Some(url) = from_hidden_input(body) {
        debug!(strategy = "hidden_input", "direct URL found");
        return Resolution::Found(ensure_force_download(url));
    }
    if let Some(url) = from_init_doc(body) {
        debug!(strategy = "init_doc", "direct URL found");
        return Resolution::Found(ensure_force_download(url));
    }
    if let Some(url) = from_raw_text(body) {
        debug!(strategy = "raw_text", "direct URL found");
        return Resolution::Found(ensure_force_download(url));
    }
    debug!("no strategy matched hosting page body");
    Resolution::NotFound
}

/// Strategy 1: hidden form field named `url` carrying the direct link.
fn from_hidden_input(body: &str) -> Option<String> {
    HIDDEN_INPUT_RE
        .captures(body)
        .and_then(|captures| captures.get(1).map(|m| m.as_str().to_string()))
}

/// Strategy 2: `docUrl` inside the `Docs.initDoc({...})` payload.
///
/// The payload is parsed as JSON when possible; pages that ship a not-quite
/// JSON object literal fall back to a field-level scan. Escaped path
/// separators (`\/`) are unescaped either way.
fn from_init_doc(body: &str) -> Option<String> {
    let payload = INIT_DOC_RE
        .captures(body)
        .and_then(|captures| captures.get(1).map(|m| m.as_str()))?;

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(payload) {
        if let Some(url) = value.get("docUrl").and_then(|v| v.as_str()) {
            return Some(unescape_path_separators(url));
        }
    }

    DOC_URL_FIELD_RE
        .captures(payload)
        .and_then(|captures| captures.get(1).map(|m| m.as_str()))
        .map(unescape_path_separators)
}

/// Strategy 3: first literal direct-file URL in the raw text.
fn from_raw_text(body: &str) -> Option<String> {
    PDF_URL_RE.find(body).map(|m| m.as_str().to_string())
}

fn unescape_path_separators(url: &str) -> String {
    url.replace(r"\/", "/")
}

/// Appends the force-download marker unless the URL already ends with it.
fn ensure_force_download(url: String) -> String {
    if url.ends_with(FORCE_DOWNLOAD_MARKER) {
        url
    } else {
        format!("{url}{FORCE_DOWNLOAD_MARKER}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_input_strategy() {
        let body = r#"<form><input name="url" type="hidden" value="https://cdn.example/doc123.pdf"></form>"#;
        assert_eq!(
            extract_direct_url(body),
            Resolution::Found("https://cdn.example/doc123.pdf?dl=1".to_string())
        );
    }

    #[test]
    fn test_hidden_input_marker_not_duplicated() {
        let body = r#"<input name="url" type="hidden" value="https://cdn.example/doc123.pdf?dl=1">"#;
        assert_eq!(
            extract_direct_url(body),
            Resolution::Found("https://cdn.example/doc123.pdf?dl=1".to_string())
        );
    }

    #[test]
    fn test_init_doc_strategy_with_escaped_separators() {
        let body = r#"<script>Docs.initDoc({"docUrl":"https:\/\/cdn.example\/docs\/issue.pdf","id":1});</script>"#;
        assert_eq!(
            extract_direct_url(body),
            Resolution::Found("https://cdn.example/docs/issue.pdf?dl=1".to_string())
        );
    }

    #[test]
    fn test_init_doc_strategy_non_strict_json_payload() {
        // Some page variants emit trailing garbage the JSON parser rejects;
        // the field-level scan must still recover docUrl.
        let body = r#"Docs.initDoc({"docUrl": "https:\/\/cdn.example\/x.pdf", bad: unquoted})"#;
        assert_eq!(
            extract_direct_url(body),
            Resolution::Found("https://cdn.example/x.pdf?dl=1".to_string())
        );
    }

    #[test]
    fn test_raw_text_fallback_strategy() {
        let body = "nothing structured here, but https://files.example/issues/mag.pdf appears";
        assert_eq!(
            extract_direct_url(body),
            Resolution::Found("https://files.example/issues/mag.pdf?dl=1".to_string())
        );
    }

    #[test]
    fn test_strategy_priority_hidden_input_wins() {
        let body = r#"
            <input name="url" type="hidden" value="https://cdn.example/from-input.pdf">
            <script>Docs.initDoc({"docUrl":"https:\/\/cdn.example\/from-init.pdf"})</script>
            https://cdn.example/from-text.pdf
        "#;
        assert_eq!(
            extract_direct_url(body),
            Resolution::Found("https://cdn.example/from-input.pdf?dl=1".to_string())
        );
    }

    #[test]
    fn test_init_doc_outranks_raw_text() {
        let body = r#"
            <script>Docs.initDoc({"docUrl":"https:\/\/cdn.example\/from-init.pdf"})</script>
            https://cdn.example/from-text.pdf
        "#;
        assert_eq!(
            extract_direct_url(body),
            Resolution::Found("https://cdn.example/from-init.pdf?dl=1".to_string())
        );
    }

    #[test]
    fn test_no_strategy_matches_is_not_found() {
        assert_eq!(
            extract_direct_url("<html><body>layout changed again</body></html>"),
            Resolution::NotFound
        );
    }

    #[test]
    fn test_init_doc_without_doc_url_key() {
        let body = r#"Docs.initDoc({"id": 42, "title": "x"})"#;
        assert_eq!(extract_direct_url(body), Resolution::NotFound);
    }
}
