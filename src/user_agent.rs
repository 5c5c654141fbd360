//! Shared User-Agent string for all outbound requests.
//!
//! The listing site and the hosting pages serve different markup to
//! non-browser clients, so every request in a run presents the same
//! browser-like identity.

/// Browser-like User-Agent sent on listing, detail, hosting, and file requests.
pub(crate) const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
