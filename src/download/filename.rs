//! Canonical filename derivation from issue titles.
//!
//! Listing titles look like `"The Economist USA, March 14, 2024"`. The
//! filename keeps the edition tag and a compact date so issues sort
//! chronologically on disk: `The_Economist_USA_20240314.pdf`.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Edition tag used when the title carries no recognizable edition.
const DEFAULT_EDITION: &str = "INT";

/// Date token used when the title carries no recognizable date.
const UNKNOWN_DATE: &str = "unknown_date";

static DATE_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(\w+\s+\d{1,2},?\s+20\d{2})")
        .unwrap_or_else(|e| panic!("invalid static regex: {e}"))
});

/// Derives the canonical filename for an issue from its listing title.
///
/// The embedded date expression is normalized to `YYYYMMDD`; a date that
/// matches the pattern but fails to parse keeps its token with spaces
/// replaced by underscores. The edition is `UK` or `USA` when present in the
/// title, else a generic tag.
#[must_use]
pub fn derive_filename(title: &str, prefix: &str) -> String {
    let date = DATE_TOKEN_RE
        .find(title)
        .map_or_else(|| UNKNOWN_DATE.to_string(), |m| normalize_date(m.as_str()));
    let edition = detect_edition(title);
    format!("{prefix}_{edition}_{date}.pdf")
}

fn normalize_date(token: &str) -> String {
    NaiveDate::parse_from_str(token, "%B %d, %Y")
        .or_else(|_| NaiveDate::parse_from_str(token, "%B %d %Y"))
        .map_or_else(
            |_| token.replace(' ', "_"),
            |date| date.format("%Y%m%d").to_string(),
        )
}

fn detect_edition(title: &str) -> &'static str {
    if title.contains("UK") {
        "UK"
    } else if title.contains("USA") {
        "USA"
    } else {
        DEFAULT_EDITION
    }
}
