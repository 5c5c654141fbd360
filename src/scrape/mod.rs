//! Selector-based extraction from listing and detail pages.
//!
//! The listing site's markup is brittle pattern-matching territory, so it is
//! isolated here behind two functions the pipeline calls: [`parse_listing`]
//! for the search/index page and [`parse_detail_links`] for per-issue pages.
//! Neither performs I/O, and malformed blocks are skipped rather than
//! aborting the parse.

use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

/// One issue entry on the listing page. Ephemeral; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingItem {
    /// Issue title as shown on the listing page.
    pub title: String,
    /// Absolute URL of the issue's detail page.
    pub detail_url: String,
}

/// Parses the listing page into issue entries.
///
/// Each `<article>` block is expected to carry an `h2.entry-title > a` with
/// the issue title and detail link. Articles missing either are logged and
/// skipped.
#[must_use]
pub fn parse_listing(html: &str) -> Vec<ListingItem> {
    let document = Html::parse_document(html);

    let Ok(article_selector) = Selector::parse("article") else {
        return Vec::new();
    };
    let Ok(title_link_selector) = Selector::parse("h2.entry-title > a") else {
        return Vec::new();
    };

    let mut items = Vec::new();
    for article in document.select(&article_selector) {
        let Some(link) = article.select(&title_link_selector).next() else {
            warn!("article block without an entry-title link; skipping");
            continue;
        };
        let title = link.text().collect::<String>().trim().to_string();
        let Some(href) = link.value().attr("href") else {
            warn!(title = %title, "entry-title link without href; skipping");
            continue;
        };
        if title.is_empty() {
            warn!(href = %href, "entry-title link with empty title; skipping");
            continue;
        }
        items.push(ListingItem {
            title,
            detail_url: href.to_string(),
        });
    }

    debug!(count = items.len(), "parsed listing page");
    items
}

/// Extracts candidate hosting links from a detail page.
///
/// Only anchors inside the main `div.entry-content` area are considered, and
/// only those pointing at `hosting_domain` (or a subdomain of it) with a
/// document path. Order on the page is preserved; duplicates are dropped.
#[must_use]
pub fn parse_detail_links(html: &str, hosting_domain: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let Ok(content_selector) = Selector::parse("div.entry-content") else {
        return Vec::new();
    };
    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let Some(content) = document.select(&content_selector).next() else {
        warn!("detail page without an entry-content area");
        return Vec::new();
    };

    let mut links = Vec::new();
    for anchor in content.select(&anchor_selector) {
        if let Some(href) = anchor.value().attr("href") {
            if is_hosting_doc_link(href, hosting_domain) && !links.iter().any(|l| l == href) {
                links.push(href.to_string());
            }
        }
    }

    debug!(count = links.len(), "extracted hosting links");
    links
}

/// Returns true for links matching the hosting-domain + document-path pattern.
fn is_hosting_doc_link(href: &str, hosting_domain: &str) -> bool {
    let Ok(url) = Url::parse(href) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    let host_matches =
        host == hosting_domain || host.ends_with(&format!(".{hosting_domain}"));
    host_matches && url.path().starts_with("/doc")
}
