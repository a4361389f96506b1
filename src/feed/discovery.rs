//! Feed-link extraction from HTML pages.
//!
//! A page advertises its feeds with `<link rel="alternate" type="...rss...">`
//! elements. The walk below visits the whole element tree, not just `<head>`,
//! so links placed anywhere in the markup are found.

use scraper::Html;
use tracing::warn;
use url::Url;

use super::types::FeedLinkCandidate;

/// Default node-visit budget for a single page.
pub const DEFAULT_MAX_NODES: usize = 100_000;

/// Candidates found on a page, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub candidates: Vec<FeedLinkCandidate>,
    /// True if the node budget ran out before the walk finished.
    pub truncated: bool,
}

/// Whether a `<link>` element's attributes mark it as a syndication feed.
///
/// `rel` must equal `alternate` and `type` must contain `rss` or `atom`,
/// both compared case-insensitively.
pub fn is_feed_link(rel: Option<&str>, link_type: Option<&str>) -> bool {
    let Some(rel) = rel else {
        return false;
    };
    if !rel.trim().eq_ignore_ascii_case("alternate") {
        return false;
    }

    let link_type = link_type.unwrap_or_default().to_ascii_lowercase();
    link_type.contains("rss") || link_type.contains("atom")
}

/// Collect feed links from a parsed document.
///
/// Depth-first pre-order over an explicit stack, visiting at most
/// `max_nodes` nodes. Duplicates are kept.
pub fn extract_feed_links(document: &Html, max_nodes: usize) -> Extraction {
    let mut extraction = Extraction::default();
    let mut stack = vec![document.tree.root()];
    let mut visited = 0usize;

    while let Some(node) = stack.pop() {
        if visited >= max_nodes {
            extraction.truncated = true;
            break;
        }
        visited += 1;

        if let Some(element) = node.value().as_element() {
            if element.name() == "link" && is_feed_link(element.attr("rel"), element.attr("type")) {
                extraction.candidates.push(FeedLinkCandidate::new(
                    element.attr("title").unwrap_or_default(),
                    element.attr("href").unwrap_or_default(),
                ));
            }
        }

        // Push children last-to-first so the first child is popped next
        let mut child = node.last_child();
        while let Some(c) = child {
            stack.push(c);
            child = c.prev_sibling();
        }
    }

    if extraction.truncated {
        warn!(max_nodes, "Feed link scan stopped at node budget");
    }

    extraction
}

/// Parse an HTML string and collect its feed links.
pub fn extract_feed_links_from_html(html: &str, max_nodes: usize) -> Extraction {
    let document = Html::parse_document(html);
    extract_feed_links(&document, max_nodes)
}

/// Resolve a candidate href against the page it was found on.
///
/// Absolute hrefs are returned unchanged; unresolvable ones are kept as-is.
pub fn resolve_href(href: &str, base: &Url) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    match base.join(href) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => href.to_string(),
    }
}

/// Extract candidates from a page and make their hrefs absolute.
///
/// Candidates without an href are dropped since they cannot be subscribed to.
pub fn discover_in_html(html: &str, page_url: &Url, max_nodes: usize) -> Vec<FeedLinkCandidate> {
    extract_feed_links_from_html(html, max_nodes)
        .candidates
        .into_iter()
        .filter(|c| !c.href.trim().is_empty())
        .map(|c| FeedLinkCandidate {
            href: resolve_href(&c.href, page_url),
            title: c.title,
        })
        .collect()
}
