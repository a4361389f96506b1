//! Page and feed fetcher with security measures.
//!
//! Fetches HTML pages for discovery and RSS/Atom feeds for reading, with
//! SSRF protection, timeouts and size limits. Parsing is delegated to
//! `feed-rs`.

use std::net::IpAddr;
use std::time::Duration;

use feed_rs::parser;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::types::{FeedContent, FeedItem, UNTITLED_FEED};
use crate::config::FetchConfig;

/// User agent string for outbound requests.
const USER_AGENT: &str = concat!("feedling/", env!("CARGO_PKG_VERSION"), " (Feed Reader)");

/// Maximum length for a plain-text description.
pub const MAX_DESCRIPTION_LENGTH: usize = 10000;

/// Fetch failures. The underlying cause is kept in the message.
#[derive(Error, Debug)]
pub enum FetchError {
    /// URL could not be parsed or uses an unsupported scheme.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// URL points at a loopback, private or reserved host.
    #[error("forbidden host: {0}")]
    ForbiddenHost(String),

    /// Network or protocol failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Remote answered with a non-2xx status.
    #[error("HTTP error: {0}")]
    Status(StatusCode),

    /// Body exceeded the configured limit.
    #[error("response too large: more than {max} bytes")]
    TooLarge { max: u64 },

    /// Page is not HTML.
    #[error("unsupported content type: {0}")]
    UnsupportedContent(String),

    /// Body is not a valid RSS/Atom/JSON feed.
    #[error("failed to parse feed: {0}")]
    Parse(#[from] parser::ParseFeedError),
}

/// A fetched HTML page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: Url,
    pub body: String,
}

/// HTTP fetcher for pages and feeds.
///
/// Holds one pooled client; clone freely.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
    max_page_size: u64,
    max_feed_size: u64,
    max_items: usize,
    allow_private_hosts: bool,
}

impl FeedFetcher {
    /// Create a fetcher from configuration.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let allow_private_hosts = config.allow_private_hosts;
        let max_redirects = config.max_redirects;

        // Every redirect hop gets the same host check as the original URL
        let redirect_policy = reqwest::redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= max_redirects {
                attempt.error("too many redirects")
            } else if !allow_private_hosts && check_host(attempt.url()).is_err() {
                attempt.stop()
            } else {
                attempt.follow()
            }
        });

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(redirect_policy)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            max_page_size: config.max_page_size_bytes,
            max_feed_size: config.max_feed_size_bytes,
            max_items: config.max_items,
            allow_private_hosts,
        })
    }

    /// Validate a URL against the configured host policy.
    pub fn validate(&self, url: &str) -> Result<Url, FetchError> {
        if self.allow_private_hosts {
            parse_http_url(url)
        } else {
            validate_url(url)
        }
    }

    /// Fetch an HTML page for feed discovery.
    pub async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let url = self.validate(url)?;
        debug!(url = %url, "Fetching page");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_html_like(content_type) {
                return Err(FetchError::UnsupportedContent(content_type.to_string()));
            }
        }

        let final_url = response.url().clone();
        let bytes = read_limited(response, self.max_page_size).await?;

        Ok(FetchedPage {
            url: final_url,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    /// Fetch and parse a feed.
    ///
    /// Each call is a fresh fetch; nothing is cached or retried.
    pub async fn fetch_feed(&self, url: &str) -> Result<FeedContent, FetchError> {
        let url = self.validate(url)?;
        debug!(url = %url, "Fetching feed");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let bytes = read_limited(response, self.max_feed_size).await?;
        parse_feed(&bytes, self.max_items)
    }
}

/// Read a response body, failing as soon as it exceeds `max` bytes.
async fn read_limited(mut response: reqwest::Response, max: u64) -> Result<Vec<u8>, FetchError> {
    if let Some(content_length) = response.content_length() {
        if content_length > max {
            return Err(FetchError::TooLarge { max });
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if (body.len() + chunk.len()) as u64 > max {
            return Err(FetchError::TooLarge { max });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Whether a Content-Type header looks like a page we can scan.
fn is_html_like(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ct.contains("html") || ct.contains("xml") || ct.starts_with("text/")
}

/// Parse a URL and require an http(s) scheme with a host.
fn parse_http_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url.trim()).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported URL scheme: {}",
                scheme
            )));
        }
    }

    if parsed.host().is_none() {
        return Err(FetchError::InvalidUrl("URL has no host".to_string()));
    }

    Ok(parsed)
}

/// Validate a URL for SSRF protection.
///
/// This function checks that:
/// - The URL uses http or https scheme
/// - The host is not a private/loopback address
/// - The host is not a reserved hostname
pub fn validate_url(url: &str) -> Result<Url, FetchError> {
    let parsed = parse_http_url(url)?;
    check_host(&parsed)?;
    Ok(parsed)
}

fn check_host(url: &Url) -> Result<(), FetchError> {
    let host = url
        .host()
        .ok_or_else(|| FetchError::InvalidUrl("URL has no host".to_string()))?;

    match host {
        url::Host::Domain(domain) => {
            if is_forbidden_hostname(domain) {
                return Err(FetchError::ForbiddenHost(domain.to_string()));
            }
        }
        url::Host::Ipv4(ipv4) => {
            let ip = IpAddr::V4(ipv4);
            if is_private_ip(&ip) {
                return Err(FetchError::ForbiddenHost(format!("private IP address {}", ip)));
            }
        }
        url::Host::Ipv6(ipv6) => {
            let ip = IpAddr::V6(ipv6);
            if is_private_ip(&ip) {
                return Err(FetchError::ForbiddenHost(format!("private IP address {}", ip)));
            }
        }
    }

    Ok(())
}

/// Check if a hostname is forbidden.
fn is_forbidden_hostname(host: &str) -> bool {
    let host_lower = host.to_lowercase();

    if host_lower == "localhost" {
        return true;
    }

    let forbidden_suffixes = [
        ".local",
        ".localhost",
        ".internal",
        ".intranet",
        ".corp",
        ".home",
        ".lan",
    ];

    forbidden_suffixes
        .iter()
        .any(|suffix| host_lower.ends_with(suffix))
}

/// Check if an IP address is private/reserved.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();

            ipv4.is_loopback()
                || ipv4.is_private()
                || ipv4.is_link_local()
                || ipv4.is_broadcast()
                || ipv4.is_unspecified()
                // Documentation: 192.0.2.0/24, 198.51.100.0/24, 203.0.113.0/24
                || (octets[0] == 192 && octets[1] == 0 && octets[2] == 2)
                || (octets[0] == 198 && octets[1] == 51 && octets[2] == 100)
                || (octets[0] == 203 && octets[1] == 0 && octets[2] == 113)
        }
        IpAddr::V6(ipv6) => {
            if ipv6.is_loopback() || ipv6.is_unspecified() {
                return true;
            }

            // IPv4-mapped addresses inherit the IPv4 rules
            if let Some(ipv4) = ipv6.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(ipv4));
            }

            let segments = ipv6.segments();
            // Unique local: fc00::/7
            (segments[0] & 0xfe00) == 0xfc00
                // Link-local: fe80::/10
                || (segments[0] & 0xffc0) == 0xfe80
        }
    }
}

/// Parse feed bytes into normalized content, keeping at most `max_items` items.
pub fn parse_feed(bytes: &[u8], max_items: usize) -> Result<FeedContent, FetchError> {
    let feed = parser::parse(bytes)?;

    let title = feed
        .title
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED_FEED.to_string());

    let description = feed
        .description
        .map(|d| strip_html(&d.content))
        .filter(|d| !d.is_empty());

    let link = feed.links.first().map(|l| l.href.clone());

    let items = feed
        .entries
        .into_iter()
        .take(max_items)
        .map(|entry| FeedItem {
            title: entry
                .title
                .map(|t| t.content)
                .unwrap_or_else(|| "Untitled".to_string()),
            content: entry.content.and_then(|c| c.body),
            description: entry
                .summary
                .map(|t| truncate_description(&strip_html(&t.content)))
                .filter(|d| !d.is_empty()),
            link: entry.links.first().map(|l| l.href.clone()),
            published: entry.published.or(entry.updated),
        })
        .collect();

    Ok(FeedContent {
        title,
        description,
        link,
        items,
    })
}

/// Strip HTML tags from text and decode common entities.
fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut in_entity = false;
    let mut entity = String::new();

    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            '&' if !in_tag => {
                in_entity = true;
                entity.clear();
            }
            ';' if in_entity => {
                in_entity = false;
                match entity.as_str() {
                    "amp" => result.push('&'),
                    "lt" => result.push('<'),
                    "gt" => result.push('>'),
                    "quot" => result.push('"'),
                    "apos" => result.push('\''),
                    "nbsp" => result.push(' '),
                    _ if entity.starts_with('#') => {
                        if let Some(c) = parse_numeric_entity(&entity).and_then(char::from_u32) {
                            result.push(c);
                        }
                    }
                    _ => {
                        // Unknown entity, keep as-is
                        result.push('&');
                        result.push_str(&entity);
                        result.push(';');
                    }
                }
            }
            _ if in_entity => entity.push(ch),
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }

    result.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Parse a numeric HTML entity (e.g., "#123" or "#x7B").
fn parse_numeric_entity(entity: &str) -> Option<u32> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok()
    } else {
        entity.strip_prefix('#')?.parse().ok()
    }
}

/// Truncate description to maximum length in characters.
fn truncate_description(text: &str) -> String {
    text.chars().take(MAX_DESCRIPTION_LENGTH).collect()
}
