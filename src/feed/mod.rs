//! Feed discovery, fetching and subscriptions for feedling.
//!
//! - [`discovery`]: finds `<link rel="alternate">` feed references in HTML
//! - [`fetcher`]: retrieves pages and feeds over HTTP and normalizes feeds
//! - [`repository`]: shared feeds, per-user subscriptions and folders
//! - [`service`]: the operations exposed to the web layer

pub mod discovery;
pub mod fetcher;
mod repository;
mod service;
mod types;

pub use discovery::{
    discover_in_html, extract_feed_links, extract_feed_links_from_html, is_feed_link,
    resolve_href, Extraction, DEFAULT_MAX_NODES,
};
pub use fetcher::{parse_feed, validate_url, FeedFetcher, FetchError, FetchedPage};
pub use repository::{FeedRepository, FolderRepository, SubscriptionRepository};
pub use service::{FeedService, MAX_BATCH_SIZE, MAX_FOLDER_NAME_LENGTH};
pub use types::{
    AddSubscriptionsReport, FailedCandidate, Feed, FeedContent, FeedItem, FeedLinkCandidate,
    Folder, SubscribeOutcome, SubscribedFeed, Subscription, SubscriptionView, UNTITLED_FEED,
};
