//! Feed, subscription and folder types for feedling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ErrorKind;

/// Title used when neither the page nor the feed supplies one.
pub const UNTITLED_FEED: &str = "Untitled Feed";

/// A feed reference found on a web page, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedLinkCandidate {
    /// Value of the `title` attribute (may be empty).
    #[serde(default)]
    pub title: String,
    /// Value of the `href` attribute.
    pub href: String,
}

impl FeedLinkCandidate {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
        }
    }
}

/// A stored syndication source, shared by every subscriber of its URL.
#[derive(Debug, Clone, Serialize)]
pub struct Feed {
    pub id: i64,
    pub url: String,
    pub title: String,
    /// Last time the feed was fetched through this service.
    pub last_checked: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Normalized snapshot of a fetched feed. Never stored.
#[derive(Debug, Clone, Serialize)]
pub struct FeedContent {
    pub title: String,
    pub description: Option<String>,
    /// Link to the site the feed belongs to.
    pub link: Option<String>,
    pub items: Vec<FeedItem>,
}

/// One entry of a fetched feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    pub title: String,
    /// Full content body, when the feed carries one.
    pub content: Option<String>,
    /// Summary or description.
    pub description: Option<String>,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

/// A user's binding to a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    pub feed_id: i64,
    pub folder_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A subscription joined with its feed's title and URL.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionView {
    pub id: i64,
    pub feed_id: i64,
    pub folder_id: Option<i64>,
    pub title: String,
    pub url: String,
    pub last_checked: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Result of a single subscribe call.
#[derive(Debug, Clone)]
pub struct SubscribeOutcome {
    pub subscription: Subscription,
    /// False when the user was already subscribed and the existing row was returned.
    pub created: bool,
}

/// A grouping container for subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folder {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A candidate that was committed by a batch add.
#[derive(Debug, Clone, Serialize)]
pub struct SubscribedFeed {
    #[serde(flatten)]
    pub subscription: SubscriptionView,
    pub created: bool,
}

/// A candidate that a batch add could not commit.
#[derive(Debug, Clone, Serialize)]
pub struct FailedCandidate {
    pub href: String,
    pub title: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Outcome of adding several candidates.
///
/// Each candidate commits on its own, so earlier successes stay committed
/// even when a later candidate fails.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AddSubscriptionsReport {
    pub subscribed: Vec<SubscribedFeed>,
    pub failed: Vec<FailedCandidate>,
    /// Candidates not attempted because the batch stopped on a storage error.
    pub skipped: Vec<FeedLinkCandidate>,
}

impl AddSubscriptionsReport {
    /// True if any candidate was not committed.
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty() || !self.skipped.is_empty()
    }
}
