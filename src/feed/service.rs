//! Feed service for feedling.
//!
//! Ties discovery, fetching and the subscription store together. Every
//! operation that touches a user's rows takes the caller's [`Identity`]
//! explicitly and checks that the account still exists, since tokens
//! outlive deleted accounts.

use tracing::{debug, info, warn};

use super::discovery::{discover_in_html, DEFAULT_MAX_NODES};
use super::fetcher::FeedFetcher;
use super::repository::{FeedRepository, FolderRepository, SubscriptionRepository};
use super::types::{
    AddSubscriptionsReport, FailedCandidate, FeedContent, FeedLinkCandidate, Folder,
    SubscribedFeed, SubscriptionView,
};
use crate::auth::Identity;
use crate::db::{Database, User, UserRepository};
use crate::{FeedlingError, Result};

/// Maximum number of candidates accepted in one batch add.
pub const MAX_BATCH_SIZE: usize = 100;

/// Maximum folder name length in characters.
pub const MAX_FOLDER_NAME_LENGTH: usize = 100;

/// Service for feed discovery and subscription management.
pub struct FeedService<'a> {
    db: &'a Database,
    fetcher: &'a FeedFetcher,
    max_nodes: usize,
}

impl<'a> FeedService<'a> {
    /// Create a new FeedService.
    pub fn new(db: &'a Database, fetcher: &'a FeedFetcher) -> Self {
        Self {
            db,
            fetcher,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }

    /// Set the node-visit budget for page scans.
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Find the feeds a web page advertises.
    ///
    /// The URL is validated before any network access. Relative hrefs are
    /// resolved against the final page URL. A page without feed links is
    /// [`FeedlingError::NoFeedsFound`].
    pub async fn discover_feeds(&self, url: &str) -> Result<Vec<FeedLinkCandidate>> {
        self.fetcher
            .validate(url)
            .map_err(|e| FeedlingError::Validation(e.to_string()))?;

        let page = self.fetcher.fetch_page(url).await?;
        let candidates = discover_in_html(&page.body, &page.url, self.max_nodes);

        if candidates.is_empty() {
            info!(url = %page.url, "No feed links found");
            return Err(FeedlingError::NoFeedsFound(url.trim().to_string()));
        }

        info!(url = %page.url, count = candidates.len(), "Discovered feed links");
        Ok(candidates)
    }

    /// Subscribe the caller to each candidate.
    ///
    /// Best effort per item: each candidate commits on its own. An invalid
    /// candidate is recorded in `failed` and the batch goes on. A storage
    /// failure is recorded, the remaining candidates land in `skipped`, and
    /// the batch stops. Subscribing to a feed twice returns the existing
    /// subscription with `created = false`.
    pub async fn add_subscriptions(
        &self,
        identity: &Identity,
        candidates: Vec<FeedLinkCandidate>,
        folder_id: Option<i64>,
    ) -> Result<AddSubscriptionsReport> {
        if candidates.is_empty() {
            return Err(FeedlingError::Validation(
                "at least one feed is required".to_string(),
            ));
        }
        if candidates.len() > MAX_BATCH_SIZE {
            return Err(FeedlingError::Validation(format!(
                "at most {} feeds can be added at once",
                MAX_BATCH_SIZE
            )));
        }
        self.require_user(identity).await?;
        if let Some(folder_id) = folder_id {
            self.require_folder(identity, folder_id).await?;
        }

        let feeds = FeedRepository::new(self.db.pool());
        let subscriptions = SubscriptionRepository::new(self.db.pool());
        let mut report = AddSubscriptionsReport::default();
        let mut remaining = candidates.into_iter();

        while let Some(candidate) = remaining.next() {
            let url = match self.fetcher.validate(&candidate.href) {
                Ok(url) => url,
                Err(e) => {
                    debug!(href = %candidate.href, error = %e, "Rejected feed candidate");
                    report.failed.push(FailedCandidate {
                        kind: crate::ErrorKind::Validation,
                        message: e.to_string(),
                        href: candidate.href,
                        title: candidate.title,
                    });
                    continue;
                }
            };

            let title = match candidate.title.trim() {
                "" => url.as_str(),
                t => t,
            };

            let committed = async {
                let feed = feeds.upsert(url.as_str(), title).await?;
                let outcome = subscriptions
                    .subscribe(identity.user_id, feed.id, folder_id)
                    .await?;
                Ok::<_, FeedlingError>(SubscribedFeed {
                    subscription: SubscriptionView {
                        id: outcome.subscription.id,
                        feed_id: feed.id,
                        folder_id: outcome.subscription.folder_id,
                        title: feed.title,
                        url: feed.url,
                        last_checked: feed.last_checked,
                        created_at: outcome.subscription.created_at,
                    },
                    created: outcome.created,
                })
            }
            .await;

            match committed {
                Ok(subscribed) => report.subscribed.push(subscribed),
                Err(e) => {
                    warn!(
                        user_id = identity.user_id,
                        href = %candidate.href,
                        error = %e,
                        "Batch add stopped on storage failure"
                    );
                    report.failed.push(FailedCandidate {
                        kind: e.kind(),
                        message: e.to_string(),
                        href: candidate.href,
                        title: candidate.title,
                    });
                    report.skipped.extend(remaining.by_ref());
                    break;
                }
            }
        }

        info!(
            user_id = identity.user_id,
            subscribed = report.subscribed.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "Added subscriptions"
        );
        Ok(report)
    }

    /// Discover the feeds on a page and subscribe the caller to all of them.
    pub async fn subscribe_from_page(
        &self,
        identity: &Identity,
        url: &str,
        folder_id: Option<i64>,
    ) -> Result<AddSubscriptionsReport> {
        self.require_user(identity).await?;
        if let Some(folder_id) = folder_id {
            self.require_folder(identity, folder_id).await?;
        }
        let candidates = self.discover_feeds(url).await?;
        self.add_subscriptions(identity, candidates, folder_id).await
    }

    /// List the caller's subscriptions, optionally limited to one folder.
    pub async fn list_subscriptions(
        &self,
        identity: &Identity,
        folder_id: Option<i64>,
    ) -> Result<Vec<SubscriptionView>> {
        self.require_user(identity).await?;
        if let Some(folder_id) = folder_id {
            self.require_folder(identity, folder_id).await?;
        }
        SubscriptionRepository::new(self.db.pool())
            .list_for_user(identity.user_id, folder_id)
            .await
    }

    /// Delete some of the caller's subscriptions.
    ///
    /// IDs the caller does not own are ignored. Returns the IDs removed.
    pub async fn delete_subscriptions(&self, identity: &Identity, ids: &[i64]) -> Result<Vec<i64>> {
        self.require_user(identity).await?;
        let deleted = SubscriptionRepository::new(self.db.pool())
            .unsubscribe(ids, identity.user_id)
            .await?;

        info!(
            user_id = identity.user_id,
            requested = ids.len(),
            deleted = deleted.len(),
            "Deleted subscriptions"
        );
        Ok(deleted)
    }

    /// Fetch a feed and return a normalized snapshot of its content.
    ///
    /// Marks the feed as checked when it is a stored feed.
    pub async fn fetch_feed_content(&self, url: &str) -> Result<FeedContent> {
        let url = self
            .fetcher
            .validate(url)
            .map_err(|e| FeedlingError::Validation(e.to_string()))?;

        // The fetch runs with no pooled connection checked out
        let content = self.fetcher.fetch_feed(url.as_str()).await?;

        if FeedRepository::new(self.db.pool())
            .touch_last_checked(url.as_str())
            .await?
        {
            debug!(url = %url, "Updated last_checked");
        }
        Ok(content)
    }

    /// Fetch the feed behind one of the caller's subscriptions.
    pub async fn fetch_subscription_content(
        &self,
        identity: &Identity,
        subscription_id: i64,
    ) -> Result<FeedContent> {
        let view = SubscriptionRepository::new(self.db.pool())
            .get_for_user(subscription_id, identity.user_id)
            .await?
            .ok_or_else(|| FeedlingError::NotFound("subscription".to_string()))?;

        let content = self.fetcher.fetch_feed(&view.url).await?;
        FeedRepository::new(self.db.pool())
            .touch_last_checked(&view.url)
            .await?;
        Ok(content)
    }

    /// Create a folder for the caller.
    pub async fn create_folder(&self, identity: &Identity, name: &str) -> Result<Folder> {
        let name = validate_folder_name(name)?;
        self.require_user(identity).await?;
        let folder = FolderRepository::new(self.db.pool())
            .create(identity.user_id, name)
            .await?;

        info!(user_id = identity.user_id, folder_id = folder.id, "Created folder");
        Ok(folder)
    }

    /// List the caller's folders.
    pub async fn list_folders(&self, identity: &Identity) -> Result<Vec<Folder>> {
        self.require_user(identity).await?;
        FolderRepository::new(self.db.pool())
            .list_for_user(identity.user_id)
            .await
    }

    /// Delete one of the caller's folders. Its subscriptions are kept.
    pub async fn delete_folder(&self, identity: &Identity, folder_id: i64) -> Result<()> {
        if !FolderRepository::new(self.db.pool())
            .delete(folder_id, identity.user_id)
            .await?
        {
            return Err(FeedlingError::NotFound("folder".to_string()));
        }
        info!(user_id = identity.user_id, folder_id, "Deleted folder");
        Ok(())
    }

    async fn require_user(&self, identity: &Identity) -> Result<User> {
        UserRepository::new(self.db.pool())
            .get_by_id(identity.user_id)
            .await?
            .ok_or_else(|| FeedlingError::NotFound("user".to_string()))
    }

    async fn require_folder(&self, identity: &Identity, folder_id: i64) -> Result<Folder> {
        FolderRepository::new(self.db.pool())
            .get_owned(folder_id, identity.user_id)
            .await?
            .ok_or_else(|| FeedlingError::NotFound("folder".to_string()))
    }
}

/// Trim and check a folder name.
fn validate_folder_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FeedlingError::Validation(
            "folder name is required".to_string(),
        ));
    }
    if name.chars().count() > MAX_FOLDER_NAME_LENGTH {
        return Err(FeedlingError::Validation(format!(
            "folder name must be at most {} characters",
            MAX_FOLDER_NAME_LENGTH
        )));
    }
    Ok(name)
}
