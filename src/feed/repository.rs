//! Feed, subscription and folder repositories for feedling.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::types::{Feed, Folder, SubscribeOutcome, Subscription, SubscriptionView};
use crate::datetime::{parse_datetime, parse_datetime_or_now};
use crate::{FeedlingError, Result};

const FEED_COLUMNS: &str = "id, url, title, last_checked, created_at";
const SUBSCRIPTION_COLUMNS: &str = "id, user_id, feed_id, folder_id, created_at";
const FOLDER_COLUMNS: &str = "id, user_id, name, created_at";

/// Row type for feeds.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedRow {
    id: i64,
    url: String,
    title: String,
    last_checked: Option<String>,
    created_at: String,
}

impl From<FeedRow> for Feed {
    fn from(row: FeedRow) -> Self {
        Feed {
            id: row.id,
            url: row.url,
            title: row.title,
            last_checked: row.last_checked.and_then(|s| parse_datetime(&s)),
            created_at: parse_datetime_or_now(&row.created_at),
        }
    }
}

/// Row type for subscriptions.
#[derive(Debug, Clone, sqlx::FromRow)]
struct SubscriptionRow {
    id: i64,
    user_id: i64,
    feed_id: i64,
    folder_id: Option<i64>,
    created_at: String,
}

impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Subscription {
            id: row.id,
            user_id: row.user_id,
            feed_id: row.feed_id,
            folder_id: row.folder_id,
            created_at: parse_datetime_or_now(&row.created_at),
        }
    }
}

/// Row type for subscriptions joined with their feed.
#[derive(Debug, Clone, sqlx::FromRow)]
struct SubscriptionViewRow {
    id: i64,
    feed_id: i64,
    folder_id: Option<i64>,
    title: String,
    url: String,
    last_checked: Option<String>,
    created_at: String,
}

impl From<SubscriptionViewRow> for SubscriptionView {
    fn from(row: SubscriptionViewRow) -> Self {
        SubscriptionView {
            id: row.id,
            feed_id: row.feed_id,
            folder_id: row.folder_id,
            title: row.title,
            url: row.url,
            last_checked: row.last_checked.and_then(|s| parse_datetime(&s)),
            created_at: parse_datetime_or_now(&row.created_at),
        }
    }
}

const SUBSCRIPTION_VIEW_SELECT: &str = "SELECT s.id, s.feed_id, s.folder_id, f.title, f.url, \
     f.last_checked, s.created_at \
     FROM subscriptions s JOIN feeds f ON f.id = s.feed_id";

/// Row type for folders.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FolderRow {
    id: i64,
    user_id: i64,
    name: String,
    created_at: String,
}

impl From<FolderRow> for Folder {
    fn from(row: FolderRow) -> Self {
        Folder {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            created_at: parse_datetime_or_now(&row.created_at),
        }
    }
}

/// Repository for shared feed rows.
pub struct FeedRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FeedRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a feed, or update the title of the existing feed with this URL.
    ///
    /// A single `INSERT ... ON CONFLICT DO UPDATE` statement, so concurrent
    /// upserts of the same URL always converge on one row.
    pub async fn upsert(&self, url: &str, title: &str) -> Result<Feed> {
        let query = format!(
            "INSERT INTO feeds (url, title) VALUES (?, ?) \
             ON CONFLICT(url) DO UPDATE SET title = excluded.title \
             RETURNING {FEED_COLUMNS}"
        );
        let row = sqlx::query_as::<_, FeedRow>(&query)
            .bind(url)
            .bind(title)
            .fetch_one(self.pool)
            .await
            .map_err(|e| FeedlingError::Database(e.to_string()))?;

        Ok(row.into())
    }

    /// Get a feed by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Feed>> {
        let query = format!("SELECT {FEED_COLUMNS} FROM feeds WHERE id = ?");
        let row = sqlx::query_as::<_, FeedRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FeedlingError::Database(e.to_string()))?;

        Ok(row.map(Feed::from))
    }

    /// Get a feed by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let query = format!("SELECT {FEED_COLUMNS} FROM feeds WHERE url = ?");
        let row = sqlx::query_as::<_, FeedRow>(&query)
            .bind(url)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FeedlingError::Database(e.to_string()))?;

        Ok(row.map(Feed::from))
    }

    /// Record that the feed with this URL was just fetched.
    ///
    /// Returns false if no stored feed has this URL.
    pub async fn touch_last_checked(&self, url: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE feeds SET last_checked = datetime('now') WHERE url = ?")
            .bind(url)
            .execute(self.pool)
            .await
            .map_err(|e| FeedlingError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Count all feeds.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feeds")
            .fetch_one(self.pool)
            .await
            .map_err(|e| FeedlingError::Database(e.to_string()))?;
        Ok(count)
    }
}

/// Insert-or-lookup rounds before `subscribe` gives up on a racing unsubscribe.
const SUBSCRIBE_ATTEMPTS: usize = 3;

/// Repository for user subscriptions.
pub struct SubscriptionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SubscriptionRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Subscribe a user to a feed.
    ///
    /// If the user is already subscribed, the existing subscription is
    /// returned unchanged with `created = false`. A concurrent unsubscribe
    /// between the insert and the lookup makes the insert run again.
    pub async fn subscribe(
        &self,
        user_id: i64,
        feed_id: i64,
        folder_id: Option<i64>,
    ) -> Result<SubscribeOutcome> {
        let insert = format!(
            "INSERT INTO subscriptions (user_id, feed_id, folder_id) VALUES (?, ?, ?) \
             ON CONFLICT(user_id, feed_id) DO NOTHING \
             RETURNING {SUBSCRIPTION_COLUMNS}"
        );
        let select = format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = ? AND feed_id = ?"
        );

        for _ in 0..SUBSCRIBE_ATTEMPTS {
            let inserted = sqlx::query_as::<_, SubscriptionRow>(&insert)
                .bind(user_id)
                .bind(feed_id)
                .bind(folder_id)
                .fetch_optional(self.pool)
                .await
                .map_err(|e| FeedlingError::Database(e.to_string()))?;

            if let Some(row) = inserted {
                return Ok(SubscribeOutcome {
                    subscription: row.into(),
                    created: true,
                });
            }

            let existing = sqlx::query_as::<_, SubscriptionRow>(&select)
                .bind(user_id)
                .bind(feed_id)
                .fetch_optional(self.pool)
                .await
                .map_err(|e| FeedlingError::Database(e.to_string()))?;

            if let Some(row) = existing {
                return Ok(SubscribeOutcome {
                    subscription: row.into(),
                    created: false,
                });
            }
        }

        Err(FeedlingError::Database(format!(
            "subscription for feed {feed_id} kept disappearing"
        )))
    }

    /// List a user's subscriptions with feed title and URL, oldest first.
    ///
    /// With `folder_id`, only subscriptions in that folder are returned.
    pub async fn list_for_user(
        &self,
        user_id: i64,
        folder_id: Option<i64>,
    ) -> Result<Vec<SubscriptionView>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(SUBSCRIPTION_VIEW_SELECT);
        builder.push(" WHERE s.user_id = ");
        builder.push_bind(user_id);
        if let Some(folder_id) = folder_id {
            builder.push(" AND s.folder_id = ");
            builder.push_bind(folder_id);
        }
        builder.push(" ORDER BY s.id");

        let rows = builder
            .build_query_as::<SubscriptionViewRow>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| FeedlingError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(SubscriptionView::from).collect())
    }

    /// Get one of a user's subscriptions with its feed.
    pub async fn get_for_user(&self, id: i64, user_id: i64) -> Result<Option<SubscriptionView>> {
        let query = format!("{SUBSCRIPTION_VIEW_SELECT} WHERE s.id = ? AND s.user_id = ?");
        let row = sqlx::query_as::<_, SubscriptionViewRow>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FeedlingError::Database(e.to_string()))?;

        Ok(row.map(SubscriptionView::from))
    }

    /// Delete the given subscriptions that belong to `user_id`.
    ///
    /// IDs owned by other users or not present are ignored. Returns the IDs
    /// actually deleted, ascending.
    pub async fn unsubscribe(&self, ids: &[i64], user_id: i64) -> Result<Vec<i64>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("DELETE FROM subscriptions WHERE user_id = ");
        builder.push_bind(user_id);
        builder.push(" AND id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") RETURNING id");

        let mut deleted: Vec<i64> = builder
            .build_query_scalar()
            .fetch_all(self.pool)
            .await
            .map_err(|e| FeedlingError::Database(e.to_string()))?;

        deleted.sort_unstable();
        Ok(deleted)
    }

    /// Count a user's subscriptions.
    pub async fn count_for_user(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| FeedlingError::Database(e.to_string()))?;
        Ok(count)
    }
}

/// Repository for user folders.
pub struct FolderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FolderRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a folder. A duplicate name for the same user is a conflict.
    pub async fn create(&self, user_id: i64, name: &str) -> Result<Folder> {
        let query =
            format!("INSERT INTO folders (user_id, name) VALUES (?, ?) RETURNING {FOLDER_COLUMNS}");
        let row = sqlx::query_as::<_, FolderRow>(&query)
            .bind(user_id)
            .bind(name)
            .fetch_one(self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    FeedlingError::Conflict(format!("folder '{}' already exists", name))
                }
                e => FeedlingError::Database(e.to_string()),
            })?;

        Ok(row.into())
    }

    /// List a user's folders by name.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<Folder>> {
        let query =
            format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE user_id = ? ORDER BY name, id");
        let rows = sqlx::query_as::<_, FolderRow>(&query)
            .bind(user_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| FeedlingError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Folder::from).collect())
    }

    /// Get a folder only if it belongs to `user_id`.
    pub async fn get_owned(&self, id: i64, user_id: i64) -> Result<Option<Folder>> {
        let query = format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ? AND user_id = ?");
        let row = sqlx::query_as::<_, FolderRow>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FeedlingError::Database(e.to_string()))?;

        Ok(row.map(Folder::from))
    }

    /// Delete a folder owned by `user_id`.
    ///
    /// Its subscriptions stay, with no folder. Returns false if not found.
    pub async fn delete(&self, id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await
            .map_err(|e| FeedlingError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}
