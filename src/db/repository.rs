//! User repository for feedling.

use sqlx::SqlitePool;

use super::user::{NewUser, User, UserRow};
use crate::{FeedlingError, Result};

const USER_COLUMNS: &str = "id, username, email, password, created_at";

/// Repository for user CRUD operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// A duplicate email is reported as [`FeedlingError::Conflict`].
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let query =
            format!("INSERT INTO users (username, email, password) VALUES (?, ?, ?) RETURNING {USER_COLUMNS}");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.password)
            .fetch_one(self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    FeedlingError::Conflict("a user with this email already exists".to_string())
                }
                e => FeedlingError::Database(e.to_string()),
            })?;

        Ok(row.into())
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FeedlingError::Database(e.to_string()))?;

        Ok(row.map(User::from))
    }

    /// Get a user by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(email)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| FeedlingError::Database(e.to_string()))?;

        Ok(row.map(User::from))
    }

    /// Check if an email is already registered (case-insensitive).
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
            .bind(email)
            .fetch_one(self.pool)
            .await
            .map_err(|e| FeedlingError::Database(e.to_string()))?;
        Ok(exists)
    }

    /// Delete a user by ID.
    ///
    /// Folders and subscriptions are removed by cascade.
    /// Returns true if a user was deleted, false if not found.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| FeedlingError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await
            .map_err(|e| FeedlingError::Database(e.to_string()))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo
            .create(&NewUser::new("alice", "alice@example.com", "hash"))
            .await
            .unwrap();

        assert!(user.id > 0);
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.password, "hash");
    }

    #[tokio::test]
    async fn test_create_duplicate_email_is_conflict() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        repo.create(&NewUser::new("alice", "alice@example.com", "hash"))
            .await
            .unwrap();
        let err = repo
            .create(&NewUser::new("other", "ALICE@example.com", "hash"))
            .await
            .unwrap_err();

        assert!(matches!(err, FeedlingError::Conflict(_)));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_by_email_case_insensitive() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let created = repo
            .create(&NewUser::new("bob", "Bob@Example.com", "hash"))
            .await
            .unwrap();

        let found = repo.get_by_email("bob@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(repo.email_exists("BOB@EXAMPLE.COM").await.unwrap());
        assert!(!repo.email_exists("carol@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        assert!(repo.get_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_user() {
        let db = setup_db().await;
        let repo = UserRepository::new(db.pool());

        let user = repo
            .create(&NewUser::new("dave", "dave@example.com", "hash"))
            .await
            .unwrap();

        assert!(repo.delete(user.id).await.unwrap());
        assert!(!repo.delete(user.id).await.unwrap());
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
    }
}
