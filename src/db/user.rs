//! User model for feedling.

use chrono::{DateTime, Utc};

use crate::datetime::parse_datetime_or_now;

/// Registered user.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Display username.
    pub username: String,
    /// Login email address (unique, case-insensitive).
    pub email: String,
    /// Password hash (Argon2).
    pub password: String,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Row type for users.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct UserRow {
    id: i64,
    username: String,
    email: String,
    password: String,
    created_at: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            password: row.password,
            created_at: parse_datetime_or_now(&row.created_at),
        }
    }
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display username.
    pub username: String,
    /// Login email address.
    pub email: String,
    /// Password hash (should be pre-hashed with Argon2).
    pub password: String,
}

impl NewUser {
    /// Create a new user record.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}
