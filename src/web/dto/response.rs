//! Response DTOs for the web API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::AccountSession;
use crate::db::User;
use crate::feed::FeedLinkCandidate;

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Public user profile. Never includes the password hash.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Response to register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Session token (JWT).
    pub token: String,
    /// Always "Bearer".
    pub token_type: &'static str,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

impl AuthResponse {
    pub fn new(session: AccountSession, expires_in: i64) -> Self {
        Self {
            token: session.token,
            token_type: "Bearer",
            expires_in,
            user: session.user.into(),
        }
    }
}

/// Feeds found on a page.
#[derive(Debug, Serialize)]
pub struct DiscoverResponse {
    pub url: String,
    pub feeds: Vec<FeedLinkCandidate>,
}

/// IDs removed by a delete request.
#[derive(Debug, Serialize)]
pub struct DeleteSubscriptionsResponse {
    pub deleted: Vec<i64>,
}
