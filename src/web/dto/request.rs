//! Request DTOs for the web API.
//!
//! Field checks here only bound the shape of the input; the account and
//! feed services apply the domain rules.

use serde::Deserialize;
use validator::Validate;

use crate::feed::FeedLinkCandidate;

/// User registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// `?url=` query parameter.
#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    #[serde(default)]
    pub url: String,
}

/// Query for listing subscriptions.
#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionListQuery {
    pub folder_id: Option<i64>,
}

/// Subscribe to a set of discovered feeds.
#[derive(Debug, Deserialize, Validate)]
pub struct AddSubscriptionsRequest {
    #[validate(length(min = 1, max = 100, message = "Between 1 and 100 feeds are required"))]
    pub feeds: Vec<FeedLinkCandidate>,
    #[serde(default)]
    pub folder_id: Option<i64>,
}

/// Discover the feeds on a page and subscribe to all of them.
#[derive(Debug, Deserialize, Validate)]
pub struct SubscribeFromPageRequest {
    #[validate(length(min = 1, message = "URL is required"))]
    pub url: String,
    #[serde(default)]
    pub folder_id: Option<i64>,
}

/// Delete subscriptions by ID.
#[derive(Debug, Deserialize, Validate)]
pub struct DeleteSubscriptionsRequest {
    #[validate(length(min = 1, max = 1000, message = "Between 1 and 1000 ids are required"))]
    pub ids: Vec<i64>,
}

/// Create a folder.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFolderRequest {
    #[validate(length(min = 1, message = "Folder name is required"))]
    pub name: String,
}
