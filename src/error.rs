//! Error types for feedling.

use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::feed::FetchError;

/// Stable error kind that callers can match on without inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or missing input.
    Validation,
    /// Missing, invalid or expired credential.
    Auth,
    /// Duplicate email or other uniqueness conflict.
    Conflict,
    /// Unknown user, feed, folder or subscription.
    NotFound,
    /// The page was fetched but carries no feed links.
    NoFeedsFound,
    /// Remote page or feed unreachable or unparseable.
    Fetch,
    /// Persistence layer failure.
    Storage,
    /// Missing or invalid configuration.
    Config,
    /// Local I/O failure.
    Io,
}

/// Common error type for feedling.
#[derive(Error, Debug)]
pub enum FeedlingError {
    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Uniqueness conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Feed discovery found no feed links on the page.
    #[error("no feed URLs found at {0}")]
    NoFeedsFound(String),

    /// Fetching a remote page or feed failed.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Database error.
    ///
    /// Errors from sqlx are converted automatically.
    #[error("database error: {0}")]
    Database(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FeedlingError {
    /// The stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FeedlingError::Validation(_) => ErrorKind::Validation,
            FeedlingError::Auth(_) => ErrorKind::Auth,
            FeedlingError::Conflict(_) => ErrorKind::Conflict,
            FeedlingError::NotFound(_) => ErrorKind::NotFound,
            FeedlingError::NoFeedsFound(_) => ErrorKind::NoFeedsFound,
            FeedlingError::Fetch(_) => ErrorKind::Fetch,
            FeedlingError::Database(_) => ErrorKind::Storage,
            FeedlingError::Config(_) => ErrorKind::Config,
            FeedlingError::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<sqlx::Error> for FeedlingError {
    fn from(e: sqlx::Error) -> Self {
        FeedlingError::Database(e.to_string())
    }
}

/// Result type alias for feedling operations.
pub type Result<T> = std::result::Result<T, FeedlingError>;
