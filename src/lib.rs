//! feedling - feed aggregation backend
//!
//! Discovers RSS/Atom feeds advertised by any web page and keeps a
//! deduplicated list of per-user subscriptions, fetched on demand.
//!
//! - [`auth`]: session tokens, the request gate and accounts
//! - [`feed`]: feed-link extraction, fetching and the subscription store
//! - [`web`]: the JSON API

pub mod auth;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod feed;
pub mod logging;
pub mod web;

pub use auth::{
    hash_password, validate_password, verify_password, AuthError, Identity, PasswordError,
    RegistrationRequest, RequestGate, SessionClaims, TokenCodec, TokenError, ValidationError,
};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{ErrorKind, FeedlingError, Result};
pub use feed::{FeedFetcher, FeedLinkCandidate, FeedService, FetchError};
pub use web::WebServer;
