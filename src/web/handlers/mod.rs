//! API handlers for the web API.

pub mod auth;
pub mod feeds;
pub mod folders;
pub mod subscriptions;

pub use auth::*;
pub use feeds::*;
pub use folders::*;
pub use subscriptions::*;

use std::sync::Arc;

use crate::auth::{RequestGate, TokenCodec};
use crate::db::Database;
use crate::feed::{FeedFetcher, FeedService, DEFAULT_MAX_NODES};

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Connection pool.
    pub db: Database,
    /// Outbound HTTP client for pages and feeds.
    pub fetcher: FeedFetcher,
    /// Token verification, shared with the auth middleware.
    pub gate: Arc<RequestGate>,
    /// Node-visit budget for page scans.
    pub max_nodes: usize,
}

impl AppState {
    /// Create a new application state.
    pub fn new(db: Database, fetcher: FeedFetcher, gate: Arc<RequestGate>) -> Self {
        Self {
            db,
            fetcher,
            gate,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }

    /// Set the node-visit budget for page scans.
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// The codec used to issue session tokens.
    pub fn codec(&self) -> &TokenCodec {
        self.gate.codec()
    }

    /// A feed service borrowing this state.
    pub fn feed_service(&self) -> FeedService<'_> {
        FeedService::new(&self.db, &self.fetcher).with_max_nodes(self.max_nodes)
    }
}
