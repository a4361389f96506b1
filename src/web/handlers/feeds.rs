//! Feed discovery and content handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::feed::FeedContent;
use crate::web::dto::{ApiResponse, DiscoverResponse, UrlQuery};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// GET /api/feeds/discover?url= - List the feeds a page advertises.
pub async fn discover_feeds(
    State(state): State<Arc<AppState>>,
    AuthUser(_identity): AuthUser,
    Query(query): Query<UrlQuery>,
) -> Result<Json<ApiResponse<DiscoverResponse>>, ApiError> {
    let feeds = state.feed_service().discover_feeds(&query.url).await?;
    Ok(Json(ApiResponse::new(DiscoverResponse {
        url: query.url,
        feeds,
    })))
}

/// GET /api/feeds/content?url= - Fetch and normalize a feed.
pub async fn feed_content(
    State(state): State<Arc<AppState>>,
    AuthUser(_identity): AuthUser,
    Query(query): Query<UrlQuery>,
) -> Result<Json<ApiResponse<FeedContent>>, ApiError> {
    let content = state.feed_service().fetch_feed_content(&query.url).await?;
    Ok(Json(ApiResponse::new(content)))
}
