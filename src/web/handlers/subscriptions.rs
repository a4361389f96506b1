//! Subscription handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::feed::{AddSubscriptionsReport, FeedContent, SubscriptionView};
use crate::web::dto::{
    AddSubscriptionsRequest, ApiResponse, DeleteSubscriptionsRequest,
    DeleteSubscriptionsResponse, SubscribeFromPageRequest, SubscriptionListQuery, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// 200 when every candidate was committed, 207 otherwise.
fn report_status(report: &AddSubscriptionsReport) -> StatusCode {
    if report.is_partial() {
        StatusCode::MULTI_STATUS
    } else {
        StatusCode::OK
    }
}

/// GET /api/subscriptions - List the caller's subscriptions.
pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Query(query): Query<SubscriptionListQuery>,
) -> Result<Json<ApiResponse<Vec<SubscriptionView>>>, ApiError> {
    let subscriptions = state
        .feed_service()
        .list_subscriptions(&identity, query.folder_id)
        .await?;
    Ok(Json(ApiResponse::new(subscriptions)))
}

/// POST /api/subscriptions - Subscribe to discovered feeds.
pub async fn add_subscriptions(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    ValidatedJson(req): ValidatedJson<AddSubscriptionsRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AddSubscriptionsReport>>), ApiError> {
    let report = state
        .feed_service()
        .add_subscriptions(&identity, req.feeds, req.folder_id)
        .await?;
    Ok((report_status(&report), Json(ApiResponse::new(report))))
}

/// POST /api/subscriptions/from-page - Subscribe to every feed on a page.
pub async fn subscribe_from_page(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    ValidatedJson(req): ValidatedJson<SubscribeFromPageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AddSubscriptionsReport>>), ApiError> {
    let report = state
        .feed_service()
        .subscribe_from_page(&identity, &req.url, req.folder_id)
        .await?;
    Ok((report_status(&report), Json(ApiResponse::new(report))))
}

/// DELETE /api/subscriptions - Delete subscriptions by ID.
pub async fn delete_subscriptions(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    ValidatedJson(req): ValidatedJson<DeleteSubscriptionsRequest>,
) -> Result<Json<ApiResponse<DeleteSubscriptionsResponse>>, ApiError> {
    let deleted = state
        .feed_service()
        .delete_subscriptions(&identity, &req.ids)
        .await?;
    Ok(Json(ApiResponse::new(DeleteSubscriptionsResponse { deleted })))
}

/// GET /api/subscriptions/:id/content - Fetch a subscribed feed.
pub async fn subscription_content(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<FeedContent>>, ApiError> {
    let content = state
        .feed_service()
        .fetch_subscription_content(&identity, id)
        .await?;
    Ok(Json(ApiResponse::new(content)))
}
