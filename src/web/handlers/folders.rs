//! Folder handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::feed::Folder;
use crate::web::dto::{ApiResponse, CreateFolderRequest, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// GET /api/folders - List the caller's folders.
pub async fn list_folders(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<ApiResponse<Vec<Folder>>>, ApiError> {
    let folders = state.feed_service().list_folders(&identity).await?;
    Ok(Json(ApiResponse::new(folders)))
}

/// POST /api/folders - Create a folder.
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateFolderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Folder>>), ApiError> {
    let folder = state
        .feed_service()
        .create_folder(&identity, &req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(folder))))
}

/// DELETE /api/folders/:id - Delete a folder; its subscriptions are kept.
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.feed_service().delete_folder(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
