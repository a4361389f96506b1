//! Authentication handlers.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use super::AppState;
use crate::auth::{self as account, RegistrationRequest};
use crate::db::UserRepository;
use crate::web::dto::{ApiResponse, AuthResponse, LoginRequest, RegisterRequest, UserInfo, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;
use crate::ErrorKind;

/// POST /api/auth/register - Create an account and log in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    let repo = UserRepository::new(state.db.pool());
    let session = account::register(
        &repo,
        state.codec(),
        RegistrationRequest::new(req.username, req.email, req.password),
    )
    .await?;

    let response = AuthResponse::new(session, state.codec().expiry_secs());
    Ok((StatusCode::CREATED, Json(ApiResponse::new(response))))
}

/// POST /api/auth/login - Log in with email and password.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let repo = UserRepository::new(state.db.pool());
    let session = account::login(&repo, state.codec(), &req.email, &req.password)
        .await
        .map_err(|e| match e.kind() {
            // Unknown email and wrong password look the same to the client
            ErrorKind::NotFound | ErrorKind::Auth => {
                tracing::debug!(error = %e, "Login rejected");
                ApiError::unauthorized()
            }
            _ => e.into(),
        })?;

    let response = AuthResponse::new(session, state.codec().expiry_secs());
    Ok(Json(ApiResponse::new(response)))
}

/// GET /api/auth/me - Current user's profile.
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let repo = UserRepository::new(state.db.pool());
    let user = account::me(&repo, &identity).await?;
    Ok(Json(ApiResponse::new(user.into())))
}

/// DELETE /api/auth/me - Delete the current user's account.
pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
) -> Result<StatusCode, ApiError> {
    let repo = UserRepository::new(state.db.pool());
    account::delete_account(&repo, &identity).await?;
    Ok(StatusCode::NO_CONTENT)
}
