//! Bearer authentication middleware.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{Identity, RequestGate};
use crate::web::error::ApiError;

/// Extractor for authenticated callers.
///
/// Runs the [`RequestGate`] before the handler body, so a request without a
/// valid bearer token never reaches storage.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            // A header that is not valid UTF-8 is treated like a malformed one
            let header = match parts.headers.get(AUTHORIZATION) {
                Some(value) => Some(value.to_str().unwrap_or_default()),
                None => None,
            };

            // Get the gate from extensions (set by middleware)
            let gate = parts
                .extensions
                .get::<Arc<RequestGate>>()
                .ok_or_else(|| ApiError::internal("Request gate not configured"))?;

            let identity = gate.authorize(header).map_err(|reason| {
                tracing::debug!(%reason, "Bearer authentication failed");
                ApiError::unauthorized()
            })?;

            Ok(AuthUser(identity))
        })
    }
}

/// Middleware function to inject the request gate into request extensions.
pub async fn gate_auth(gate: Arc<RequestGate>, mut request: Request<Body>, next: Next) -> Response {
    request.extensions_mut().insert(gate);
    next.run(request).await
}
