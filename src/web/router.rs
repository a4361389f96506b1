//! Router configuration for the web API.

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    add_subscriptions, create_folder, delete_folder, delete_me, delete_subscriptions,
    discover_feeds, feed_content, list_folders, list_subscriptions, login, me, register,
    subscribe_from_page, subscription_content, AppState,
};
use super::middleware::{create_cors_layer, gate_auth};

/// Create the main API router.
///
/// Every route except register and login needs a bearer token; the
/// [`AuthUser`](super::middleware::AuthUser) extractor enforces it.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me).delete(delete_me));

    let feed_routes = Router::new()
        .route("/discover", get(discover_feeds))
        .route("/content", get(feed_content));

    let subscription_routes = Router::new()
        .route(
            "/",
            get(list_subscriptions)
                .post(add_subscriptions)
                .delete(delete_subscriptions),
        )
        .route("/from-page", post(subscribe_from_page))
        .route("/:id/content", get(subscription_content));

    let folder_routes = Router::new()
        .route("/", get(list_folders).post(create_folder))
        .route("/:id", delete(delete_folder));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/feeds", feed_routes)
        .nest("/subscriptions", subscription_routes)
        .nest("/folders", folder_routes);

    let gate = app_state.gate.clone();

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let gate = gate.clone();
                    gate_auth(gate, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// The full application: API routes plus health check.
pub fn create_app(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    create_router(app_state, cors_origins).merge(create_health_router())
}

async fn health_check() -> &'static str {
    "OK"
}
