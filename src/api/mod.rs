//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the relaypost server:
//! - Auth endpoints (register, login, logout, current user)
//! - Post CRUD endpoints
//! - Content generation wizard endpoints
//! - Content session listing and refresh endpoints
//! - Integration settings endpoints (n8n, LinkedIn OAuth)
//! - Stats endpoint
//! - Public webhook ingress

pub mod auth;
pub mod content;
pub mod content_sessions;
pub mod middleware;
pub mod posts;
pub mod settings;
pub mod stats;
pub mod webhook;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Protected routes (need a valid session)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/posts", posts::router())
        .nest("/content", content::router())
        .nest("/content-sessions", content_sessions::router())
        .nest("/stats", stats::router())
        .merge(settings::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/auth", auth::public_router())
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    // CORS must allow credentials for cookie auth
    let cors = CorsLayer::new()
        .allow_origin(
            cors_origin
                .parse::<HeaderValue>()
                .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000")),
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .nest("/webhook", webhook::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
