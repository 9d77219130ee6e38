//! Content session API endpoints
//!
//! Handles HTTP requests for session history:
//! - GET  /api/v1/content-sessions - List sessions with their posts
//! - POST /api/v1/content-sessions/refresh - Promote stuck sessions

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::posts::Pagination;
use crate::models::{ContentSession, ListParams};
use crate::services::SessionOverview;

/// Query parameters for listing sessions
#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    50
}

/// Response for the sessions list
#[derive(Debug, Serialize)]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionOverview>,
    pub pagination: Pagination,
}

/// Response for a refresh sweep
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub updated: usize,
    pub sessions: Vec<ContentSession>,
}

/// Build the content sessions router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sessions))
        .route("/refresh", post(refresh_sessions))
}

/// GET /api/v1/content-sessions - List sessions with their posts
async fn list_sessions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Json<ListSessionsResponse>, ApiError> {
    let params = ListParams::new(query.page, query.limit);
    let page = state
        .content_service
        .list_sessions(user.0.id, &params)
        .await?;

    let pagination = Pagination::from(&page);
    Ok(Json(ListSessionsResponse {
        sessions: page.items,
        pagination,
    }))
}

/// POST /api/v1/content-sessions/refresh - Promote stuck sessions
///
/// Scans the caller's `IN_PROGRESS` sessions whose stored publish reply
/// names a post and promotes them, recovering the share URN and
/// publication time from the reply text.
async fn refresh_sessions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<RefreshResponse>, ApiError> {
    let sessions = state.content_service.refresh_user(user.0.id).await?;

    Ok(Json(RefreshResponse {
        updated: sessions.len(),
        sessions,
    }))
}
