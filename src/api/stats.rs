//! Stats API endpoint
//!
//! - GET /api/v1/stats - Post counts for the dashboard

use axum::{extract::State, routing::get, Json, Router};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::services::PostStats;

/// Build the stats router (requires auth)
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_stats))
}

/// GET /api/v1/stats - Published/scheduled/total post counts
async fn get_stats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<PostStats>, ApiError> {
    let stats = state.post_service.stats(user.0.id).await?;
    Ok(Json(stats))
}
