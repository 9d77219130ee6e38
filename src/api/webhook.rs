//! Public webhook ingress
//!
//! - POST /webhook/{id} - Accept content pushed by an n8n workflow
//! - GET  /webhook/{id} - Liveness check for a registered webhook id
//!
//! These endpoints are unauthenticated: the workflow identifies the owning
//! user through the webhook id embedded in its registered URL.

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{PostStatus, SessionStatus};

/// Response for an accepted webhook payload
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    pub message: &'static str,
    pub post_id: i64,
    pub session_id: String,
    pub content: String,
    pub post_status: PostStatus,
    pub session_status: SessionStatus,
}

/// Response for the liveness check
#[derive(Debug, Serialize)]
pub struct WebhookStatusResponse {
    pub success: bool,
    pub message: &'static str,
    pub webhook_id: String,
    pub status: &'static str,
}

/// Build the public webhook router
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", post(ingest).get(check))
}

/// GET /webhook/{id} - Confirm the webhook id maps to a registered config
async fn check(
    State(state): State<AppState>,
    Path(webhook_id): Path<String>,
) -> Result<Json<WebhookStatusResponse>, ApiError> {
    state.content_service.lookup_webhook(&webhook_id).await?;

    Ok(Json(WebhookStatusResponse {
        success: true,
        message: "Webhook active",
        webhook_id,
        status: "active",
    }))
}

/// POST /webhook/{id} - Store pushed content as a post and session
async fn ingest(
    State(state): State<AppState>,
    Path(webhook_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<IngestResponse>, ApiError> {
    let outcome = state
        .content_service
        .ingest_webhook(&webhook_id, payload)
        .await?;

    tracing::info!(
        post_id = outcome.post.id,
        session_id = %outcome.session.id,
        "webhook content ingested"
    );

    Ok(Json(IngestResponse {
        success: true,
        message: "Content received",
        post_id: outcome.post.id,
        session_id: outcome.session.id.clone(),
        content: outcome.post.content.clone(),
        post_status: outcome.post.status,
        session_status: outcome.session.status,
    }))
}
