//! Content wizard API endpoints
//!
//! Handles HTTP requests for the generation wizard:
//! - POST /api/v1/content - Start a generation run
//! - GET  /api/v1/content?session_id= - Poll a run's state
//! - POST /api/v1/content/approve - Approve or reject a suggestion
//! - POST /api/v1/content/publish - Publish or schedule the agreed content

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{FinalContent, SessionKind, SessionStatus, SuggestionType};
use crate::services::{DecisionInput, PublishInput, StartContentInput};

/// Request body for starting a generation run
#[derive(Debug, Deserialize)]
pub struct StartContentRequest {
    #[serde(alias = "type")]
    pub kind: SessionKind,
    pub user_input: Option<String>,
    pub scenario: Option<String>,
    #[serde(default)]
    pub ai_mode: bool,
}

/// Response for a started run
#[derive(Debug, Serialize)]
pub struct StartContentResponse {
    pub session_id: String,
    pub status: SessionStatus,
    pub linkedin_urn: Option<String>,
}

/// Query parameters for polling a run
#[derive(Debug, Deserialize)]
pub struct PollQuery {
    pub session_id: String,
}

/// Response for a polled run
#[derive(Debug, Serialize)]
pub struct SessionStateResponse {
    pub session_id: String,
    pub status: SessionStatus,
    pub kind: SessionKind,
    pub user_input: String,
    pub suggestions: Option<serde_json::Value>,
    pub final_content: Option<FinalContent>,
    pub published_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub linkedin_post_id: Option<String>,
}

/// Request body for a decision on a suggestion
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub session_id: String,
    pub approved: bool,
    pub suggestion_type: SuggestionType,
    pub rejection_reason: Option<String>,
}

/// Response for a decision
#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub status: &'static str,
    pub session_status: SessionStatus,
    pub linkedin_urn: Option<String>,
}

/// When the content should go out
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishType {
    Now,
    Schedule,
}

/// Request body for publishing
#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub session_id: String,
    pub publish_type: PublishType,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub final_content: FinalContent,
}

/// Build the content wizard router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(start_content).get(poll_content))
        .route("/approve", post(decide))
        .route("/publish", post(publish))
}

/// POST /api/v1/content - Start a generation run
async fn start_content(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<StartContentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .content_service
        .start(
            user.0.id,
            StartContentInput {
                kind: body.kind,
                user_input: body.user_input,
                scenario: body.scenario,
                ai_mode: body.ai_mode,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(StartContentResponse {
            session_id: outcome.session.id,
            status: outcome.session.status,
            linkedin_urn: outcome.linkedin_urn,
        }),
    ))
}

/// GET /api/v1/content?session_id= - Poll a run's state
async fn poll_content(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<PollQuery>,
) -> Result<Json<SessionStateResponse>, ApiError> {
    let snapshot = state
        .content_service
        .get_session(user.0.id, &query.session_id)
        .await?;

    let session = snapshot.session;
    let suggestions = session
        .suggestions
        .as_deref()
        .and_then(|s| serde_json::from_str(s).ok());
    let final_content = session.parsed_final_content();

    Ok(Json(SessionStateResponse {
        session_id: session.id,
        status: session.status,
        kind: session.kind,
        user_input: session.user_input,
        suggestions,
        final_content,
        published_at: session.published_at,
        scheduled_at: session.scheduled_at,
        error: session.error,
        linkedin_post_id: snapshot.linkedin_post_id,
    }))
}

/// POST /api/v1/content/approve - Approve or reject a suggestion
async fn decide(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<DecisionRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    let approved = body.approved;
    let outcome = state
        .content_service
        .decide(
            user.0.id,
            DecisionInput {
                session_id: body.session_id,
                approved,
                suggestion_type: body.suggestion_type,
                rejection_reason: body.rejection_reason,
            },
        )
        .await?;

    Ok(Json(DecisionResponse {
        status: if approved { "approved" } else { "rejected" },
        session_status: outcome.session.status,
        linkedin_urn: outcome.linkedin_urn,
    }))
}

/// POST /api/v1/content/publish - Publish or schedule the agreed content
async fn publish(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<PublishRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .content_service
        .publish(
            user.0.id,
            PublishInput {
                session_id: body.session_id,
                publish_now: matches!(body.publish_type, PublishType::Now),
                scheduled_date: body.scheduled_date,
                final_content: body.final_content,
            },
        )
        .await?;

    Ok(Json(serde_json::json!({
        "session_id": outcome.session.id,
        "status": outcome.session.status,
        "post_id": outcome.post.id,
        "linkedin_post_id": outcome.post.linkedin_post_id,
        "published_at": outcome.post.published_at,
        "scheduled_at": outcome.post.scheduled_at,
    })))
}
