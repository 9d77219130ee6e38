//! Post API endpoints
//!
//! Handles HTTP requests for posts:
//! - GET    /api/v1/posts - List posts with filters and pagination
//! - POST   /api/v1/posts - Create a post directly
//! - GET    /api/v1/posts/{id} - Get one post with its session
//! - PUT    /api/v1/posts/{id} - Partial update
//! - DELETE /api/v1/posts/{id} - Delete a post

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    ContentSession, CreatePostInput, ListParams, PagedResult, Post, PostStatus, SessionKind,
    UpdatePostInput,
};
use crate::webhook::extract::linkedin_direct_link;

/// Query parameters for listing posts
#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub status: Option<PostStatus>,
    pub source: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

/// One post in the list view, enriched with its owning session
#[derive(Debug, Serialize)]
pub struct PostItem {
    pub id: i64,
    pub content: String,
    pub image_url: Option<String>,
    pub status: PostStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub linkedin_post_id: Option<String>,
    /// Feed link recovered from the session's publish reply
    pub linkedin_direct_link: Option<String>,
    pub session_kind: SessionKind,
    pub user_input: String,
    pub publish_response: Option<String>,
}

impl PostItem {
    fn new(post: Post, session: Option<&ContentSession>) -> Self {
        let publish_response = session.and_then(|s| s.publish_response.clone());
        Self {
            id: post.id,
            content: post.content,
            image_url: post.image_url,
            status: post.status,
            published_at: post.published_at.or(session.and_then(|s| s.published_at)),
            scheduled_at: post.scheduled_at,
            created_at: post.created_at,
            linkedin_post_id: post.linkedin_post_id,
            linkedin_direct_link: publish_response
                .as_deref()
                .and_then(linkedin_direct_link),
            session_kind: session.map(|s| s.kind).unwrap_or(SessionKind::Webhook),
            user_input: session.map(|s| s.user_input.clone()).unwrap_or_default(),
            publish_response,
        }
    }
}

/// Pagination block of the list response
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> From<&PagedResult<T>> for Pagination {
    fn from(page: &PagedResult<T>) -> Self {
        Self {
            page: page.page,
            limit: page.per_page,
            total: page.total,
            total_pages: page.total_pages(),
            has_next: page.has_next(),
            has_prev: page.has_prev(),
        }
    }
}

/// Response for the posts list
#[derive(Debug, Serialize)]
pub struct ListPostsResponse {
    pub posts: Vec<PostItem>,
    pub pagination: Pagination,
}

/// Response for a single post
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub post: Post,
    pub session: Option<ContentSession>,
}

/// Build the posts router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route(
            "/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
}

/// GET /api/v1/posts - List posts with filters and pagination
///
/// Stuck sessions are promoted first so the list reflects publishes that
/// completed since the last visit.
async fn list_posts(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<ListPostsResponse>, ApiError> {
    state.content_service.refresh_user(user.0.id).await?;

    let params = ListParams::new(query.page, query.limit);
    let page = state
        .post_service
        .list(user.0.id, &params, query.status, query.source)
        .await?;

    let pagination = Pagination::from(&page);
    let mut posts = Vec::with_capacity(page.items.len());
    for post in page.items {
        let session = match &post.session_id {
            Some(session_id) => state
                .session_repo
                .get_by_id(session_id)
                .await
                .map_err(|e| ApiError::internal_error(e.to_string()))?,
            None => None,
        };
        posts.push(PostItem::new(post, session.as_ref()));
    }

    Ok(Json(ListPostsResponse { posts, pagination }))
}

/// POST /api/v1/posts - Create a post directly
async fn create_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreatePostInput>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.post_service.create(user.0.id, body).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/v1/posts/{id} - Get one post with its session
async fn get_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.post_service.get(user.0.id, id).await?;

    let session = match &post.session_id {
        Some(session_id) => state
            .session_repo
            .get_by_id(session_id)
            .await
            .map_err(|e| ApiError::internal_error(e.to_string()))?,
        None => None,
    };

    Ok(Json(PostResponse { post, session }))
}

/// PUT /api/v1/posts/{id} - Partial update
async fn update_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePostInput>,
) -> Result<Json<Post>, ApiError> {
    let post = state.post_service.update(user.0.id, id, body).await?;
    Ok(Json(post))
}

/// DELETE /api/v1/posts/{id} - Delete a post
async fn delete_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.post_service.delete(user.0.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
