//! Post service
//!
//! Listing with filters, CRUD with ownership checks, and the dashboard
//! status counts. Every post status change is mirrored onto the owning
//! content session through one mapping so the two never drift.

use crate::db::repositories::post::PostFilter;
use crate::db::repositories::{ContentSessionRepository, PostRepository};
use crate::models::{
    session_status_for_post, CreatePostInput, ListParams, PagedResult, Post, PostStatus,
    SessionStatus, UpdatePostInput,
};
use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    /// Post does not exist or belongs to another user
    #[error("Post not found")]
    NotFound,

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Dashboard counts for a user's posts
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PostStats {
    /// Published plus completed posts
    pub published: i64,
    /// Posts waiting on a scheduled publication time
    pub scheduled: i64,
    /// Sum of the above
    pub total: i64,
}

/// Post service
pub struct PostService {
    post_repo: Arc<dyn PostRepository>,
    session_repo: Arc<dyn ContentSessionRepository>,
}

impl PostService {
    pub fn new(
        post_repo: Arc<dyn PostRepository>,
        session_repo: Arc<dyn ContentSessionRepository>,
    ) -> Self {
        Self {
            post_repo,
            session_repo,
        }
    }

    /// List a user's posts, newest first.
    ///
    /// A `PUBLISHED` status filter also matches `COMPLETED` posts. Posts
    /// still marked `SCHEDULED` whose owning session has since reached
    /// `PUBLISHED` are reported as `PUBLISHED`.
    pub async fn list(
        &self,
        user_id: i64,
        params: &ListParams,
        status: Option<PostStatus>,
        source: Option<String>,
    ) -> Result<PagedResult<Post>, PostServiceError> {
        let statuses = match status {
            Some(PostStatus::Published) => vec![PostStatus::Published, PostStatus::Completed],
            Some(status) => vec![status],
            None => Vec::new(),
        };

        let filter = PostFilter { statuses, source };
        let (mut posts, total) = self.post_repo.list(user_id, params, &filter).await?;

        for post in &mut posts {
            if post.status != PostStatus::Scheduled {
                continue;
            }
            let Some(session_id) = &post.session_id else {
                continue;
            };
            if let Some(session) = self.session_repo.get_by_id(session_id).await? {
                if session.status == SessionStatus::Published {
                    post.status = PostStatus::Published;
                    post.published_at = post.published_at.or(session.published_at);
                }
            }
        }

        Ok(PagedResult::new(posts, total, params))
    }

    /// Get one of the user's posts
    pub async fn get(&self, user_id: i64, post_id: i64) -> Result<Post, PostServiceError> {
        let post = self
            .post_repo
            .get_by_id(post_id)
            .await?
            .filter(|p| p.user_id == user_id)
            .ok_or(PostServiceError::NotFound)?;

        Ok(post)
    }

    /// Create a post.
    ///
    /// `publish_now` stamps the post `PUBLISHED` immediately; a
    /// `scheduled_at` makes it `SCHEDULED`; anything else is a `DRAFT`.
    /// A session reference must belong to the same user; the session's
    /// status is moved in step with the new post.
    pub async fn create(
        &self,
        user_id: i64,
        input: CreatePostInput,
    ) -> Result<Post, PostServiceError> {
        if input.content.trim().is_empty() {
            return Err(PostServiceError::ValidationError(
                "Content cannot be empty".to_string(),
            ));
        }

        let status = if input.publish_now {
            PostStatus::Published
        } else if input.scheduled_at.is_some() {
            PostStatus::Scheduled
        } else {
            PostStatus::Draft
        };

        let mut post = Post::new(user_id, input.content, status);
        post.image_url = input.image_url;
        post.topic = input.topic;
        post.tone = input.tone;
        if let Some(platform) = input.platform {
            post.platform = platform;
        }
        if let Some(metadata) = input.metadata {
            post.metadata = metadata;
        }
        if status == PostStatus::Scheduled {
            post.scheduled_at = input.scheduled_at;
        }

        let session = match &input.session_id {
            Some(session_id) => {
                let session = self
                    .session_repo
                    .get_by_id(session_id)
                    .await?
                    .filter(|s| s.user_id == user_id)
                    .ok_or_else(|| {
                        PostServiceError::ValidationError("Unknown content session".to_string())
                    })?;
                post.session_id = Some(session.id.clone());
                Some(session)
            }
            None => None,
        };

        let created = self.post_repo.create(&post).await?;

        if let Some(mut session) = session {
            session.status = session_status_for_post(status);
            session.published_at = created.published_at;
            session.scheduled_at = created.scheduled_at;
            self.session_repo.update(&session).await?;
        }

        tracing::info!(post_id = created.id, status = %created.status, "post created");
        Ok(created)
    }

    /// Update a post and mirror any status change onto its session
    pub async fn update(
        &self,
        user_id: i64,
        post_id: i64,
        input: UpdatePostInput,
    ) -> Result<Post, PostServiceError> {
        if !input.has_changes() {
            return Err(PostServiceError::ValidationError(
                "No fields to update".to_string(),
            ));
        }

        let mut post = self.get(user_id, post_id).await?;

        if let Some(content) = input.content {
            post.content = content;
        }
        if let Some(image_url) = input.image_url {
            post.image_url = Some(image_url);
        }
        if let Some(linkedin_post_id) = input.linkedin_post_id {
            post.linkedin_post_id = Some(linkedin_post_id);
        }
        if let Some(published_at) = input.published_at {
            post.published_at = Some(published_at);
        }
        if let Some(scheduled_at) = input.scheduled_at {
            post.scheduled_at = Some(scheduled_at);
        }

        let status_changed = match input.status {
            Some(status) if status != post.status => {
                post.status = status;
                if status == PostStatus::Published && post.published_at.is_none() {
                    post.published_at = Some(Utc::now());
                }
                true
            }
            _ => false,
        };

        let updated = self.post_repo.update(&post).await?;

        if status_changed {
            if let Some(session_id) = &updated.session_id {
                if let Some(mut session) = self.session_repo.get_by_id(session_id).await? {
                    session.status = session_status_for_post(updated.status);
                    session.published_at = updated.published_at;
                    session.scheduled_at = updated.scheduled_at;
                    self.session_repo.update(&session).await?;
                }
            }
        }

        Ok(updated)
    }

    /// Delete one of the user's posts
    pub async fn delete(&self, user_id: i64, post_id: i64) -> Result<(), PostServiceError> {
        let post = self.get(user_id, post_id).await?;
        self.post_repo.delete(post.id).await?;
        tracing::info!(post_id, "post deleted");
        Ok(())
    }

    /// Dashboard status counts
    pub async fn stats(&self, user_id: i64) -> Result<PostStats, PostServiceError> {
        let published = self
            .post_repo
            .count_by_statuses(user_id, &[PostStatus::Published, PostStatus::Completed])
            .await?;
        let scheduled = self
            .post_repo
            .count_by_statuses(user_id, &[PostStatus::Scheduled])
            .await?;

        Ok(PostStats {
            published,
            scheduled,
            total: published + scheduled,
        })
    }
}
