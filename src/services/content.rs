//! Content generation service
//!
//! Drives the wizard: start a generation run, forward approve/reject
//! decisions, publish or schedule the agreed content, and promote sessions
//! whose publish reply arrived after the fact. Every step talks to the
//! user's own n8n workflow and records what came back.

use crate::db::repositories::{
    ApprovalLogRepository, ContentSessionRepository, N8nConfigRepository, PostRepository,
};
use crate::models::{
    ApprovalLog, ContentSession, FinalContent, ListParams, N8nConfig, PagedResult, Post,
    PostStatus, SessionKind, SessionStatus, SuggestionType,
};
use crate::webhook::extract;
use crate::webhook::{
    approval_payload, publish_payload, rejection_payload, start_generation_payload, N8nClient,
    WebhookError, WebhookReply,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Post body used when a promoted session has no recoverable final content.
/// The workflow's audience reads Turkish; so does its fallback.
const MISSING_CONTENT_FALLBACK: &str = "İçerik bulunamadı";

/// Error types for content service operations
#[derive(Debug, thiserror::Error)]
pub enum ContentServiceError {
    /// Session does not exist or belongs to another user
    #[error("Content session not found")]
    SessionNotFound,

    /// The user has not registered an n8n webhook yet
    #[error("n8n webhook is not configured")]
    MissingN8nConfig,

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// No registered webhook URL contains the ingress identifier
    #[error("Webhook config not found")]
    UnknownWebhook,

    /// The workflow call failed
    #[error(transparent)]
    Webhook(#[from] WebhookError),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for starting a generation run
#[derive(Debug, Clone)]
pub struct StartContentInput {
    /// Which wizard flow to run
    pub kind: SessionKind,
    /// Prompt text or image data reference
    pub user_input: Option<String>,
    /// Named workflow scenario, defaults to "default"
    pub scenario: Option<String>,
    /// AI continuation flag for text-only runs
    pub ai_mode: bool,
}

/// Result of starting a generation run
#[derive(Debug, Clone, Serialize)]
pub struct StartOutcome {
    /// The created session, already updated with the workflow's first reply
    pub session: ContentSession,
    /// LinkedIn share URN when the workflow published in one shot
    pub linkedin_urn: Option<String>,
}

/// Session state for client polling
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    /// The session itself
    pub session: ContentSession,
    /// Share URN of the newest post attached to the session
    pub linkedin_post_id: Option<String>,
}

/// Input for an approve/reject decision
#[derive(Debug, Clone)]
pub struct DecisionInput {
    pub session_id: String,
    pub approved: bool,
    pub suggestion_type: SuggestionType,
    pub rejection_reason: Option<String>,
}

/// Result of forwarding a decision to the workflow
#[derive(Debug, Clone, Serialize)]
pub struct DecisionOutcome {
    /// The session, updated when the reply carried content
    pub session: ContentSession,
    /// Share URN when the approval completed the run
    pub linkedin_urn: Option<String>,
}

/// Input for publishing or scheduling agreed content
#[derive(Debug, Clone)]
pub struct PublishInput {
    pub session_id: String,
    /// Publish immediately rather than on a schedule
    pub publish_now: bool,
    /// Publication time, required when scheduling
    pub scheduled_date: Option<DateTime<Utc>>,
    pub final_content: FinalContent,
}

/// Result of a publish call
#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    pub session: ContentSession,
    pub post: Post,
}

/// A session together with its newest post
#[derive(Debug, Clone, Serialize)]
pub struct SessionOverview {
    pub session: ContentSession,
    pub post: Option<Post>,
}

/// Result of a public webhook ingress call
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub session: ContentSession,
    pub post: Post,
}

/// Content generation service
pub struct ContentService {
    session_repo: Arc<dyn ContentSessionRepository>,
    post_repo: Arc<dyn PostRepository>,
    approval_repo: Arc<dyn ApprovalLogRepository>,
    n8n_repo: Arc<dyn N8nConfigRepository>,
    client: N8nClient,
}

impl ContentService {
    pub fn new(
        session_repo: Arc<dyn ContentSessionRepository>,
        post_repo: Arc<dyn PostRepository>,
        approval_repo: Arc<dyn ApprovalLogRepository>,
        n8n_repo: Arc<dyn N8nConfigRepository>,
        client: N8nClient,
    ) -> Self {
        Self {
            session_repo,
            post_repo,
            approval_repo,
            n8n_repo,
            client,
        }
    }

    /// Start a generation run.
    ///
    /// Creates an `IN_PROGRESS` session, calls the workflow, and applies the
    /// synchronous reply: some workflows answer with finished content and a
    /// share URN right away, in which case the session lands `PUBLISHED`
    /// with a post attached. A webhook failure marks the session `FAILED`
    /// and surfaces the error.
    pub async fn start(
        &self,
        user_id: i64,
        input: StartContentInput,
    ) -> Result<StartOutcome, ContentServiceError> {
        let config = self.require_n8n_config(user_id).await?;

        let session = ContentSession::new(user_id, input.kind, input.user_input.unwrap_or_default());
        let mut session = self
            .session_repo
            .create(&session)
            .await
            .map_err(ContentServiceError::InternalError)?;

        tracing::info!(session_id = %session.id, kind = %session.kind, "content generation started");

        let payload = start_generation_payload(&session, input.scenario.as_deref(), input.ai_mode);
        let reply = match self.client.send(&config, &payload).await {
            Ok(reply) => reply,
            Err(err) => {
                self.mark_failed(&mut session, &err).await?;
                return Err(err.into());
            }
        };

        session.webhook_response = Some(reply.raw.clone());
        session.final_content = Some(encode_final_content(&reply_content(&reply))?);
        if reply.is_completed() {
            session.status = SessionStatus::Published;
        }

        let session = self
            .session_repo
            .update(&session)
            .await
            .map_err(ContentServiceError::InternalError)?;

        let linkedin_urn = reply.output().map(str::to_string);
        if reply.is_completed() {
            if let Some(urn) = &linkedin_urn {
                self.record_published_post(&session, &reply, urn).await?;
            }
        }

        Ok(StartOutcome {
            session,
            linkedin_urn,
        })
    }

    /// Session state for client polling
    pub async fn get_session(
        &self,
        user_id: i64,
        session_id: &str,
    ) -> Result<SessionSnapshot, ContentServiceError> {
        let session = self.require_session(user_id, session_id).await?;

        let linkedin_post_id = self
            .post_repo
            .get_by_session_id(&session.id)
            .await
            .map_err(ContentServiceError::InternalError)?
            .and_then(|post| post.linkedin_post_id);

        Ok(SessionSnapshot {
            session,
            linkedin_post_id,
        })
    }

    /// Forward an approve/reject decision to the workflow and log it.
    ///
    /// An approval asks for the next wizard step; when its reply already
    /// carries content the session is updated the same way `start` does.
    /// A rejection asks for a fresh suggestion and leaves the session
    /// untouched.
    pub async fn decide(
        &self,
        user_id: i64,
        input: DecisionInput,
    ) -> Result<DecisionOutcome, ContentServiceError> {
        let mut session = self.require_session(user_id, &input.session_id).await?;
        let config = self.require_n8n_config(user_id).await?;

        if input.approved {
            let payload = approval_payload(&session, input.suggestion_type);
            let reply = self.client.send(&config, &payload).await?;

            let linkedin_urn = reply.output().map(str::to_string);

            if reply.post_description().is_some() || reply.image().is_some() {
                session.webhook_response = Some(reply.raw.clone());
                session.final_content = Some(encode_final_content(&reply_content(&reply))?);
                if reply.is_completed() {
                    session.status = SessionStatus::Published;
                }
                session = self
                    .session_repo
                    .update(&session)
                    .await
                    .map_err(ContentServiceError::InternalError)?;
            }

            if reply.is_completed() {
                if let Some(urn) = &linkedin_urn {
                    self.record_published_post(&session, &reply, urn).await?;
                }
            }

            let mut log = ApprovalLog::new(session.id.clone(), user_id, input.suggestion_type, true);
            log.response = Some(reply.raw.clone());
            self.approval_repo
                .create(&log)
                .await
                .map_err(ContentServiceError::InternalError)?;

            Ok(DecisionOutcome {
                session,
                linkedin_urn,
            })
        } else {
            let payload =
                rejection_payload(&session, input.suggestion_type, input.rejection_reason.as_deref());
            let reply = self.client.send(&config, &payload).await?;

            let mut log = ApprovalLog::new(session.id.clone(), user_id, input.suggestion_type, false);
            log.rejection_reason = Some(
                input
                    .rejection_reason
                    .unwrap_or_else(|| "Kullanıcı uygun bulmadı".to_string()),
            );
            log.response = Some(reply.raw.clone());
            self.approval_repo
                .create(&log)
                .await
                .map_err(ContentServiceError::InternalError)?;

            Ok(DecisionOutcome {
                session,
                linkedin_urn: None,
            })
        }
    }

    /// Publish the agreed content immediately or on a schedule.
    ///
    /// Schedule → session and post land `SCHEDULED`. Publish-now →
    /// `PUBLISHED`, except a text-only run whose workflow answers the
    /// literal `Hatalı Parametre` (the workflow's retryable parameter
    /// error), which stays `IN_PROGRESS` with a `DRAFT` post. A webhook
    /// failure marks the session `FAILED`.
    pub async fn publish(
        &self,
        user_id: i64,
        input: PublishInput,
    ) -> Result<PublishOutcome, ContentServiceError> {
        if input.final_content.text.trim().is_empty() {
            return Err(ContentServiceError::ValidationError(
                "Final content text is required".to_string(),
            ));
        }
        if !input.publish_now && input.scheduled_date.is_none() {
            return Err(ContentServiceError::ValidationError(
                "Scheduled date is required when scheduling".to_string(),
            ));
        }

        let mut session = self.require_session(user_id, &input.session_id).await?;
        let config = self.require_n8n_config(user_id).await?;

        let scheduled_at = if input.publish_now {
            None
        } else {
            input.scheduled_date
        };
        let content = input.final_content;

        let payload = publish_payload(&session, &content, scheduled_at);
        let reply = match self.client.send(&config, &payload).await {
            Ok(reply) => reply,
            Err(err) => {
                self.mark_failed(&mut session, &err).await?;
                return Err(err.into());
            }
        };

        let (session_status, post_status) = if scheduled_at.is_some() {
            (SessionStatus::Scheduled, PostStatus::Scheduled)
        } else if session.kind == SessionKind::TextOnly && is_parameter_error(&reply) {
            (SessionStatus::InProgress, PostStatus::Draft)
        } else {
            (SessionStatus::Published, PostStatus::Published)
        };

        let now = Utc::now();
        session.status = session_status;
        session.final_content = Some(encode_final_content(&content)?);
        session.publish_response = Some(reply.raw.clone());
        match session_status {
            SessionStatus::Published => session.published_at = Some(now),
            SessionStatus::Scheduled => session.scheduled_at = scheduled_at,
            _ => {}
        }

        let session = self
            .session_repo
            .update(&session)
            .await
            .map_err(ContentServiceError::InternalError)?;

        let mut post = Post::new(user_id, content.text.clone(), post_status);
        post.session_id = Some(session.id.clone());
        post.image_url = content.image.clone();
        post.linkedin_post_id = reply.output().map(str::to_string);
        post.scheduled_at = scheduled_at;

        let post = self
            .post_repo
            .create(&post)
            .await
            .map_err(ContentServiceError::InternalError)?;

        tracing::info!(
            session_id = %session.id,
            status = %session.status,
            "content publish recorded"
        );

        Ok(PublishOutcome { session, post })
    }

    /// List a user's sessions with their newest post, newest first
    pub async fn list_sessions(
        &self,
        user_id: i64,
        params: &ListParams,
    ) -> Result<PagedResult<SessionOverview>, ContentServiceError> {
        let (sessions, total) = self
            .session_repo
            .list(user_id, params)
            .await
            .map_err(ContentServiceError::InternalError)?;

        let mut items = Vec::with_capacity(sessions.len());
        for session in sessions {
            let post = self
                .post_repo
                .get_by_session_id(&session.id)
                .await
                .map_err(ContentServiceError::InternalError)?;
            items.push(SessionOverview { session, post });
        }

        Ok(PagedResult::new(items, total, params))
    }

    /// Promote a user's stuck sessions whose stored publish reply carries a
    /// post identifier. Returns the sessions that were promoted.
    pub async fn refresh_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<ContentSession>, ContentServiceError> {
        let candidates = self
            .session_repo
            .list_by_statuses(user_id, &[SessionStatus::InProgress])
            .await
            .map_err(ContentServiceError::InternalError)?;

        let mut promoted = Vec::new();
        for session in candidates {
            if let Some(updated) = self.promote_session(session).await? {
                promoted.push(updated);
            }
        }

        Ok(promoted)
    }

    /// Promote stuck sessions across all users. Used by the background
    /// refresher; per-session failures are logged and skipped so one bad
    /// row cannot stall the sweep. Returns how many sessions were promoted.
    pub async fn refresh_all(&self) -> Result<usize, ContentServiceError> {
        let candidates = self
            .session_repo
            .list_refresh_candidates()
            .await
            .map_err(ContentServiceError::InternalError)?;

        let mut count = 0;
        for session in candidates {
            let session_id = session.id.clone();
            match self.promote_session(session).await {
                Ok(Some(_)) => count += 1,
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(session_id = %session_id, error = %err, "session refresh failed");
                }
            }
        }

        Ok(count)
    }

    /// The registered config whose webhook URL contains the ingress id
    pub async fn lookup_webhook(
        &self,
        webhook_id: &str,
    ) -> Result<N8nConfig, ContentServiceError> {
        self.n8n_repo
            .find_by_url_fragment(webhook_id)
            .await
            .map_err(ContentServiceError::InternalError)?
            .ok_or(ContentServiceError::UnknownWebhook)
    }

    /// Ingest content pushed by an external workflow.
    ///
    /// The caller is identified by the ingress identifier, which must appear
    /// somewhere in a registered webhook URL. Creates a finished session of
    /// kind `webhook` and a post carrying the pushed content; the raw
    /// payload is kept in the post's metadata.
    pub async fn ingest_webhook(
        &self,
        webhook_id: &str,
        payload: Value,
    ) -> Result<IngestOutcome, ContentServiceError> {
        let config = self.lookup_webhook(webhook_id).await?;

        let content = payload
            .get("content")
            .and_then(|v| v.as_str())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ContentServiceError::ValidationError("Content is required".to_string())
            })?;

        let requested_status = payload
            .get("status")
            .and_then(|v| v.as_str())
            .and_then(PostStatus::from_str);
        let post_status = if payload.get("publishNow").and_then(|v| v.as_bool()) == Some(false) {
            PostStatus::Scheduled
        } else {
            requested_status.unwrap_or(PostStatus::Published)
        };

        let image_url = payload
            .get("imageUrl")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let mut session = ContentSession::new(config.user_id, SessionKind::Webhook, String::new());
        session.status = if payload.get("status").and_then(|v| v.as_str()) == Some("READY_TO_PUBLISH")
        {
            SessionStatus::ReadyToPublish
        } else {
            SessionStatus::Completed
        };
        session.final_content = Some(encode_final_content(&FinalContent {
            text: content.clone(),
            image: image_url.clone(),
        })?);
        session.webhook_response = Some(payload.to_string());
        let session = self
            .session_repo
            .create(&session)
            .await
            .map_err(ContentServiceError::InternalError)?;

        let now = Utc::now();
        let mut post = Post::new(config.user_id, content, post_status);
        post.session_id = Some(session.id.clone());
        post.image_url = image_url;
        post.topic = Some(
            payload
                .get("topic")
                .and_then(|v| v.as_str())
                .unwrap_or("N8N Webhook")
                .to_string(),
        );
        post.tone = Some(
            payload
                .get("tone")
                .and_then(|v| v.as_str())
                .unwrap_or("professional")
                .to_string(),
        );
        if let Some(platform) = payload.get("platform").and_then(|v| v.as_str()) {
            post.platform = platform.to_string();
        }
        post.linkedin_post_id = payload
            .get("linkedinPostId")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        match post_status {
            PostStatus::Published | PostStatus::Completed => post.published_at = Some(now),
            PostStatus::Scheduled => {
                // default publication slot: one hour out
                post.scheduled_at = Some(
                    payload
                        .get("scheduledAt")
                        .and_then(|v| v.as_str())
                        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                        .map(|d| d.with_timezone(&Utc))
                        .unwrap_or_else(|| now + chrono::Duration::hours(1)),
                );
            }
            _ => {}
        }
        post.metadata = json!({
            "source": "n8n_webhook",
            "webhookId": webhook_id,
            "originalData": payload,
        });

        let post = self
            .post_repo
            .create(&post)
            .await
            .map_err(ContentServiceError::InternalError)?;

        tracing::info!(
            webhook_id,
            user_id = config.user_id,
            post_id = post.id,
            status = %post.status,
            "webhook content ingested"
        );

        Ok(IngestOutcome { session, post })
    }

    /// Promote one `IN_PROGRESS` session when its publish reply names a
    /// post. The publication time comes from the reply text when present,
    /// else the session's last update. The session's post is promoted with
    /// it, or created when the workflow published without one.
    async fn promote_session(
        &self,
        mut session: ContentSession,
    ) -> Result<Option<ContentSession>, ContentServiceError> {
        let reply_text = match session.publish_response.clone() {
            Some(text) => text,
            None => return Ok(None),
        };
        if !extract::contains_post_id(&reply_text) {
            return Ok(None);
        }

        let post_id = extract::extract_post_id(&reply_text);
        let published_at = extract::extract_publish_date(&reply_text).unwrap_or(session.updated_at);

        session.status = SessionStatus::Published;
        session.published_at = Some(published_at);
        let session = self
            .session_repo
            .update(&session)
            .await
            .map_err(ContentServiceError::InternalError)?;

        match self
            .post_repo
            .get_by_session_id(&session.id)
            .await
            .map_err(ContentServiceError::InternalError)?
        {
            Some(mut post) => {
                post.status = PostStatus::Published;
                post.published_at = Some(published_at);
                post.linkedin_post_id = post_id.or(post.linkedin_post_id);
                self.post_repo
                    .update(&post)
                    .await
                    .map_err(ContentServiceError::InternalError)?;
            }
            None => {
                let final_content = session.parsed_final_content();
                let text = final_content
                    .as_ref()
                    .map(|c| c.text.clone())
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| MISSING_CONTENT_FALLBACK.to_string());

                let mut post = Post::new(session.user_id, text, PostStatus::Published);
                post.session_id = Some(session.id.clone());
                post.image_url = final_content.and_then(|c| c.image);
                post.linkedin_post_id = post_id;
                post.published_at = Some(published_at);
                self.post_repo
                    .create(&post)
                    .await
                    .map_err(ContentServiceError::InternalError)?;
            }
        }

        tracing::info!(session_id = %session.id, "stuck session promoted to published");

        Ok(Some(session))
    }

    async fn require_session(
        &self,
        user_id: i64,
        session_id: &str,
    ) -> Result<ContentSession, ContentServiceError> {
        self.session_repo
            .get_by_id(session_id)
            .await
            .map_err(ContentServiceError::InternalError)?
            .filter(|session| session.user_id == user_id)
            .ok_or(ContentServiceError::SessionNotFound)
    }

    async fn require_n8n_config(&self, user_id: i64) -> Result<N8nConfig, ContentServiceError> {
        self.n8n_repo
            .get_by_user(user_id)
            .await
            .map_err(ContentServiceError::InternalError)?
            .ok_or(ContentServiceError::MissingN8nConfig)
    }

    async fn mark_failed(
        &self,
        session: &mut ContentSession,
        err: &WebhookError,
    ) -> Result<(), ContentServiceError> {
        session.status = SessionStatus::Failed;
        session.error = Some(format!("n8n webhook error: {err}"));
        self.session_repo
            .update(session)
            .await
            .map_err(ContentServiceError::InternalError)?;
        Ok(())
    }

    /// Create the `PUBLISHED` post for a run the workflow completed in one
    /// reply.
    async fn record_published_post(
        &self,
        session: &ContentSession,
        reply: &WebhookReply,
        urn: &str,
    ) -> Result<(), ContentServiceError> {
        let mut post = Post::new(
            session.user_id,
            reply.post_description().unwrap_or_default().to_string(),
            PostStatus::Published,
        );
        post.session_id = Some(session.id.clone());
        post.image_url = reply.image().map(str::to_string);
        post.linkedin_post_id = Some(urn.to_string());

        self.post_repo
            .create(&post)
            .await
            .map_err(ContentServiceError::InternalError)?;

        tracing::info!(session_id = %session.id, urn, "published post recorded");

        Ok(())
    }
}

/// The final content carried by a generation/approval reply
fn reply_content(reply: &WebhookReply) -> FinalContent {
    FinalContent {
        text: reply.post_description().unwrap_or_default().to_string(),
        image: reply.image().map(str::to_string),
    }
}

fn encode_final_content(content: &FinalContent) -> Result<String, ContentServiceError> {
    serde_json::to_string(content)
        .context("Failed to serialize final content")
        .map_err(ContentServiceError::InternalError)
}

/// Whether the workflow answered with its literal parameter-error string,
/// either as a bare body or as a JSON string.
fn is_parameter_error(reply: &WebhookReply) -> bool {
    reply
        .json
        .as_str()
        .unwrap_or_else(|| reply.raw.trim())
        == "Hatalı Parametre"
}
