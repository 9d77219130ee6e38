//! Content session model
//!
//! A `ContentSession` records one content-generation-to-publish wizard run:
//! what the user asked for, what the n8n workflow replied at each step, and
//! where the run currently stands. Sessions own zero or more posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PostStatus;

/// Content session entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSession {
    /// Unique identifier (UUID, travels to the workflow and back)
    pub id: String,
    /// Owning user ID
    pub user_id: i64,
    /// Which wizard flow started the run
    pub kind: SessionKind,
    /// Where the run currently stands
    pub status: SessionStatus,
    /// Raw user input (prompt text or image data reference)
    pub user_input: String,
    /// Serialized AI suggestions returned by the workflow
    pub suggestions: Option<String>,
    /// Serialized final content (`{"text": ..., "image": ...}`)
    pub final_content: Option<String>,
    /// Raw JSON of the workflow's generation/approval reply
    pub webhook_response: Option<String>,
    /// Raw JSON of the workflow's publish reply
    pub publish_response: Option<String>,
    /// Error text when the run failed
    pub error: Option<String>,
    /// Publication timestamp
    pub published_at: Option<DateTime<Utc>>,
    /// Scheduled publication timestamp
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ContentSession {
    /// Create a new in-progress session for a wizard run
    pub fn new(user_id: i64, kind: SessionKind, user_input: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            kind,
            status: SessionStatus::InProgress,
            user_input,
            suggestions: None,
            final_content: None,
            webhook_response: None,
            publish_response: None,
            error: None,
            published_at: None,
            scheduled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Parse the stored final content, if any
    pub fn parsed_final_content(&self) -> Option<FinalContent> {
        self.final_content
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
    }
}

/// Which wizard flow started a content session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionKind {
    /// Fully automatic generation
    Auto,
    /// Image suggestion first, then text
    ImageFirst,
    /// Text suggestion first, then image
    TextFirst,
    /// Text only, no image step
    TextOnly,
    /// Created by the public webhook ingress, not a wizard
    Webhook,
}

impl SessionKind {
    /// Convert kind to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Auto => "auto",
            SessionKind::ImageFirst => "image-first",
            SessionKind::TextFirst => "text-first",
            SessionKind::TextOnly => "text-only",
            SessionKind::Webhook => "webhook",
        }
    }

    /// Parse kind from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(SessionKind::Auto),
            "image-first" => Some(SessionKind::ImageFirst),
            "text-first" => Some(SessionKind::TextFirst),
            "text-only" => Some(SessionKind::TextOnly),
            "webhook" => Some(SessionKind::Webhook),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Content session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Waiting on the workflow
    InProgress,
    /// Final content agreed, not yet published or scheduled
    ReadyToPublish,
    /// Scheduled for a future publication time
    Scheduled,
    /// Published on the platform
    Published,
    /// Run finished (ingress sessions land here directly)
    Completed,
    /// Workflow call failed
    Failed,
    /// Cancelled by the user
    Cancel,
}

impl SessionStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "IN_PROGRESS",
            SessionStatus::ReadyToPublish => "READY_TO_PUBLISH",
            SessionStatus::Scheduled => "SCHEDULED",
            SessionStatus::Published => "PUBLISHED",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Failed => "FAILED",
            SessionStatus::Cancel => "CANCEL",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "IN_PROGRESS" => Some(SessionStatus::InProgress),
            "READY_TO_PUBLISH" => Some(SessionStatus::ReadyToPublish),
            "SCHEDULED" => Some(SessionStatus::Scheduled),
            "PUBLISHED" => Some(SessionStatus::Published),
            "COMPLETED" => Some(SessionStatus::Completed),
            "FAILED" => Some(SessionStatus::Failed),
            "CANCEL" => Some(SessionStatus::Cancel),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derive the session status that mirrors a post status change.
///
/// Post and session statuses drift apart when handlers update them
/// independently; every handler that changes a post's status goes through
/// this single mapping to keep the owning session in step.
pub fn session_status_for_post(status: PostStatus) -> SessionStatus {
    match status {
        PostStatus::Published => SessionStatus::Published,
        PostStatus::Scheduled => SessionStatus::Scheduled,
        PostStatus::Failed => SessionStatus::Failed,
        PostStatus::Completed => SessionStatus::Completed,
        PostStatus::Cancel => SessionStatus::Cancel,
        PostStatus::Draft | PostStatus::Processing => SessionStatus::ReadyToPublish,
    }
}

/// Final content agreed during a wizard run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinalContent {
    /// Post body text
    #[serde(default)]
    pub text: String,
    /// Image URL or data reference
    #[serde(default)]
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_status_roundtrip() {
        for status in [
            SessionStatus::InProgress,
            SessionStatus::ReadyToPublish,
            SessionStatus::Scheduled,
            SessionStatus::Published,
            SessionStatus::Completed,
            SessionStatus::Failed,
            SessionStatus::Cancel,
        ] {
            assert_eq!(SessionStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            SessionKind::Auto,
            SessionKind::ImageFirst,
            SessionKind::TextFirst,
            SessionKind::TextOnly,
            SessionKind::Webhook,
        ] {
            assert_eq!(SessionKind::from_str(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_new_session_is_in_progress() {
        let session = ContentSession::new(7, SessionKind::Auto, "a prompt".to_string());
        assert_eq!(session.status, SessionStatus::InProgress);
        assert_eq!(session.user_id, 7);
        assert!(!session.id.is_empty());
    }

    #[test]
    fn test_parsed_final_content() {
        let mut session = ContentSession::new(1, SessionKind::TextOnly, String::new());
        assert!(session.parsed_final_content().is_none());

        session.final_content =
            Some(r#"{"text": "hello linkedin", "image": "https://img.example/1.png"}"#.to_string());
        let content = session.parsed_final_content().unwrap();
        assert_eq!(content.text, "hello linkedin");
        assert_eq!(content.image.as_deref(), Some("https://img.example/1.png"));
    }

    #[test]
    fn test_parsed_final_content_tolerates_missing_image() {
        let mut session = ContentSession::new(1, SessionKind::TextOnly, String::new());
        session.final_content = Some(r#"{"text": "just text"}"#.to_string());
        let content = session.parsed_final_content().unwrap();
        assert_eq!(content.text, "just text");
        assert!(content.image.is_none());
    }
}
