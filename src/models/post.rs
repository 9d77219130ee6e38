//! Post model
//!
//! This module provides:
//! - `Post` entity representing one piece of content and its publication
//!   lifecycle
//! - `PostStatus` enum covering the lifecycle states
//! - Input types for creating and updating posts
//! - Pagination types for list queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier
    pub id: i64,
    /// Owning user ID
    pub user_id: i64,
    /// Owning content session, when the post came out of a wizard run
    pub session_id: Option<String>,
    /// Post body text
    pub content: String,
    /// Attached image URL
    pub image_url: Option<String>,
    /// Topic hint passed to the workflow
    pub topic: Option<String>,
    /// Tone hint passed to the workflow
    pub tone: Option<String>,
    /// Target platform
    #[serde(default = "default_platform")]
    pub platform: String,
    /// Publication status
    pub status: PostStatus,
    /// LinkedIn share URN returned by the workflow
    pub linkedin_post_id: Option<String>,
    /// Publication timestamp
    pub published_at: Option<DateTime<Utc>>,
    /// Scheduled publication timestamp
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// Free-form metadata (carries the ingress source and raw payload for
    /// webhook-created posts)
    #[serde(default = "default_metadata")]
    pub metadata: serde_json::Value,
}

fn default_platform() -> String {
    "linkedin".to_string()
}

fn default_metadata() -> serde_json::Value {
    serde_json::json!({})
}

impl Post {
    /// Create a new unsaved post with the given parameters
    pub fn new(user_id: i64, content: String, status: PostStatus) -> Self {
        let now = Utc::now();
        let published_at = if status == PostStatus::Published {
            Some(now)
        } else {
            None
        };

        Self {
            id: 0, // Will be set by database
            user_id,
            session_id: None,
            content,
            image_url: None,
            topic: None,
            tone: None,
            platform: default_platform(),
            status,
            linkedin_post_id: None,
            published_at,
            scheduled_at: None,
            created_at: now,
            updated_at: now,
            metadata: serde_json::json!({}),
        }
    }

    /// Check whether the post came in through the public webhook ingress
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(|v| v.as_str())
    }
}

/// Post publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
    /// Draft - created but not yet handed to the workflow
    Draft,
    /// Scheduled for a future publication time
    Scheduled,
    /// Published on the platform
    Published,
    /// Workflow reported the run complete
    Completed,
    /// Workflow call or publication failed
    Failed,
    /// Cancelled by the user
    Cancel,
    /// Handed to the workflow, waiting for its reply
    Processing,
}

impl Default for PostStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl PostStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "DRAFT",
            PostStatus::Scheduled => "SCHEDULED",
            PostStatus::Published => "PUBLISHED",
            PostStatus::Completed => "COMPLETED",
            PostStatus::Failed => "FAILED",
            PostStatus::Cancel => "CANCEL",
            PostStatus::Processing => "PROCESSING",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Some(PostStatus::Draft),
            "SCHEDULED" => Some(PostStatus::Scheduled),
            "PUBLISHED" => Some(PostStatus::Published),
            "COMPLETED" => Some(PostStatus::Completed),
            "FAILED" => Some(PostStatus::Failed),
            "CANCEL" => Some(PostStatus::Cancel),
            "PROCESSING" => Some(PostStatus::Processing),
            _ => None,
        }
    }

    /// Whether the post counts as published for stats and filtering.
    /// COMPLETED runs are reported alongside PUBLISHED ones.
    pub fn is_published(&self) -> bool {
        matches!(self, PostStatus::Published | PostStatus::Completed)
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a new post
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePostInput {
    pub content: String,
    pub image_url: Option<String>,
    pub topic: Option<String>,
    pub tone: Option<String>,
    pub platform: Option<String>,
    pub session_id: Option<String>,
    #[serde(default)]
    pub publish_now: bool,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub metadata: Option<serde_json::Value>,
}

/// Input for updating an existing post
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostInput {
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<PostStatus>,
    pub published_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub linkedin_post_id: Option<String>,
}

impl UpdatePostInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.content.is_some()
            || self.image_url.is_some()
            || self.status.is_some()
            || self.published_at.is_some()
            || self.scheduled_at.is_some()
            || self.linkedin_post_id.is_some()
    }
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        ((self.total as u32) + self.per_page - 1) / self.per_page
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if there is a previous page
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of items in the current page
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            per_page: 10,
        }
    }
}
