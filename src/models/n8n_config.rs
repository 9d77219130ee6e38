//! n8n webhook configuration model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user n8n webhook configuration (one row per user)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct N8nConfig {
    /// Unique identifier
    pub id: i64,
    /// Owning user ID (unique)
    pub user_id: i64,
    /// Workflow webhook URL, invoked via HTTP POST
    pub webhook_url: String,
    /// Optional auth token forwarded to the workflow
    #[serde(skip_serializing_if = "String::is_empty")]
    pub auth_token: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl N8nConfig {
    /// Create an unsaved config for a user
    pub fn new(user_id: i64, webhook_url: String, auth_token: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by database
            user_id,
            webhook_url,
            auth_token,
            created_at: now,
            updated_at: now,
        }
    }
}
