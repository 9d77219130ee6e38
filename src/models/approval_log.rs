//! Approval log model
//!
//! Append-only record of every approve/reject decision taken during a
//! wizard run, together with the raw webhook response at that moment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One approve/reject decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalLog {
    /// Unique identifier
    pub id: i64,
    /// Content session the decision belongs to
    pub session_id: String,
    /// User who decided
    pub user_id: i64,
    /// Which suggestion was decided on
    pub suggestion_type: SuggestionType,
    /// Whether the suggestion was approved
    pub approved: bool,
    /// Reason given when rejecting
    pub rejection_reason: Option<String>,
    /// Raw webhook response recorded with the decision
    pub response: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Which kind of suggestion a decision applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionType {
    Image,
    Text,
}

impl SuggestionType {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionType::Image => "image",
            SuggestionType::Text => "text",
        }
    }

    /// Parse from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "image" => Some(SuggestionType::Image),
            "text" => Some(SuggestionType::Text),
            _ => None,
        }
    }
}

impl ApprovalLog {
    /// Create an unsaved log entry for a decision
    pub fn new(
        session_id: String,
        user_id: i64,
        suggestion_type: SuggestionType,
        approved: bool,
    ) -> Self {
        Self {
            id: 0, // Will be set by database
            session_id,
            user_id,
            suggestion_type,
            approved,
            rejection_reason: None,
            response: None,
            created_at: Utc::now(),
        }
    }
}
