//! n8n webhook client
//!
//! One `N8nClient` is shared by all handlers. Generation, approval, and
//! publish calls block on the workflow's synchronous reply, so the request
//! timeout doubles as the ceiling on wizard step latency.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::WebhookConfig;
use crate::models::{ContentSession, FinalContent, N8nConfig, SuggestionType};

/// Errors from webhook calls
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The workflow did not answer within the configured timeout
    #[error("n8n webhook timed out")]
    Timeout,

    /// The workflow answered with a non-success status
    #[error("n8n webhook returned status {0}")]
    Status(StatusCode),

    /// The request could not be sent or the body could not be read
    #[error("n8n webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// A parsed workflow reply.
///
/// Workflows answer either with a JSON object or with plain confirmation
/// text; both forms are kept so callers can read structured fields when
/// present and fall back to text extraction otherwise.
#[derive(Debug, Clone)]
pub struct WebhookReply {
    /// Raw response body
    pub raw: String,
    /// Parsed JSON body, or `Value::Null` when the body was not JSON
    pub json: Value,
}

impl WebhookReply {
    fn from_body(raw: String) -> Self {
        let json = serde_json::from_str(&raw).unwrap_or(Value::Null);
        Self { raw, json }
    }

    /// The `Output` field, which carries the LinkedIn share URN
    pub fn output(&self) -> Option<&str> {
        self.json.get("Output").and_then(|v| v.as_str())
    }

    /// Whether the workflow reports the run complete
    pub fn is_completed(&self) -> bool {
        self.json.get("Status").and_then(|v| v.as_str()) == Some("Completed")
    }

    /// The generated post text, when present
    pub fn post_description(&self) -> Option<&str> {
        self.json.get("Post Description").and_then(|v| v.as_str())
    }

    /// The generated image URL, when present
    pub fn image(&self) -> Option<&str> {
        self.json.get("Image").and_then(|v| v.as_str())
    }
}

/// HTTP client for a user's n8n workflow
#[derive(Clone)]
pub struct N8nClient {
    http: reqwest::Client,
    probe_timeout: Duration,
}

impl N8nClient {
    /// Build a client with the configured request timeout
    pub fn new(config: &WebhookConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
        })
    }

    /// POST a payload to the user's workflow and parse the reply
    pub async fn send(
        &self,
        config: &N8nConfig,
        payload: &Value,
    ) -> Result<WebhookReply, WebhookError> {
        let mut request = self.http.post(&config.webhook_url).json(payload);
        if !config.auth_token.is_empty() {
            request = request.bearer_auth(&config.auth_token);
        }

        let response = request.send().await.map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebhookError::Status(status));
        }

        let body = response.text().await.map_err(map_send_error)?;
        tracing::debug!(url = %config.webhook_url, body_len = body.len(), "n8n webhook reply");

        Ok(WebhookReply::from_body(body))
    }

    /// Fire a short GET at the webhook URL to check it is reachable.
    /// Best effort: a false result registers the config anyway, it only
    /// feeds the `webhook_active` flag in the response.
    pub async fn probe(&self, url: &str) -> bool {
        match self
            .http
            .get(url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => {
                tracing::debug!(url, status = %response.status(), "webhook probe answered");
                true
            }
            Err(err) => {
                tracing::debug!(url, error = %err, "webhook probe failed");
                false
            }
        }
    }
}

fn map_send_error(err: reqwest::Error) -> WebhookError {
    if err.is_timeout() {
        WebhookError::Timeout
    } else {
        WebhookError::Request(err)
    }
}

// ============================================================================
// Payload builders
//
// Field names are the workflow's wire format, not ours.
// ============================================================================

/// Payload that starts a content generation run
pub fn start_generation_payload(
    session: &ContentSession,
    scenario: Option<&str>,
    ai_mode: bool,
) -> Value {
    json!({
        "sessionId": session.id,
        "userId": session.user_id,
        "type": session.kind.as_str(),
        "userInput": session.user_input,
        "scenario": scenario.unwrap_or("default"),
        "action": "start_content_generation",
        "aiMode": ai_mode,
    })
}

/// Payload that approves a suggestion and asks for the next step
pub fn approval_payload(session: &ContentSession, suggestion_type: SuggestionType) -> Value {
    let next_step = match suggestion_type {
        SuggestionType::Image => "generate_text",
        SuggestionType::Text => "finalize_content",
    };

    json!({
        "sessionId": session.id,
        "userId": session.user_id,
        "action": "suggestion_approved",
        "suggestionType": suggestion_type.as_str(),
        "nextStep": next_step,
    })
}

/// Payload that rejects a suggestion and asks for a new one
pub fn rejection_payload(
    session: &ContentSession,
    suggestion_type: SuggestionType,
    reason: Option<&str>,
) -> Value {
    json!({
        "sessionId": session.id,
        "userId": session.user_id,
        "action": "suggestion_rejected",
        "suggestionType": suggestion_type.as_str(),
        "rejectionReason": reason.unwrap_or("Kullanıcı uygun bulmadı"),
        "requestNewSuggestion": true,
    })
}

/// Payload that publishes agreed content immediately or on a schedule
pub fn publish_payload(
    session: &ContentSession,
    content: &FinalContent,
    scheduled_at: Option<chrono::DateTime<chrono::Utc>>,
) -> Value {
    let action = if scheduled_at.is_some() {
        "schedule_post"
    } else {
        "publish_immediately"
    };

    json!({
        "sessionId": session.id,
        "userId": session.user_id,
        "action": action,
        "content": {
            "text": content.text,
            "image": content.image,
        },
        "scheduledDate": scheduled_at,
    })
}
