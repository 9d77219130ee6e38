//! LinkedIn OAuth configuration model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default redirect URI when the user has not supplied one; points at the
/// n8n cloud OAuth credential callback.
pub const DEFAULT_REDIRECT_URI: &str = "https://app.n8n.cloud/oauth/callback";

/// Per-user LinkedIn OAuth credential set (one row per user)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedinOauthConfig {
    /// Unique identifier
    pub id: i64,
    /// Owning user ID (unique)
    pub user_id: i64,
    /// OAuth application client ID
    pub client_id: String,
    /// OAuth application client secret
    #[serde(skip_serializing)]
    pub client_secret: String,
    /// OAuth redirect URI
    pub redirect_uri: String,
    /// Authorization code captured by the callback endpoint
    pub authorization_code: Option<String>,
    /// LinkedIn member or organization identifier
    pub linkedin_id: Option<String>,
    /// Account type the credentials belong to
    pub account_type: Option<AccountType>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl LinkedinOauthConfig {
    /// Build the LinkedIn authorization URL for these credentials.
    ///
    /// `callback_url` is the externally reachable callback; the stored
    /// redirect URI wins when it is already absolute.
    pub fn authorization_url(&self, callback_url: &str) -> String {
        let callback = if self.redirect_uri.contains("http") {
            self.redirect_uri.as_str()
        } else {
            callback_url
        };
        format!(
            "https://www.linkedin.com/oauth/v2/authorization?response_type=code&client_id={}&redirect_uri={}&scope=w_member_social",
            self.client_id,
            urlencoding::encode(callback)
        )
    }
}

/// LinkedIn account type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Person,
    Organization,
}

impl AccountType {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Person => "PERSON",
            AccountType::Organization => "ORGANIZATION",
        }
    }

    /// Parse from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PERSON" => Some(AccountType::Person),
            "ORGANIZATION" => Some(AccountType::Organization),
            _ => None,
        }
    }
}

/// Input for creating or updating a LinkedIn OAuth config
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpsertOauthInput {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: Option<String>,
    pub authorization_code: Option<String>,
    pub linkedin_id: Option<String>,
    pub account_type: Option<AccountType>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn config(redirect_uri: &str) -> LinkedinOauthConfig {
        LinkedinOauthConfig {
            id: 1,
            user_id: 1,
            client_id: "client-123".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: redirect_uri.to_string(),
            authorization_code: None,
            linkedin_id: None,
            account_type: Some(AccountType::Person),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_authorization_url_uses_absolute_redirect() {
        let config = config("https://auth.example.com/callback");
        let url = config.authorization_url("http://localhost:8080/api/v1/linkedin-callback");
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains(&urlencoding::encode("https://auth.example.com/callback").to_string()));
        assert!(url.contains("scope=w_member_social"));
    }

    #[test]
    fn test_authorization_url_falls_back_to_callback() {
        let config = config("relative/path");
        let url = config.authorization_url("http://localhost:8080/api/v1/linkedin-callback");
        assert!(url.contains(
            &urlencoding::encode("http://localhost:8080/api/v1/linkedin-callback").to_string()
        ));
    }

    #[test]
    fn test_account_type_roundtrip() {
        assert_eq!(AccountType::from_str("PERSON"), Some(AccountType::Person));
        assert_eq!(
            AccountType::from_str("organization"),
            Some(AccountType::Organization)
        );
        assert_eq!(AccountType::from_str("ROBOT"), None);
    }
}
