//! Settings service
//!
//! Per-user integration settings: the n8n webhook registration (with its
//! best-effort reachability probe) and the LinkedIn OAuth credential set
//! with its derived authorization URL.

use crate::db::repositories::{LinkedinOauthRepository, N8nConfigRepository};
use crate::models::{
    LinkedinOauthConfig, N8nConfig, UpsertOauthInput, DEFAULT_REDIRECT_URI,
};
use crate::webhook::N8nClient;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Error types for settings service operations
#[derive(Debug, thiserror::Error)]
pub enum SettingsServiceError {
    /// The requested config does not exist yet
    #[error("Configuration not found")]
    NotFound,

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Result of registering an n8n webhook
#[derive(Debug, Clone, Serialize)]
pub struct N8nRegistration {
    /// The stored config
    pub config: N8nConfig,
    /// Whether the registration-time probe reached the URL
    pub webhook_active: bool,
}

/// Partial n8n settings update; absent fields keep their stored values
#[derive(Debug, Clone, Default, Deserialize)]
pub struct N8nSettingsPatch {
    pub webhook_url: Option<String>,
    pub auth_token: Option<String>,
}

/// Partial LinkedIn OAuth settings update; absent fields keep their stored
/// values
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OauthSettingsPatch {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    pub account_type: Option<crate::models::AccountType>,
}

/// Combined settings update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub n8n: Option<N8nSettingsPatch>,
    pub linkedin_oauth: Option<OauthSettingsPatch>,
}

/// A user's stored integration settings
#[derive(Debug, Clone, Serialize)]
pub struct SettingsView {
    pub n8n: Option<N8nConfig>,
    pub linkedin_oauth: Option<LinkedinOauthConfig>,
}

/// OAuth credentials together with the derived authorization URL
#[derive(Debug, Clone, Serialize)]
pub struct OauthOverview {
    pub config: Option<LinkedinOauthConfig>,
    pub authorization_url: Option<String>,
}

/// Settings service
pub struct SettingsService {
    n8n_repo: Arc<dyn N8nConfigRepository>,
    oauth_repo: Arc<dyn LinkedinOauthRepository>,
    client: N8nClient,
}

impl SettingsService {
    pub fn new(
        n8n_repo: Arc<dyn N8nConfigRepository>,
        oauth_repo: Arc<dyn LinkedinOauthRepository>,
        client: N8nClient,
    ) -> Self {
        Self {
            n8n_repo,
            oauth_repo,
            client,
        }
    }

    /// Register or replace the user's n8n webhook URL.
    ///
    /// The URL is probed with a short GET first; an unreachable URL is
    /// registered anyway and only reported through `webhook_active`.
    pub async fn register_n8n(
        &self,
        user_id: i64,
        webhook_url: String,
    ) -> Result<N8nRegistration, SettingsServiceError> {
        if webhook_url.trim().is_empty() {
            return Err(SettingsServiceError::ValidationError(
                "Webhook URL is required".to_string(),
            ));
        }

        let webhook_active = self.client.probe(&webhook_url).await;
        if !webhook_active {
            tracing::info!(url = %webhook_url, "webhook probe failed, registering anyway");
        }

        let config = self
            .n8n_repo
            .upsert(&N8nConfig::new(user_id, webhook_url, String::new()))
            .await?;

        tracing::info!(user_id, config_id = config.id, "n8n webhook registered");

        Ok(N8nRegistration {
            config,
            webhook_active,
        })
    }

    /// The user's webhook config, when registered
    pub async fn get_n8n(&self, user_id: i64) -> Result<N8nConfig, SettingsServiceError> {
        self.n8n_repo
            .get_by_user(user_id)
            .await?
            .ok_or(SettingsServiceError::NotFound)
    }

    /// Both stored configs at once
    pub async fn get_settings(&self, user_id: i64) -> Result<SettingsView, SettingsServiceError> {
        let n8n = self.n8n_repo.get_by_user(user_id).await?;
        let linkedin_oauth = self.oauth_repo.get_by_user(user_id).await?;

        Ok(SettingsView {
            n8n,
            linkedin_oauth,
        })
    }

    /// Partial upsert of either config; fields the patch leaves out keep
    /// their stored values, and a patch for a user without a stored config
    /// creates one from defaults.
    pub async fn update_settings(
        &self,
        user_id: i64,
        update: SettingsUpdate,
    ) -> Result<SettingsView, SettingsServiceError> {
        if let Some(patch) = update.n8n {
            let existing = self.n8n_repo.get_by_user(user_id).await?;
            let (webhook_url, auth_token) = match existing {
                Some(config) => (
                    patch.webhook_url.unwrap_or(config.webhook_url),
                    patch.auth_token.unwrap_or(config.auth_token),
                ),
                None => (
                    patch.webhook_url.unwrap_or_default(),
                    patch.auth_token.unwrap_or_default(),
                ),
            };
            self.n8n_repo
                .upsert(&N8nConfig::new(user_id, webhook_url, auth_token))
                .await?;
        }

        if let Some(patch) = update.linkedin_oauth {
            let existing = self.oauth_repo.get_by_user(user_id).await?;
            let merged = match existing {
                Some(config) => LinkedinOauthConfig {
                    client_id: patch.client_id.unwrap_or(config.client_id),
                    client_secret: patch.client_secret.unwrap_or(config.client_secret),
                    redirect_uri: patch.redirect_uri.unwrap_or(config.redirect_uri),
                    account_type: patch.account_type.or(config.account_type),
                    ..config
                },
                None => new_oauth_config(
                    user_id,
                    UpsertOauthInput {
                        client_id: patch.client_id.unwrap_or_default(),
                        client_secret: patch.client_secret.unwrap_or_default(),
                        redirect_uri: patch.redirect_uri,
                        account_type: patch.account_type,
                        ..Default::default()
                    },
                ),
            };
            self.oauth_repo.upsert(&merged).await?;
        }

        self.get_settings(user_id).await
    }

    /// The user's OAuth credentials plus the derived authorization URL.
    /// A user without stored credentials gets empty defaults.
    pub async fn get_oauth(
        &self,
        user_id: i64,
        callback_url: &str,
    ) -> Result<OauthOverview, SettingsServiceError> {
        let config = self.oauth_repo.get_by_user(user_id).await?;
        let authorization_url = config
            .as_ref()
            .map(|config| config.authorization_url(callback_url));

        Ok(OauthOverview {
            config,
            authorization_url,
        })
    }

    /// Store or replace the user's OAuth credentials and return them with
    /// the derived authorization URL
    pub async fn upsert_oauth(
        &self,
        user_id: i64,
        input: UpsertOauthInput,
        callback_url: &str,
    ) -> Result<OauthOverview, SettingsServiceError> {
        if input.client_id.trim().is_empty() || input.client_secret.trim().is_empty() {
            return Err(SettingsServiceError::ValidationError(
                "Client ID and client secret are required".to_string(),
            ));
        }

        let config = self
            .oauth_repo
            .upsert(&new_oauth_config(user_id, input))
            .await?;

        tracing::info!(user_id, "LinkedIn OAuth credentials stored");

        let authorization_url = config.authorization_url(callback_url);
        Ok(OauthOverview {
            config: Some(config),
            authorization_url: Some(authorization_url),
        })
    }

    /// Store the authorization code captured by the OAuth callback
    pub async fn store_authorization_code(
        &self,
        user_id: i64,
        code: &str,
    ) -> Result<(), SettingsServiceError> {
        if self.oauth_repo.get_by_user(user_id).await?.is_none() {
            return Err(SettingsServiceError::NotFound);
        }

        self.oauth_repo.set_authorization_code(user_id, code).await?;
        tracing::info!(user_id, "LinkedIn authorization code stored");
        Ok(())
    }
}

fn new_oauth_config(user_id: i64, input: UpsertOauthInput) -> LinkedinOauthConfig {
    let now = Utc::now();
    LinkedinOauthConfig {
        id: 0, // Will be set by database
        user_id,
        client_id: input.client_id,
        client_secret: input.client_secret,
        redirect_uri: input
            .redirect_uri
            .filter(|uri| !uri.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
        authorization_code: input.authorization_code,
        linkedin_id: input.linkedin_id,
        account_type: input.account_type,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WebhookConfig;
    use crate::db::repositories::{
        SqlxLinkedinOauthRepository, SqlxN8nConfigRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{AccountType, User};
    use axum::routing::get;
    use axum::Router;

    const CALLBACK: &str = "http://localhost:8080/api/v1/linkedin-callback";

    async fn setup() -> (SettingsService, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::new(pool.clone());
        let user = user_repo
            .create(&User::new(
                "owner".to_string(),
                "owner@example.com".to_string(),
                "hash".to_string(),
            ))
            .await
            .expect("Failed to create user");

        let service = SettingsService::new(
            SqlxN8nConfigRepository::boxed(pool.clone()),
            SqlxLinkedinOauthRepository::boxed(pool.clone()),
            N8nClient::new(&WebhookConfig {
                probe_timeout_secs: 1,
                ..WebhookConfig::default()
            })
            .expect("Failed to build client"),
        );

        (service, user.id)
    }

    fn oauth_input() -> UpsertOauthInput {
        UpsertOauthInput {
            client_id: "client-1".to_string(),
            client_secret: "secret-1".to_string(),
            redirect_uri: None,
            authorization_code: None,
            linkedin_id: None,
            account_type: Some(AccountType::Person),
        }
    }

    #[tokio::test]
    async fn test_register_n8n_with_reachable_url() {
        let (service, user_id) = setup().await;

        let app = Router::new().route("/hook", get(|| async { "ok" }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let registration = service
            .register_n8n(user_id, format!("http://{}/hook", addr))
            .await
            .unwrap();

        assert!(registration.webhook_active);
        assert_eq!(registration.config.user_id, user_id);
    }

    #[tokio::test]
    async fn test_register_n8n_unreachable_url_still_stored() {
        let (service, user_id) = setup().await;

        let registration = service
            .register_n8n(user_id, "http://127.0.0.1:9/hook".to_string())
            .await
            .unwrap();

        assert!(!registration.webhook_active);
        let stored = service.get_n8n(user_id).await.unwrap();
        assert_eq!(stored.webhook_url, "http://127.0.0.1:9/hook");
    }

    #[tokio::test]
    async fn test_register_n8n_rejects_empty_url() {
        let (service, user_id) = setup().await;

        let err = service
            .register_n8n(user_id, "  ".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_get_n8n_unset_is_not_found() {
        let (service, user_id) = setup().await;

        let err = service.get_n8n(user_id).await.unwrap_err();
        assert!(matches!(err, SettingsServiceError::NotFound));
    }

    #[tokio::test]
    async fn test_upsert_oauth_requires_credentials() {
        let (service, user_id) = setup().await;

        let err = service
            .upsert_oauth(
                user_id,
                UpsertOauthInput {
                    client_id: "client-1".to_string(),
                    client_secret: String::new(),
                    ..Default::default()
                },
                CALLBACK,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_upsert_oauth_derives_authorization_url() {
        let (service, user_id) = setup().await;

        let overview = service
            .upsert_oauth(user_id, oauth_input(), CALLBACK)
            .await
            .unwrap();

        let url = overview.authorization_url.unwrap();
        assert!(url.starts_with("https://www.linkedin.com/oauth/v2/authorization"));
        assert!(url.contains("client_id=client-1"));
        assert!(url.contains("scope=w_member_social"));

        let config = overview.config.unwrap();
        assert_eq!(config.redirect_uri, DEFAULT_REDIRECT_URI);
    }

    #[tokio::test]
    async fn test_get_oauth_without_config_is_empty() {
        let (service, user_id) = setup().await;

        let overview = service.get_oauth(user_id, CALLBACK).await.unwrap();
        assert!(overview.config.is_none());
        assert!(overview.authorization_url.is_none());
    }

    #[tokio::test]
    async fn test_store_authorization_code() {
        let (service, user_id) = setup().await;

        let err = service
            .store_authorization_code(user_id, "code-123")
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsServiceError::NotFound));

        service
            .upsert_oauth(user_id, oauth_input(), CALLBACK)
            .await
            .unwrap();
        service
            .store_authorization_code(user_id, "code-123")
            .await
            .unwrap();

        let overview = service.get_oauth(user_id, CALLBACK).await.unwrap();
        assert_eq!(
            overview.config.unwrap().authorization_code.as_deref(),
            Some("code-123")
        );
    }

    #[tokio::test]
    async fn test_update_settings_partial_merge() {
        let (service, user_id) = setup().await;

        service
            .register_n8n(user_id, "http://127.0.0.1:9/hook".to_string())
            .await
            .unwrap();

        let view = service
            .update_settings(
                user_id,
                SettingsUpdate {
                    n8n: Some(N8nSettingsPatch {
                        webhook_url: None,
                        auth_token: Some("token-1".to_string()),
                    }),
                    linkedin_oauth: None,
                },
            )
            .await
            .unwrap();

        let n8n = view.n8n.unwrap();
        assert_eq!(n8n.webhook_url, "http://127.0.0.1:9/hook");
        assert_eq!(n8n.auth_token, "token-1");
    }

    #[tokio::test]
    async fn test_update_settings_creates_oauth_from_patch() {
        let (service, user_id) = setup().await;

        let view = service
            .update_settings(
                user_id,
                SettingsUpdate {
                    n8n: None,
                    linkedin_oauth: Some(OauthSettingsPatch {
                        client_id: Some("client-9".to_string()),
                        client_secret: Some("secret-9".to_string()),
                        redirect_uri: None,
                        account_type: None,
                    }),
                },
            )
            .await
            .unwrap();

        let oauth = view.linkedin_oauth.unwrap();
        assert_eq!(oauth.client_id, "client-9");
        assert_eq!(oauth.redirect_uri, DEFAULT_REDIRECT_URI);
    }
}
