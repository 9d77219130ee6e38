//! Settings API endpoints
//!
//! Handles HTTP requests for integration settings:
//! - GET  /api/v1/settings - Both stored configs
//! - PUT  /api/v1/settings - Partial upsert of either config
//! - POST /api/v1/n8n - Register the webhook URL (with reachability probe)
//! - GET  /api/v1/n8n - Current webhook config
//! - GET  /api/v1/linkedin-oauth - OAuth credentials plus authorization URL
//! - POST /api/v1/linkedin-oauth - Store OAuth credentials
//! - GET  /api/v1/linkedin-callback?code= - Capture the authorization code

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{AccountType, N8nConfig, UpsertOauthInput};
use crate::services::SettingsUpdate;

/// Request body for registering an n8n webhook
#[derive(Debug, Deserialize)]
pub struct RegisterN8nRequest {
    pub webhook_url: String,
}

/// Response for a registered webhook
#[derive(Debug, Serialize)]
pub struct N8nRegistrationResponse {
    pub message: &'static str,
    pub config_id: i64,
    pub webhook_url: String,
    pub webhook_active: bool,
    /// What the public ingress expects to be POSTed at this URL
    pub expected_format: serde_json::Value,
}

/// Response for stored OAuth credentials
#[derive(Debug, Serialize)]
pub struct OauthResponse {
    pub client_id: String,
    pub redirect_uri: String,
    pub authorization_code: String,
    pub linkedin_id: String,
    pub account_type: Option<AccountType>,
    pub oauth_url: String,
}

/// Request body for storing OAuth credentials
#[derive(Debug, Deserialize)]
pub struct UpsertOauthRequest {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: Option<String>,
    pub authorization_code: Option<String>,
    pub linkedin_id: Option<String>,
    pub account_type: Option<AccountType>,
}

/// Query parameters for the OAuth callback
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
}

/// Build the settings router (all routes require auth)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings).put(update_settings))
        .route("/n8n", get(get_n8n).post(register_n8n))
        .route(
            "/linkedin-oauth",
            get(get_oauth).post(upsert_oauth),
        )
        .route("/linkedin-callback", get(linkedin_callback))
}

fn callback_url(state: &AppState) -> String {
    format!(
        "{}/api/v1/linkedin-callback",
        state.public_url.trim_end_matches('/')
    )
}

/// GET /api/v1/settings - Both stored configs
async fn get_settings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let view = state.settings_service.get_settings(user.0.id).await?;
    Ok(Json(view))
}

/// PUT /api/v1/settings - Partial upsert of either config
async fn update_settings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<SettingsUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .settings_service
        .update_settings(user.0.id, body)
        .await?;
    Ok(Json(view))
}

/// POST /api/v1/n8n - Register the webhook URL
async fn register_n8n(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<RegisterN8nRequest>,
) -> Result<Json<N8nRegistrationResponse>, ApiError> {
    let registration = state
        .settings_service
        .register_n8n(user.0.id, body.webhook_url)
        .await?;

    Ok(Json(N8nRegistrationResponse {
        message: "n8n webhook registered",
        config_id: registration.config.id,
        webhook_url: registration.config.webhook_url,
        webhook_active: registration.webhook_active,
        expected_format: serde_json::json!({
            "content": "string (required)",
            "topic": "string (optional)",
            "tone": "string (optional)",
            "platform": "string (optional)",
        }),
    }))
}

/// GET /api/v1/n8n - Current webhook config (404 when unset)
async fn get_n8n(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<N8nConfig>, ApiError> {
    let config = state.settings_service.get_n8n(user.0.id).await?;
    Ok(Json(config))
}

/// GET /api/v1/linkedin-oauth - OAuth credentials plus authorization URL.
/// A user without stored credentials gets empty defaults.
async fn get_oauth(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<OauthResponse>, ApiError> {
    let overview = state
        .settings_service
        .get_oauth(user.0.id, &callback_url(&state))
        .await?;

    let response = match overview.config {
        Some(config) => OauthResponse {
            client_id: config.client_id,
            redirect_uri: config.redirect_uri,
            authorization_code: config.authorization_code.unwrap_or_default(),
            linkedin_id: config.linkedin_id.unwrap_or_default(),
            account_type: config.account_type,
            oauth_url: overview.authorization_url.unwrap_or_default(),
        },
        None => OauthResponse {
            client_id: String::new(),
            redirect_uri: crate::models::DEFAULT_REDIRECT_URI.to_string(),
            authorization_code: String::new(),
            linkedin_id: String::new(),
            account_type: None,
            oauth_url: String::new(),
        },
    };

    Ok(Json(response))
}

/// POST /api/v1/linkedin-oauth - Store OAuth credentials
async fn upsert_oauth(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UpsertOauthRequest>,
) -> Result<Json<OauthResponse>, ApiError> {
    let overview = state
        .settings_service
        .upsert_oauth(
            user.0.id,
            UpsertOauthInput {
                client_id: body.client_id,
                client_secret: body.client_secret,
                redirect_uri: body.redirect_uri,
                authorization_code: body.authorization_code,
                linkedin_id: body.linkedin_id,
                account_type: body.account_type,
            },
            &callback_url(&state),
        )
        .await?;

    let config = overview
        .config
        .ok_or_else(|| ApiError::internal_error("OAuth config missing after upsert"))?;

    Ok(Json(OauthResponse {
        client_id: config.client_id,
        redirect_uri: config.redirect_uri,
        authorization_code: config.authorization_code.unwrap_or_default(),
        linkedin_id: config.linkedin_id.unwrap_or_default(),
        account_type: config.account_type,
        oauth_url: overview.authorization_url.unwrap_or_default(),
    }))
}

/// GET /api/v1/linkedin-callback?code= - Capture the authorization code,
/// then send the browser back to the settings page
async fn linkedin_callback(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, ApiError> {
    state
        .settings_service
        .store_authorization_code(user.0.id, &query.code)
        .await?;

    Ok(Redirect::to(
        "/settings/linkedin-oauth?success=true&message=Authorization+code+saved",
    ))
}
