//! Relaypost - LinkedIn content automation backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relaypost::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxApprovalLogRepository, SqlxAuthSessionRepository, SqlxContentSessionRepository,
            SqlxLinkedinOauthRepository, SqlxN8nConfigRepository, SqlxPostRepository,
            SqlxUserRepository,
        },
    },
    services::{ContentService, PostService, SettingsService, UserService},
    webhook::N8nClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relaypost=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting relaypost server...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let auth_session_repo = SqlxAuthSessionRepository::boxed(pool.clone());
    let session_repo = SqlxContentSessionRepository::boxed(pool.clone());
    let post_repo = SqlxPostRepository::boxed(pool.clone());
    let approval_repo = SqlxApprovalLogRepository::boxed(pool.clone());
    let n8n_repo = SqlxN8nConfigRepository::boxed(pool.clone());
    let oauth_repo = SqlxLinkedinOauthRepository::boxed(pool.clone());

    // Outbound webhook client, shared by the content and settings services
    let client = N8nClient::new(&config.webhook)?;

    // Initialize services
    let user_service = Arc::new(UserService::new(user_repo, auth_session_repo));
    let post_service = Arc::new(PostService::new(post_repo.clone(), session_repo.clone()));
    let content_service = Arc::new(ContentService::new(
        session_repo.clone(),
        post_repo,
        approval_repo,
        n8n_repo.clone(),
        client.clone(),
    ));
    let settings_service = Arc::new(SettingsService::new(n8n_repo, oauth_repo, client));

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        user_service: user_service.clone(),
        post_service,
        content_service: content_service.clone(),
        settings_service,
        session_repo,
        public_url: config.server.public_url.clone(),
    };

    // Background task: promote in-progress sessions whose workflow has
    // since reported a publication, and prune expired auth sessions
    {
        let content_service = content_service.clone();
        let user_service = user_service.clone();
        let interval_secs = config.webhook.refresh_interval_secs;
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));
            loop {
                interval.tick().await;
                match content_service.refresh_all().await {
                    Ok(0) => {}
                    Ok(updated) => tracing::info!(updated, "sessions promoted by refresher"),
                    Err(e) => tracing::warn!("session refresh failed: {e:#}"),
                }
                if let Err(e) = user_service.cleanup_expired_sessions().await {
                    tracing::warn!("auth session cleanup failed: {e:#}");
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
