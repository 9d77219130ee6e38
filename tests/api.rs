//! End-to-end API tests over an in-memory SQLite database.
//!
//! Each test builds the full router and drives it with `axum_test`,
//! covering the auth flow, post CRUD, settings, stats, and the public
//! webhook ingress.

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{json, Value};

use relaypost::{
    api::{build_router, AppState},
    config::WebhookConfig,
    db::{
        create_test_pool, migrations,
        repositories::{
            SqlxApprovalLogRepository, SqlxAuthSessionRepository, SqlxContentSessionRepository,
            SqlxLinkedinOauthRepository, SqlxN8nConfigRepository, SqlxPostRepository,
            SqlxUserRepository,
        },
    },
    services::{ContentService, PostService, SettingsService, UserService},
    webhook::N8nClient,
};

async fn test_server() -> TestServer {
    let pool = create_test_pool().await.expect("test pool");
    migrations::run_migrations(&pool).await.expect("migrations");

    let client = N8nClient::new(&WebhookConfig::default()).expect("client");

    let session_repo = SqlxContentSessionRepository::boxed(pool.clone());
    let post_repo = SqlxPostRepository::boxed(pool.clone());
    let n8n_repo = SqlxN8nConfigRepository::boxed(pool.clone());

    let state = AppState {
        pool: pool.clone(),
        user_service: Arc::new(UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxAuthSessionRepository::boxed(pool.clone()),
        )),
        post_service: Arc::new(PostService::new(post_repo.clone(), session_repo.clone())),
        content_service: Arc::new(ContentService::new(
            session_repo.clone(),
            post_repo,
            SqlxApprovalLogRepository::boxed(pool.clone()),
            n8n_repo.clone(),
            client.clone(),
        )),
        settings_service: Arc::new(SettingsService::new(
            n8n_repo,
            SqlxLinkedinOauthRepository::boxed(pool.clone()),
            client,
        )),
        session_repo,
        public_url: "http://localhost:8080".to_string(),
    };

    TestServer::new(build_router(state, "http://localhost:3000")).expect("server")
}

/// Register a user and return their session token
async fn register(server: &TestServer, username: &str) -> String {
    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "sifre-123",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["token"]
        .as_str()
        .expect("token")
        .to_string()
}

#[tokio::test]
async fn test_register_login_me_flow() {
    let server = test_server().await;
    let token = register(&server, "ayse").await;

    let me = server
        .get("/api/v1/auth/me")
        .authorization_bearer(&token)
        .await;
    me.assert_status_ok();
    assert_eq!(me.json::<Value>()["username"], "ayse");

    let login = server
        .post("/api/v1/auth/login")
        .json(&json!({"username_or_email": "ayse", "password": "sifre-123"}))
        .await;
    login.assert_status_ok();
    assert_eq!(login.json::<Value>()["user"]["username"], "ayse");

    let bad_login = server
        .post("/api/v1/auth/login")
        .json(&json!({"username_or_email": "ayse", "password": "yanlis"}))
        .await;
    bad_login.assert_status(axum::http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_auth() {
    let server = test_server().await;

    for path in ["/api/v1/posts", "/api/v1/stats", "/api/v1/settings"] {
        let response = server.get(path).await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_post_crud() {
    let server = test_server().await;
    let token = register(&server, "mehmet").await;

    let created = server
        .post("/api/v1/posts")
        .authorization_bearer(&token)
        .json(&json!({"content": "İlk gönderi", "publish_now": true}))
        .await;
    created.assert_status(axum::http::StatusCode::CREATED);
    let post = created.json::<Value>();
    assert_eq!(post["status"], "PUBLISHED");
    let id = post["id"].as_i64().expect("id");

    let list = server
        .get("/api/v1/posts")
        .authorization_bearer(&token)
        .await;
    list.assert_status_ok();
    let body = list.json::<Value>();
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"]["total"], 1);

    let updated = server
        .put(&format!("/api/v1/posts/{id}"))
        .authorization_bearer(&token)
        .json(&json!({"content": "Güncellendi"}))
        .await;
    updated.assert_status_ok();
    assert_eq!(updated.json::<Value>()["content"], "Güncellendi");

    let deleted = server
        .delete(&format!("/api/v1/posts/{id}"))
        .authorization_bearer(&token)
        .await;
    deleted.assert_status(axum::http::StatusCode::NO_CONTENT);

    let gone = server
        .get(&format!("/api/v1/posts/{id}"))
        .authorization_bearer(&token)
        .await;
    gone.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_posts_are_scoped_per_user() {
    let server = test_server().await;
    let owner = register(&server, "sahip").await;
    let other = register(&server, "baskasi").await;

    let created = server
        .post("/api/v1/posts")
        .authorization_bearer(&owner)
        .json(&json!({"content": "Gizli taslak"}))
        .await;
    let id = created.json::<Value>()["id"].as_i64().unwrap();

    let response = server
        .get(&format!("/api/v1/posts/{id}"))
        .authorization_bearer(&other)
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pagination_clamps_oversized_query() {
    let server = test_server().await;
    let token = register(&server, "sayfaci").await;

    server
        .post("/api/v1/posts")
        .authorization_bearer(&token)
        .json(&json!({"content": "Tek gönderi"}))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let posts = server
        .get("/api/v1/posts?page=70000&limit=70000")
        .authorization_bearer(&token)
        .await;
    posts.assert_status_ok();
    let body = posts.json::<Value>();
    assert_eq!(body["pagination"]["page"], 70000);
    assert_eq!(body["pagination"]["limit"], 100);
    assert_eq!(body["pagination"]["total"], 1);
    assert!(body["posts"].as_array().unwrap().is_empty());

    let sessions = server
        .get("/api/v1/content-sessions?page=70000&limit=70000")
        .authorization_bearer(&token)
        .await;
    sessions.assert_status_ok();
    assert_eq!(sessions.json::<Value>()["pagination"]["limit"], 100);
}

#[tokio::test]
async fn test_stats_counts() {
    let server = test_server().await;
    let token = register(&server, "analist").await;

    for body in [
        json!({"content": "bir", "publish_now": true}),
        json!({"content": "iki", "publish_now": true}),
        json!({"content": "uc", "scheduled_at": "2026-12-01T09:00:00Z"}),
    ] {
        server
            .post("/api/v1/posts")
            .authorization_bearer(&token)
            .json(&body)
            .await
            .assert_status(axum::http::StatusCode::CREATED);
    }

    let stats = server
        .get("/api/v1/stats")
        .authorization_bearer(&token)
        .await;
    stats.assert_status_ok();
    let body = stats.json::<Value>();
    assert_eq!(body["published"], 2);
    assert_eq!(body["scheduled"], 1);
    assert_eq!(body["total"], 3);
}

#[tokio::test]
async fn test_n8n_registration_and_webhook_ingress() {
    let server = test_server().await;
    let token = register(&server, "otomasyon").await;

    // Unreachable URL registers anyway, just flagged inactive
    let registered = server
        .post("/api/v1/n8n")
        .authorization_bearer(&token)
        .json(&json!({"webhook_url": "http://127.0.0.1:9/hook/abc123"}))
        .await;
    registered.assert_status_ok();
    let body = registered.json::<Value>();
    assert_eq!(body["webhook_active"], false);

    // Liveness check resolves the id to the stored config
    let check = server.get("/webhook/abc123").await;
    check.assert_status_ok();
    assert_eq!(check.json::<Value>()["status"], "active");

    // The workflow pushes content back through the public ingress
    let ingested = server
        .post("/webhook/abc123")
        .json(&json!({"content": "Otomatik içerik", "topic": "Rust"}))
        .await;
    ingested.assert_status_ok();
    let body = ingested.json::<Value>();
    assert_eq!(body["success"], true);
    assert_eq!(body["post_status"], "PUBLISHED");

    // Missing content is rejected
    let empty = server.post("/webhook/abc123").json(&json!({})).await;
    empty.assert_status(axum::http::StatusCode::BAD_REQUEST);

    // Unknown webhook id
    let unknown = server
        .post("/webhook/yok-boyle-bir-sey")
        .json(&json!({"content": "x"}))
        .await;
    unknown.assert_status(axum::http::StatusCode::NOT_FOUND);

    // The ingested post shows up in the owner's list
    let list = server
        .get("/api/v1/posts")
        .authorization_bearer(&token)
        .await;
    let body = list.json::<Value>();
    let posts = body["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["content"], "Otomatik içerik");
    assert_eq!(posts[0]["session_kind"], "webhook");
}

#[tokio::test]
async fn test_linkedin_oauth_settings() {
    let server = test_server().await;
    let token = register(&server, "pazarlama").await;

    // A fresh user gets empty defaults, not a 404
    let fresh = server
        .get("/api/v1/linkedin-oauth")
        .authorization_bearer(&token)
        .await;
    fresh.assert_status_ok();
    let body = fresh.json::<Value>();
    assert_eq!(body["client_id"], "");
    assert_eq!(body["oauth_url"], "");

    let stored = server
        .post("/api/v1/linkedin-oauth")
        .authorization_bearer(&token)
        .json(&json!({"client_id": "client-77", "client_secret": "gizli"}))
        .await;
    stored.assert_status_ok();
    let body = stored.json::<Value>();
    let oauth_url = body["oauth_url"].as_str().unwrap();
    assert!(oauth_url.starts_with("https://www.linkedin.com/oauth/v2/authorization"));
    assert!(oauth_url.contains("client_id=client-77"));
    assert!(oauth_url.contains("w_member_social"));

    // Missing secret is a validation error
    let invalid = server
        .post("/api/v1/linkedin-oauth")
        .authorization_bearer(&token)
        .json(&json!({"client_id": "client-77", "client_secret": ""}))
        .await;
    invalid.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_content_sessions_start_empty() {
    let server = test_server().await;
    let token = register(&server, "yeni").await;

    let list = server
        .get("/api/v1/content-sessions")
        .authorization_bearer(&token)
        .await;
    list.assert_status_ok();
    let body = list.json::<Value>();
    assert_eq!(body["sessions"].as_array().unwrap().len(), 0);

    let refreshed = server
        .post("/api/v1/content-sessions/refresh")
        .authorization_bearer(&token)
        .await;
    refreshed.assert_status_ok();
    assert_eq!(refreshed.json::<Value>()["updated"], 0);
}

#[tokio::test]
async fn test_start_content_without_n8n_config() {
    let server = test_server().await;
    let token = register(&server, "aceleci").await;

    let response = server
        .post("/api/v1/content")
        .authorization_bearer(&token)
        .json(&json!({"type": "auto", "user_input": "Rust hakkında bir yazı"}))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}
