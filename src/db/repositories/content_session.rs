//! Content session repository
//!
//! Database operations for wizard runs, including the status scans used by
//! the background refresher.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ContentSession, ListParams, SessionKind, SessionStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Content session repository trait
#[async_trait]
pub trait ContentSessionRepository: Send + Sync {
    /// Create a new session
    async fn create(&self, session: &ContentSession) -> Result<ContentSession>;

    /// Get session by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<ContentSession>>;

    /// Update a session
    async fn update(&self, session: &ContentSession) -> Result<ContentSession>;

    /// List a user's sessions with pagination, newest first
    async fn list(&self, user_id: i64, params: &ListParams) -> Result<(Vec<ContentSession>, i64)>;

    /// List a user's sessions in any of the given statuses, newest first
    async fn list_by_statuses(
        &self,
        user_id: i64,
        statuses: &[SessionStatus],
    ) -> Result<Vec<ContentSession>>;

    /// List in-progress sessions (any user) that already have a publish
    /// reply recorded; these are the refresher's candidates
    async fn list_refresh_candidates(&self) -> Result<Vec<ContentSession>>;
}

/// SQLx-based content session repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxContentSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxContentSessionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContentSessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ContentSessionRepository for SqlxContentSessionRepository {
    async fn create(&self, session: &ContentSession) -> Result<ContentSession> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_session_sqlite(self.pool.as_sqlite().unwrap(), session).await
            }
            DatabaseDriver::Mysql => {
                create_session_mysql(self.pool.as_mysql().unwrap(), session).await
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<ContentSession>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_session_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_session_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn update(&self, session: &ContentSession) -> Result<ContentSession> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_session_sqlite(self.pool.as_sqlite().unwrap(), session).await
            }
            DatabaseDriver::Mysql => {
                update_session_mysql(self.pool.as_mysql().unwrap(), session).await
            }
        }
    }

    async fn list(&self, user_id: i64, params: &ListParams) -> Result<(Vec<ContentSession>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_sessions_sqlite(self.pool.as_sqlite().unwrap(), user_id, params).await
            }
            DatabaseDriver::Mysql => {
                list_sessions_mysql(self.pool.as_mysql().unwrap(), user_id, params).await
            }
        }
    }

    async fn list_by_statuses(
        &self,
        user_id: i64,
        statuses: &[SessionStatus],
    ) -> Result<Vec<ContentSession>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_statuses_sqlite(self.pool.as_sqlite().unwrap(), user_id, statuses).await
            }
            DatabaseDriver::Mysql => {
                list_by_statuses_mysql(self.pool.as_mysql().unwrap(), user_id, statuses).await
            }
        }
    }

    async fn list_refresh_candidates(&self) -> Result<Vec<ContentSession>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_refresh_candidates_sqlite(self.pool.as_sqlite().unwrap()).await
            }
            DatabaseDriver::Mysql => {
                list_refresh_candidates_mysql(self.pool.as_mysql().unwrap()).await
            }
        }
    }
}

const SESSION_COLUMNS: &str = "id, user_id, kind, status, user_input, suggestions, final_content, \
     webhook_response, publish_response, error, published_at, scheduled_at, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_session_sqlite(
    pool: &SqlitePool,
    session: &ContentSession,
) -> Result<ContentSession> {
    sqlx::query(
        r#"
        INSERT INTO content_sessions (id, user_id, kind, status, user_input, suggestions,
                                      final_content, webhook_response, publish_response, error,
                                      published_at, scheduled_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(session.user_id)
    .bind(session.kind.as_str())
    .bind(session.status.as_str())
    .bind(&session.user_input)
    .bind(&session.suggestions)
    .bind(&session.final_content)
    .bind(&session.webhook_response)
    .bind(&session.publish_response)
    .bind(&session.error)
    .bind(session.published_at)
    .bind(session.scheduled_at)
    .bind(session.created_at)
    .bind(session.updated_at)
    .execute(pool)
    .await
    .context("Failed to create content session")?;

    Ok(session.clone())
}

async fn get_session_sqlite(pool: &SqlitePool, id: &str) -> Result<Option<ContentSession>> {
    let sql = format!("SELECT {} FROM content_sessions WHERE id = ?", SESSION_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get content session")?;

    match row {
        Some(row) => Ok(Some(row_to_session_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn update_session_sqlite(
    pool: &SqlitePool,
    session: &ContentSession,
) -> Result<ContentSession> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE content_sessions
        SET kind = ?, status = ?, user_input = ?, suggestions = ?, final_content = ?,
            webhook_response = ?, publish_response = ?, error = ?, published_at = ?,
            scheduled_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(session.kind.as_str())
    .bind(session.status.as_str())
    .bind(&session.user_input)
    .bind(&session.suggestions)
    .bind(&session.final_content)
    .bind(&session.webhook_response)
    .bind(&session.publish_response)
    .bind(&session.error)
    .bind(session.published_at)
    .bind(session.scheduled_at)
    .bind(now)
    .bind(&session.id)
    .execute(pool)
    .await
    .context("Failed to update content session")?;

    get_session_sqlite(pool, &session.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Content session not found after update"))
}

async fn list_sessions_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    params: &ListParams,
) -> Result<(Vec<ContentSession>, i64)> {
    let total: i64 = sqlx::query("SELECT COUNT(*) as count FROM content_sessions WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to count content sessions")?
        .get("count");

    let sql = format!(
        "SELECT {} FROM content_sessions WHERE user_id = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
        SESSION_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list content sessions")?;

    let mut sessions = Vec::new();
    for row in rows {
        sessions.push(row_to_session_sqlite(&row)?);
    }

    Ok((sessions, total))
}

async fn list_by_statuses_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    statuses: &[SessionStatus],
) -> Result<Vec<ContentSession>> {
    if statuses.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; statuses.len()].join(", ");
    let sql = format!(
        "SELECT {} FROM content_sessions WHERE user_id = ? AND status IN ({}) ORDER BY created_at DESC",
        SESSION_COLUMNS, placeholders
    );

    let mut query = sqlx::query(&sql).bind(user_id);
    for status in statuses {
        query = query.bind(status.as_str());
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list content sessions by status")?;

    let mut sessions = Vec::new();
    for row in rows {
        sessions.push(row_to_session_sqlite(&row)?);
    }

    Ok(sessions)
}

async fn list_refresh_candidates_sqlite(pool: &SqlitePool) -> Result<Vec<ContentSession>> {
    let sql = format!(
        "SELECT {} FROM content_sessions WHERE status = 'IN_PROGRESS' AND publish_response IS NOT NULL",
        SESSION_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list refresh candidates")?;

    let mut sessions = Vec::new();
    for row in rows {
        sessions.push(row_to_session_sqlite(&row)?);
    }

    Ok(sessions)
}

fn row_to_session_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<ContentSession> {
    let kind_str: String = row.get("kind");
    let kind = SessionKind::from_str(&kind_str)
        .with_context(|| format!("Invalid session kind in database: {}", kind_str))?;

    let status_str: String = row.get("status");
    let status = SessionStatus::from_str(&status_str)
        .with_context(|| format!("Invalid session status in database: {}", status_str))?;

    let user_input: Option<String> = row.get("user_input");

    Ok(ContentSession {
        id: row.get("id"),
        user_id: row.get("user_id"),
        kind,
        status,
        user_input: user_input.unwrap_or_default(),
        suggestions: row.get("suggestions"),
        final_content: row.get("final_content"),
        webhook_response: row.get("webhook_response"),
        publish_response: row.get("publish_response"),
        error: row.get("error"),
        published_at: row.get("published_at"),
        scheduled_at: row.get("scheduled_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_session_mysql(
    pool: &MySqlPool,
    session: &ContentSession,
) -> Result<ContentSession> {
    sqlx::query(
        r#"
        INSERT INTO content_sessions (id, user_id, kind, status, user_input, suggestions,
                                      final_content, webhook_response, publish_response, error,
                                      published_at, scheduled_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(session.user_id)
    .bind(session.kind.as_str())
    .bind(session.status.as_str())
    .bind(&session.user_input)
    .bind(&session.suggestions)
    .bind(&session.final_content)
    .bind(&session.webhook_response)
    .bind(&session.publish_response)
    .bind(&session.error)
    .bind(session.published_at)
    .bind(session.scheduled_at)
    .bind(session.created_at)
    .bind(session.updated_at)
    .execute(pool)
    .await
    .context("Failed to create content session")?;

    Ok(session.clone())
}

async fn get_session_mysql(pool: &MySqlPool, id: &str) -> Result<Option<ContentSession>> {
    let sql = format!("SELECT {} FROM content_sessions WHERE id = ?", SESSION_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get content session")?;

    match row {
        Some(row) => Ok(Some(row_to_session_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn update_session_mysql(
    pool: &MySqlPool,
    session: &ContentSession,
) -> Result<ContentSession> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE content_sessions
        SET kind = ?, status = ?, user_input = ?, suggestions = ?, final_content = ?,
            webhook_response = ?, publish_response = ?, error = ?, published_at = ?,
            scheduled_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(session.kind.as_str())
    .bind(session.status.as_str())
    .bind(&session.user_input)
    .bind(&session.suggestions)
    .bind(&session.final_content)
    .bind(&session.webhook_response)
    .bind(&session.publish_response)
    .bind(&session.error)
    .bind(session.published_at)
    .bind(session.scheduled_at)
    .bind(now)
    .bind(&session.id)
    .execute(pool)
    .await
    .context("Failed to update content session")?;

    get_session_mysql(pool, &session.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Content session not found after update"))
}

async fn list_sessions_mysql(
    pool: &MySqlPool,
    user_id: i64,
    params: &ListParams,
) -> Result<(Vec<ContentSession>, i64)> {
    let total: i64 = sqlx::query("SELECT COUNT(*) as count FROM content_sessions WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("Failed to count content sessions")?
        .get("count");

    let sql = format!(
        "SELECT {} FROM content_sessions WHERE user_id = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
        SESSION_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list content sessions")?;

    let mut sessions = Vec::new();
    for row in rows {
        sessions.push(row_to_session_mysql(&row)?);
    }

    Ok((sessions, total))
}

async fn list_by_statuses_mysql(
    pool: &MySqlPool,
    user_id: i64,
    statuses: &[SessionStatus],
) -> Result<Vec<ContentSession>> {
    if statuses.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; statuses.len()].join(", ");
    let sql = format!(
        "SELECT {} FROM content_sessions WHERE user_id = ? AND status IN ({}) ORDER BY created_at DESC",
        SESSION_COLUMNS, placeholders
    );

    let mut query = sqlx::query(&sql).bind(user_id);
    for status in statuses {
        query = query.bind(status.as_str());
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list content sessions by status")?;

    let mut sessions = Vec::new();
    for row in rows {
        sessions.push(row_to_session_mysql(&row)?);
    }

    Ok(sessions)
}

async fn list_refresh_candidates_mysql(pool: &MySqlPool) -> Result<Vec<ContentSession>> {
    let sql = format!(
        "SELECT {} FROM content_sessions WHERE status = 'IN_PROGRESS' AND publish_response IS NOT NULL",
        SESSION_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list refresh candidates")?;

    let mut sessions = Vec::new();
    for row in rows {
        sessions.push(row_to_session_mysql(&row)?);
    }

    Ok(sessions)
}

fn row_to_session_mysql(row: &sqlx::mysql::MySqlRow) -> Result<ContentSession> {
    let kind_str: String = row.get("kind");
    let kind = SessionKind::from_str(&kind_str)
        .with_context(|| format!("Invalid session kind in database: {}", kind_str))?;

    let status_str: String = row.get("status");
    let status = SessionStatus::from_str(&status_str)
        .with_context(|| format!("Invalid session status in database: {}", status_str))?;

    let user_input: Option<String> = row.get("user_input");

    Ok(ContentSession {
        id: row.get("id"),
        user_id: row.get("user_id"),
        kind,
        status,
        user_input: user_input.unwrap_or_default(),
        suggestions: row.get("suggestions"),
        final_content: row.get("final_content"),
        webhook_response: row.get("webhook_response"),
        publish_response: row.get("publish_response"),
        error: row.get("error"),
        published_at: row.get("published_at"),
        scheduled_at: row.get("scheduled_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::UserRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;

    async fn setup() -> (DynDatabasePool, SqlxContentSessionRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = super::super::user::SqlxUserRepository::new(pool.clone());
        let user = user_repo
            .create(&User::new(
                "wizard".to_string(),
                "wizard@example.com".to_string(),
                "hash".to_string(),
            ))
            .await
            .expect("Failed to create user");

        let repo = SqlxContentSessionRepository::new(pool.clone());
        (pool, repo, user.id)
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let (_pool, repo, user_id) = setup().await;
        let session = ContentSession::new(user_id, SessionKind::Auto, "write about rust".to_string());

        repo.create(&session).await.expect("Failed to create session");

        let found = repo
            .get_by_id(&session.id)
            .await
            .expect("Failed to get session")
            .expect("Session not found");

        assert_eq!(found.kind, SessionKind::Auto);
        assert_eq!(found.status, SessionStatus::InProgress);
        assert_eq!(found.user_input, "write about rust");
    }

    #[tokio::test]
    async fn test_update_session() {
        let (_pool, repo, user_id) = setup().await;
        let mut session =
            ContentSession::new(user_id, SessionKind::TextOnly, "prompt".to_string());
        repo.create(&session).await.unwrap();

        session.status = SessionStatus::ReadyToPublish;
        session.final_content = Some(r#"{"text": "done"}"#.to_string());
        session.webhook_response = Some(r#"{"Status": "ok"}"#.to_string());

        let updated = repo.update(&session).await.expect("Failed to update");
        assert_eq!(updated.status, SessionStatus::ReadyToPublish);
        assert_eq!(updated.final_content.as_deref(), Some(r#"{"text": "done"}"#));
    }

    #[tokio::test]
    async fn test_list_sessions_paginated() {
        let (_pool, repo, user_id) = setup().await;
        for i in 0..3 {
            repo.create(&ContentSession::new(
                user_id,
                SessionKind::Auto,
                format!("prompt {}", i),
            ))
            .await
            .unwrap();
        }

        let (sessions, total) = repo
            .list(user_id, &ListParams::new(1, 2))
            .await
            .expect("Failed to list");

        assert_eq!(total, 3);
        assert_eq!(sessions.len(), 2);
    }

    #[tokio::test]
    async fn test_list_by_statuses() {
        let (_pool, repo, user_id) = setup().await;

        let in_progress =
            ContentSession::new(user_id, SessionKind::Auto, "one".to_string());
        repo.create(&in_progress).await.unwrap();

        let mut published =
            ContentSession::new(user_id, SessionKind::Auto, "two".to_string());
        published.status = SessionStatus::Published;
        repo.create(&published).await.unwrap();

        let found = repo
            .list_by_statuses(user_id, &[SessionStatus::InProgress])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, in_progress.id);

        let empty = repo.list_by_statuses(user_id, &[]).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_list_refresh_candidates() {
        let (_pool, repo, user_id) = setup().await;

        let mut with_reply =
            ContentSession::new(user_id, SessionKind::Auto, "one".to_string());
        with_reply.publish_response = Some("Post ID: urn:li:share:1".to_string());
        repo.create(&with_reply).await.unwrap();

        let without_reply =
            ContentSession::new(user_id, SessionKind::Auto, "two".to_string());
        repo.create(&without_reply).await.unwrap();

        let mut published =
            ContentSession::new(user_id, SessionKind::Auto, "three".to_string());
        published.status = SessionStatus::Published;
        published.publish_response = Some("Post ID: urn:li:share:2".to_string());
        repo.create(&published).await.unwrap();

        let candidates = repo.list_refresh_candidates().await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, with_reply.id);
    }

    #[tokio::test]
    async fn test_get_unknown_session() {
        let (_pool, repo, _user_id) = setup().await;
        let found = repo.get_by_id("nope").await.unwrap();
        assert!(found.is_none());
    }
}
