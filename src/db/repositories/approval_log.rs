//! Approval log repository
//!
//! Append-only inserts plus a per-session listing for audit views.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ApprovalLog, SuggestionType};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Approval log repository trait
#[async_trait]
pub trait ApprovalLogRepository: Send + Sync {
    /// Record a decision
    async fn create(&self, log: &ApprovalLog) -> Result<ApprovalLog>;

    /// List all decisions for a session, oldest first
    async fn list_by_session(&self, session_id: &str) -> Result<Vec<ApprovalLog>>;
}

/// SQLx-based approval log repository implementation
pub struct SqlxApprovalLogRepository {
    pool: DynDatabasePool,
}

impl SqlxApprovalLogRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ApprovalLogRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ApprovalLogRepository for SqlxApprovalLogRepository {
    async fn create(&self, log: &ApprovalLog) -> Result<ApprovalLog> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_log_sqlite(self.pool.as_sqlite().unwrap(), log).await,
            DatabaseDriver::Mysql => create_log_mysql(self.pool.as_mysql().unwrap(), log).await,
        }
    }

    async fn list_by_session(&self, session_id: &str) -> Result<Vec<ApprovalLog>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_session_sqlite(self.pool.as_sqlite().unwrap(), session_id).await
            }
            DatabaseDriver::Mysql => {
                list_by_session_mysql(self.pool.as_mysql().unwrap(), session_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_log_sqlite(pool: &SqlitePool, log: &ApprovalLog) -> Result<ApprovalLog> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO approval_logs (session_id, user_id, suggestion_type, approved,
                                   rejection_reason, response, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&log.session_id)
    .bind(log.user_id)
    .bind(log.suggestion_type.as_str())
    .bind(log.approved)
    .bind(&log.rejection_reason)
    .bind(&log.response)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create approval log")?;

    let mut created = log.clone();
    created.id = result.last_insert_rowid();
    created.created_at = now;
    Ok(created)
}

async fn list_by_session_sqlite(pool: &SqlitePool, session_id: &str) -> Result<Vec<ApprovalLog>> {
    let rows = sqlx::query(
        r#"
        SELECT id, session_id, user_id, suggestion_type, approved, rejection_reason,
               response, created_at
        FROM approval_logs
        WHERE session_id = ?
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await
    .context("Failed to list approval logs")?;

    let mut logs = Vec::new();
    for row in rows {
        logs.push(row_to_log_sqlite(&row)?);
    }

    Ok(logs)
}

fn row_to_log_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<ApprovalLog> {
    let type_str: String = row.get("suggestion_type");
    let suggestion_type = SuggestionType::from_str(&type_str)
        .with_context(|| format!("Invalid suggestion type in database: {}", type_str))?;

    Ok(ApprovalLog {
        id: row.get("id"),
        session_id: row.get("session_id"),
        user_id: row.get("user_id"),
        suggestion_type,
        approved: row.get("approved"),
        rejection_reason: row.get("rejection_reason"),
        response: row.get("response"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_log_mysql(pool: &MySqlPool, log: &ApprovalLog) -> Result<ApprovalLog> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO approval_logs (session_id, user_id, suggestion_type, approved,
                                   rejection_reason, response, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&log.session_id)
    .bind(log.user_id)
    .bind(log.suggestion_type.as_str())
    .bind(log.approved)
    .bind(&log.rejection_reason)
    .bind(&log.response)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create approval log")?;

    let mut created = log.clone();
    created.id = result.last_insert_id() as i64;
    created.created_at = now;
    Ok(created)
}

async fn list_by_session_mysql(pool: &MySqlPool, session_id: &str) -> Result<Vec<ApprovalLog>> {
    let rows = sqlx::query(
        r#"
        SELECT id, session_id, user_id, suggestion_type, approved, rejection_reason,
               response, created_at
        FROM approval_logs
        WHERE session_id = ?
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await
    .context("Failed to list approval logs")?;

    let mut logs = Vec::new();
    for row in rows {
        logs.push(row_to_log_mysql(&row)?);
    }

    Ok(logs)
}

fn row_to_log_mysql(row: &sqlx::mysql::MySqlRow) -> Result<ApprovalLog> {
    let type_str: String = row.get("suggestion_type");
    let suggestion_type = SuggestionType::from_str(&type_str)
        .with_context(|| format!("Invalid suggestion type in database: {}", type_str))?;

    Ok(ApprovalLog {
        id: row.get("id"),
        session_id: row.get("session_id"),
        user_id: row.get("user_id"),
        suggestion_type,
        approved: row.get("approved"),
        rejection_reason: row.get("rejection_reason"),
        response: row.get("response"),
        created_at: row.get("created_at"),
    })
}
