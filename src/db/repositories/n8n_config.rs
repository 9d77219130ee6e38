//! n8n config repository
//!
//! One webhook configuration row per user. Also hosts the lookup used by
//! the public ingress, which identifies a workflow by a fragment of its
//! webhook URL.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::N8nConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// n8n config repository trait
#[async_trait]
pub trait N8nConfigRepository: Send + Sync {
    /// Create or replace the config for a user
    async fn upsert(&self, config: &N8nConfig) -> Result<N8nConfig>;

    /// Get the config for a user
    async fn get_by_user(&self, user_id: i64) -> Result<Option<N8nConfig>>;

    /// Find the first config whose webhook URL contains the given fragment
    async fn find_by_url_fragment(&self, fragment: &str) -> Result<Option<N8nConfig>>;
}

/// SQLx-based n8n config repository implementation
pub struct SqlxN8nConfigRepository {
    pool: DynDatabasePool,
}

impl SqlxN8nConfigRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn N8nConfigRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl N8nConfigRepository for SqlxN8nConfigRepository {
    async fn upsert(&self, config: &N8nConfig) -> Result<N8nConfig> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => upsert_sqlite(self.pool.as_sqlite().unwrap(), config).await,
            DatabaseDriver::Mysql => upsert_mysql(self.pool.as_mysql().unwrap(), config).await,
        }
    }

    async fn get_by_user(&self, user_id: i64) -> Result<Option<N8nConfig>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_user_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => get_by_user_mysql(self.pool.as_mysql().unwrap(), user_id).await,
        }
    }

    async fn find_by_url_fragment(&self, fragment: &str) -> Result<Option<N8nConfig>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                find_by_fragment_sqlite(self.pool.as_sqlite().unwrap(), fragment).await
            }
            DatabaseDriver::Mysql => {
                find_by_fragment_mysql(self.pool.as_mysql().unwrap(), fragment).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn upsert_sqlite(pool: &SqlitePool, config: &N8nConfig) -> Result<N8nConfig> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO n8n_configs (user_id, webhook_url, auth_token, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            webhook_url = excluded.webhook_url,
            auth_token = excluded.auth_token,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(config.user_id)
    .bind(&config.webhook_url)
    .bind(&config.auth_token)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to upsert n8n config")?;

    get_by_user_sqlite(pool, config.user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("n8n config not found after upsert"))
}

async fn get_by_user_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Option<N8nConfig>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, webhook_url, auth_token, created_at, updated_at
        FROM n8n_configs
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get n8n config")?;

    Ok(row.map(|row| row_to_config_sqlite(&row)))
}

async fn find_by_fragment_sqlite(pool: &SqlitePool, fragment: &str) -> Result<Option<N8nConfig>> {
    let pattern = format!("%{}%", fragment);
    let row = sqlx::query(
        r#"
        SELECT id, user_id, webhook_url, auth_token, created_at, updated_at
        FROM n8n_configs
        WHERE webhook_url LIKE ?
        ORDER BY updated_at DESC
        LIMIT 1
        "#,
    )
    .bind(&pattern)
    .fetch_optional(pool)
    .await
    .context("Failed to find n8n config by URL fragment")?;

    Ok(row.map(|row| row_to_config_sqlite(&row)))
}

fn row_to_config_sqlite(row: &sqlx::sqlite::SqliteRow) -> N8nConfig {
    N8nConfig {
        id: row.get("id"),
        user_id: row.get("user_id"),
        webhook_url: row.get("webhook_url"),
        auth_token: row.get("auth_token"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn upsert_mysql(pool: &MySqlPool, config: &N8nConfig) -> Result<N8nConfig> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO n8n_configs (user_id, webhook_url, auth_token, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            webhook_url = VALUES(webhook_url),
            auth_token = VALUES(auth_token),
            updated_at = VALUES(updated_at)
        "#,
    )
    .bind(config.user_id)
    .bind(&config.webhook_url)
    .bind(&config.auth_token)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to upsert n8n config")?;

    get_by_user_mysql(pool, config.user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("n8n config not found after upsert"))
}

async fn get_by_user_mysql(pool: &MySqlPool, user_id: i64) -> Result<Option<N8nConfig>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, webhook_url, auth_token, created_at, updated_at
        FROM n8n_configs
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get n8n config")?;

    Ok(row.map(|row| row_to_config_mysql(&row)))
}

async fn find_by_fragment_mysql(pool: &MySqlPool, fragment: &str) -> Result<Option<N8nConfig>> {
    let pattern = format!("%{}%", fragment);
    let row = sqlx::query(
        r#"
        SELECT id, user_id, webhook_url, auth_token, created_at, updated_at
        FROM n8n_configs
        WHERE webhook_url LIKE ?
        ORDER BY updated_at DESC
        LIMIT 1
        "#,
    )
    .bind(&pattern)
    .fetch_optional(pool)
    .await
    .context("Failed to find n8n config by URL fragment")?;

    Ok(row.map(|row| row_to_config_mysql(&row)))
}

fn row_to_config_mysql(row: &sqlx::mysql::MySqlRow) -> N8nConfig {
    N8nConfig {
        id: row.get("id"),
        user_id: row.get("user_id"),
        webhook_url: row.get("webhook_url"),
        auth_token: row.get("auth_token"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
