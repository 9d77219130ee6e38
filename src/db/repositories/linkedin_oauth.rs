//! LinkedIn OAuth config repository
//!
//! One credential row per user, plus the targeted update used by the OAuth
//! callback to store the authorization code.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{AccountType, LinkedinOauthConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// LinkedIn OAuth config repository trait
#[async_trait]
pub trait LinkedinOauthRepository: Send + Sync {
    /// Create or replace the credentials for a user
    async fn upsert(&self, config: &LinkedinOauthConfig) -> Result<LinkedinOauthConfig>;

    /// Get the credentials for a user
    async fn get_by_user(&self, user_id: i64) -> Result<Option<LinkedinOauthConfig>>;

    /// Store the authorization code captured by the OAuth callback
    async fn set_authorization_code(&self, user_id: i64, code: &str) -> Result<()>;
}

/// SQLx-based LinkedIn OAuth config repository implementation
pub struct SqlxLinkedinOauthRepository {
    pool: DynDatabasePool,
}

impl SqlxLinkedinOauthRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn LinkedinOauthRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl LinkedinOauthRepository for SqlxLinkedinOauthRepository {
    async fn upsert(&self, config: &LinkedinOauthConfig) -> Result<LinkedinOauthConfig> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => upsert_sqlite(self.pool.as_sqlite().unwrap(), config).await,
            DatabaseDriver::Mysql => upsert_mysql(self.pool.as_mysql().unwrap(), config).await,
        }
    }

    async fn get_by_user(&self, user_id: i64) -> Result<Option<LinkedinOauthConfig>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_user_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => get_by_user_mysql(self.pool.as_mysql().unwrap(), user_id).await,
        }
    }

    async fn set_authorization_code(&self, user_id: i64, code: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_code_sqlite(self.pool.as_sqlite().unwrap(), user_id, code).await
            }
            DatabaseDriver::Mysql => {
                set_code_mysql(self.pool.as_mysql().unwrap(), user_id, code).await
            }
        }
    }
}

const OAUTH_COLUMNS: &str = "id, user_id, client_id, client_secret, redirect_uri, \
     authorization_code, linkedin_id, account_type, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn upsert_sqlite(
    pool: &SqlitePool,
    config: &LinkedinOauthConfig,
) -> Result<LinkedinOauthConfig> {
    let now = Utc::now();
    let account_type = config.account_type.map(|t| t.as_str());

    sqlx::query(
        r#"
        INSERT INTO linkedin_oauth_configs
            (user_id, client_id, client_secret, redirect_uri, authorization_code,
             linkedin_id, account_type, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, COALESCE(?, 'PERSON'), ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            client_id = excluded.client_id,
            client_secret = excluded.client_secret,
            redirect_uri = excluded.redirect_uri,
            authorization_code = excluded.authorization_code,
            linkedin_id = excluded.linkedin_id,
            account_type = excluded.account_type,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(config.user_id)
    .bind(&config.client_id)
    .bind(&config.client_secret)
    .bind(&config.redirect_uri)
    .bind(&config.authorization_code)
    .bind(&config.linkedin_id)
    .bind(account_type)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to upsert LinkedIn OAuth config")?;

    get_by_user_sqlite(pool, config.user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("LinkedIn OAuth config not found after upsert"))
}

async fn get_by_user_sqlite(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Option<LinkedinOauthConfig>> {
    let sql = format!(
        "SELECT {} FROM linkedin_oauth_configs WHERE user_id = ?",
        OAUTH_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get LinkedIn OAuth config")?;

    Ok(row.map(|row| row_to_config_sqlite(&row)))
}

async fn set_code_sqlite(pool: &SqlitePool, user_id: i64, code: &str) -> Result<()> {
    sqlx::query(
        "UPDATE linkedin_oauth_configs SET authorization_code = ?, updated_at = ? WHERE user_id = ?",
    )
    .bind(code)
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to store authorization code")?;

    Ok(())
}

fn row_to_config_sqlite(row: &sqlx::sqlite::SqliteRow) -> LinkedinOauthConfig {
    let account_type_str: Option<String> = row.get("account_type");

    LinkedinOauthConfig {
        id: row.get("id"),
        user_id: row.get("user_id"),
        client_id: row.get("client_id"),
        client_secret: row.get("client_secret"),
        redirect_uri: row
            .get::<Option<String>, _>("redirect_uri")
            .unwrap_or_default(),
        authorization_code: row.get("authorization_code"),
        linkedin_id: row.get("linkedin_id"),
        account_type: account_type_str.as_deref().and_then(AccountType::from_str),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn upsert_mysql(
    pool: &MySqlPool,
    config: &LinkedinOauthConfig,
) -> Result<LinkedinOauthConfig> {
    let now = Utc::now();
    let account_type = config.account_type.map(|t| t.as_str());

    sqlx::query(
        r#"
        INSERT INTO linkedin_oauth_configs
            (user_id, client_id, client_secret, redirect_uri, authorization_code,
             linkedin_id, account_type, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, COALESCE(?, 'PERSON'), ?, ?)
        ON DUPLICATE KEY UPDATE
            client_id = VALUES(client_id),
            client_secret = VALUES(client_secret),
            redirect_uri = VALUES(redirect_uri),
            authorization_code = VALUES(authorization_code),
            linkedin_id = VALUES(linkedin_id),
            account_type = VALUES(account_type),
            updated_at = VALUES(updated_at)
        "#,
    )
    .bind(config.user_id)
    .bind(&config.client_id)
    .bind(&config.client_secret)
    .bind(&config.redirect_uri)
    .bind(&config.authorization_code)
    .bind(&config.linkedin_id)
    .bind(account_type)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to upsert LinkedIn OAuth config")?;

    get_by_user_mysql(pool, config.user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("LinkedIn OAuth config not found after upsert"))
}

async fn get_by_user_mysql(
    pool: &MySqlPool,
    user_id: i64,
) -> Result<Option<LinkedinOauthConfig>> {
    let sql = format!(
        "SELECT {} FROM linkedin_oauth_configs WHERE user_id = ?",
        OAUTH_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get LinkedIn OAuth config")?;

    Ok(row.map(|row| row_to_config_mysql(&row)))
}

async fn set_code_mysql(pool: &MySqlPool, user_id: i64, code: &str) -> Result<()> {
    sqlx::query(
        "UPDATE linkedin_oauth_configs SET authorization_code = ?, updated_at = ? WHERE user_id = ?",
    )
    .bind(code)
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await
    .context("Failed to store authorization code")?;

    Ok(())
}

fn row_to_config_mysql(row: &sqlx::mysql::MySqlRow) -> LinkedinOauthConfig {
    let account_type_str: Option<String> = row.get("account_type");

    LinkedinOauthConfig {
        id: row.get("id"),
        user_id: row.get("user_id"),
        client_id: row.get("client_id"),
        client_secret: row.get("client_secret"),
        redirect_uri: row
            .get::<Option<String>, _>("redirect_uri")
            .unwrap_or_default(),
        authorization_code: row.get("authorization_code"),
        linkedin_id: row.get("linkedin_id"),
        account_type: account_type_str.as_deref().and_then(AccountType::from_str),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::UserRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::models::User;

    async fn setup() -> (DynDatabasePool, SqlxLinkedinOauthRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = super::super::user::SqlxUserRepository::new(pool.clone());
        let user = user_repo
            .create(&User::new(
                "oauth".to_string(),
                "oauth@example.com".to_string(),
                "hash".to_string(),
            ))
            .await
            .expect("Failed to create user");

        let repo = SqlxLinkedinOauthRepository::new(pool.clone());
        (pool, repo, user.id)
    }

    fn test_config(user_id: i64) -> LinkedinOauthConfig {
        LinkedinOauthConfig {
            id: 0,
            user_id,
            client_id: "client-abc".to_string(),
            client_secret: "hunter2".to_string(),
            redirect_uri: String::new(),
            authorization_code: None,
            linkedin_id: None,
            account_type: Some(AccountType::Person),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let (_pool, repo, user_id) = setup().await;

        let created = repo.upsert(&test_config(user_id)).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.client_id, "client-abc");
        assert_eq!(created.account_type, Some(AccountType::Person));

        let mut replacement = test_config(user_id);
        replacement.client_id = "client-def".to_string();
        replacement.account_type = Some(AccountType::Organization);

        let updated = repo.upsert(&replacement).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.client_id, "client-def");
        assert_eq!(updated.account_type, Some(AccountType::Organization));
    }

    #[tokio::test]
    async fn test_set_authorization_code() {
        let (_pool, repo, user_id) = setup().await;
        repo.upsert(&test_config(user_id)).await.unwrap();

        repo.set_authorization_code(user_id, "AQT-code")
            .await
            .unwrap();

        let found = repo.get_by_user(user_id).await.unwrap().unwrap();
        assert_eq!(found.authorization_code.as_deref(), Some("AQT-code"));
    }

    #[tokio::test]
    async fn test_get_by_user_missing() {
        let (_pool, repo, _user_id) = setup().await;
        assert!(repo.get_by_user(999).await.unwrap().is_none());
    }
}
