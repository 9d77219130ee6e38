//! Post repository
//!
//! Database operations for posts, including filtered listing with pagination
//! and the status counts behind the stats endpoint.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ListParams, Post, PostStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Filter options for listing posts
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Restrict to posts in any of these statuses (empty means all)
    pub statuses: Vec<PostStatus>,
    /// Restrict to posts whose metadata carries this ingress source
    pub source: Option<String>,
}

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a new post
    async fn create(&self, post: &Post) -> Result<Post>;

    /// Get post by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Get the post attached to a content session, if any
    async fn get_by_session_id(&self, session_id: &str) -> Result<Option<Post>>;

    /// Update a post
    async fn update(&self, post: &Post) -> Result<Post>;

    /// Delete a post
    async fn delete(&self, id: i64) -> Result<()>;

    /// List a user's posts with filters and pagination, newest first.
    /// Returns the page of posts plus the total matching count.
    async fn list(
        &self,
        user_id: i64,
        params: &ListParams,
        filter: &PostFilter,
    ) -> Result<(Vec<Post>, i64)>;

    /// Count a user's posts in any of the given statuses
    async fn count_by_statuses(&self, user_id: i64, statuses: &[PostStatus]) -> Result<i64>;
}

/// SQLx-based post repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_post_sqlite(self.pool.as_sqlite().unwrap(), post).await,
            DatabaseDriver::Mysql => create_post_mysql(self.pool.as_mysql().unwrap(), post).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_post_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_post_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_session_id(&self, session_id: &str) -> Result<Option<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_post_by_session_sqlite(self.pool.as_sqlite().unwrap(), session_id).await
            }
            DatabaseDriver::Mysql => {
                get_post_by_session_mysql(self.pool.as_mysql().unwrap(), session_id).await
            }
        }
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_post_sqlite(self.pool.as_sqlite().unwrap(), post).await,
            DatabaseDriver::Mysql => update_post_mysql(self.pool.as_mysql().unwrap(), post).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_post_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_post_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list(
        &self,
        user_id: i64,
        params: &ListParams,
        filter: &PostFilter,
    ) -> Result<(Vec<Post>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_posts_sqlite(self.pool.as_sqlite().unwrap(), user_id, params, filter).await
            }
            DatabaseDriver::Mysql => {
                list_posts_mysql(self.pool.as_mysql().unwrap(), user_id, params, filter).await
            }
        }
    }

    async fn count_by_statuses(&self, user_id: i64, statuses: &[PostStatus]) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_by_statuses_sqlite(self.pool.as_sqlite().unwrap(), user_id, statuses).await
            }
            DatabaseDriver::Mysql => {
                count_by_statuses_mysql(self.pool.as_mysql().unwrap(), user_id, statuses).await
            }
        }
    }
}

const POST_COLUMNS: &str = "id, user_id, session_id, content, image_url, topic, tone, platform, \
     status, linkedin_post_id, published_at, scheduled_at, metadata, created_at, updated_at";

/// Build the WHERE clause for a filtered list query.
/// Returns the SQL fragment; binding order is user_id, statuses, source pattern.
fn filter_clause(filter: &PostFilter) -> String {
    let mut clause = String::from("WHERE user_id = ?");

    if !filter.statuses.is_empty() {
        let placeholders = vec!["?"; filter.statuses.len()].join(", ");
        clause.push_str(&format!(" AND status IN ({})", placeholders));
    }

    if filter.source.is_some() {
        clause.push_str(" AND metadata LIKE ?");
    }

    clause
}

fn source_pattern(source: &str) -> String {
    format!("%\"source\":\"{}\"%", source)
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_post_sqlite(pool: &SqlitePool, post: &Post) -> Result<Post> {
    let now = Utc::now();
    let metadata = post.metadata.to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO posts (user_id, session_id, content, image_url, topic, tone, platform,
                           status, linkedin_post_id, published_at, scheduled_at, metadata,
                           created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(post.user_id)
    .bind(&post.session_id)
    .bind(&post.content)
    .bind(&post.image_url)
    .bind(&post.topic)
    .bind(&post.tone)
    .bind(&post.platform)
    .bind(post.status.as_str())
    .bind(&post.linkedin_post_id)
    .bind(post.published_at)
    .bind(post.scheduled_at)
    .bind(&metadata)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    let id = result.last_insert_rowid();

    let mut created = post.clone();
    created.id = id;
    created.created_at = now;
    created.updated_at = now;
    Ok(created)
}

async fn get_post_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    let sql = format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_post_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_post_by_session_sqlite(pool: &SqlitePool, session_id: &str) -> Result<Option<Post>> {
    let sql = format!(
        "SELECT {} FROM posts WHERE session_id = ? ORDER BY created_at DESC LIMIT 1",
        POST_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(session_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by session")?;

    match row {
        Some(row) => Ok(Some(row_to_post_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn update_post_sqlite(pool: &SqlitePool, post: &Post) -> Result<Post> {
    let now = Utc::now();
    let metadata = post.metadata.to_string();

    sqlx::query(
        r#"
        UPDATE posts
        SET content = ?, image_url = ?, topic = ?, tone = ?, platform = ?, status = ?,
            linkedin_post_id = ?, published_at = ?, scheduled_at = ?, metadata = ?,
            session_id = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&post.content)
    .bind(&post.image_url)
    .bind(&post.topic)
    .bind(&post.tone)
    .bind(&post.platform)
    .bind(post.status.as_str())
    .bind(&post.linkedin_post_id)
    .bind(post.published_at)
    .bind(post.scheduled_at)
    .bind(&metadata)
    .bind(&post.session_id)
    .bind(now)
    .bind(post.id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    get_post_by_id_sqlite(pool, post.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
}

async fn delete_post_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete post")?;

    Ok(())
}

async fn list_posts_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    params: &ListParams,
    filter: &PostFilter,
) -> Result<(Vec<Post>, i64)> {
    let clause = filter_clause(filter);

    let count_sql = format!("SELECT COUNT(*) as count FROM posts {}", clause);
    let mut count_query = sqlx::query(&count_sql).bind(user_id);
    for status in &filter.statuses {
        count_query = count_query.bind(status.as_str());
    }
    if let Some(source) = &filter.source {
        count_query = count_query.bind(source_pattern(source));
    }
    let total: i64 = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?
        .get("count");

    let list_sql = format!(
        "SELECT {} FROM posts {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        POST_COLUMNS, clause
    );
    let mut list_query = sqlx::query(&list_sql).bind(user_id);
    for status in &filter.statuses {
        list_query = list_query.bind(status.as_str());
    }
    if let Some(source) = &filter.source {
        list_query = list_query.bind(source_pattern(source));
    }
    let rows = list_query
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    let mut posts = Vec::new();
    for row in rows {
        posts.push(row_to_post_sqlite(&row)?);
    }

    Ok((posts, total))
}

async fn count_by_statuses_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    statuses: &[PostStatus],
) -> Result<i64> {
    if statuses.is_empty() {
        return Ok(0);
    }

    let placeholders = vec!["?"; statuses.len()].join(", ");
    let sql = format!(
        "SELECT COUNT(*) as count FROM posts WHERE user_id = ? AND status IN ({})",
        placeholders
    );

    let mut query = sqlx::query(&sql).bind(user_id);
    for status in statuses {
        query = query.bind(status.as_str());
    }

    let row = query
        .fetch_one(pool)
        .await
        .context("Failed to count posts by status")?;

    Ok(row.get("count"))
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    let status_str: String = row.get("status");
    let status = PostStatus::from_str(&status_str)
        .with_context(|| format!("Invalid post status in database: {}", status_str))?;

    let metadata_str: Option<String> = row.get("metadata");
    let metadata = metadata_str
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_else(|| serde_json::json!({}));

    Ok(Post {
        id: row.get("id"),
        user_id: row.get("user_id"),
        session_id: row.get("session_id"),
        content: row.get("content"),
        image_url: row.get("image_url"),
        topic: row.get("topic"),
        tone: row.get("tone"),
        platform: row.get("platform"),
        status,
        linkedin_post_id: row.get("linkedin_post_id"),
        published_at: row.get("published_at"),
        scheduled_at: row.get("scheduled_at"),
        metadata,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_post_mysql(pool: &MySqlPool, post: &Post) -> Result<Post> {
    let now = Utc::now();
    let metadata = post.metadata.to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO posts (user_id, session_id, content, image_url, topic, tone, platform,
                           status, linkedin_post_id, published_at, scheduled_at, metadata,
                           created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(post.user_id)
    .bind(&post.session_id)
    .bind(&post.content)
    .bind(&post.image_url)
    .bind(&post.topic)
    .bind(&post.tone)
    .bind(&post.platform)
    .bind(post.status.as_str())
    .bind(&post.linkedin_post_id)
    .bind(post.published_at)
    .bind(post.scheduled_at)
    .bind(&metadata)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    let id = result.last_insert_id() as i64;

    let mut created = post.clone();
    created.id = id;
    created.created_at = now;
    created.updated_at = now;
    Ok(created)
}

async fn get_post_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Post>> {
    let sql = format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_post_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_post_by_session_mysql(pool: &MySqlPool, session_id: &str) -> Result<Option<Post>> {
    let sql = format!(
        "SELECT {} FROM posts WHERE session_id = ? ORDER BY created_at DESC LIMIT 1",
        POST_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(session_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by session")?;

    match row {
        Some(row) => Ok(Some(row_to_post_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn update_post_mysql(pool: &MySqlPool, post: &Post) -> Result<Post> {
    let now = Utc::now();
    let metadata = post.metadata.to_string();

    sqlx::query(
        r#"
        UPDATE posts
        SET content = ?, image_url = ?, topic = ?, tone = ?, platform = ?, status = ?,
            linkedin_post_id = ?, published_at = ?, scheduled_at = ?, metadata = ?,
            session_id = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&post.content)
    .bind(&post.image_url)
    .bind(&post.topic)
    .bind(&post.tone)
    .bind(&post.platform)
    .bind(post.status.as_str())
    .bind(&post.linkedin_post_id)
    .bind(post.published_at)
    .bind(post.scheduled_at)
    .bind(&metadata)
    .bind(&post.session_id)
    .bind(now)
    .bind(post.id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    get_post_by_id_mysql(pool, post.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
}

async fn delete_post_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete post")?;

    Ok(())
}

async fn list_posts_mysql(
    pool: &MySqlPool,
    user_id: i64,
    params: &ListParams,
    filter: &PostFilter,
) -> Result<(Vec<Post>, i64)> {
    let clause = filter_clause(filter);

    let count_sql = format!("SELECT COUNT(*) as count FROM posts {}", clause);
    let mut count_query = sqlx::query(&count_sql).bind(user_id);
    for status in &filter.statuses {
        count_query = count_query.bind(status.as_str());
    }
    if let Some(source) = &filter.source {
        count_query = count_query.bind(source_pattern(source));
    }
    let total: i64 = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?
        .get("count");

    let list_sql = format!(
        "SELECT {} FROM posts {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
        POST_COLUMNS, clause
    );
    let mut list_query = sqlx::query(&list_sql).bind(user_id);
    for status in &filter.statuses {
        list_query = list_query.bind(status.as_str());
    }
    if let Some(source) = &filter.source {
        list_query = list_query.bind(source_pattern(source));
    }
    let rows = list_query
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    let mut posts = Vec::new();
    for row in rows {
        posts.push(row_to_post_mysql(&row)?);
    }

    Ok((posts, total))
}

async fn count_by_statuses_mysql(
    pool: &MySqlPool,
    user_id: i64,
    statuses: &[PostStatus],
) -> Result<i64> {
    if statuses.is_empty() {
        return Ok(0);
    }

    let placeholders = vec!["?"; statuses.len()].join(", ");
    let sql = format!(
        "SELECT COUNT(*) as count FROM posts WHERE user_id = ? AND status IN ({})",
        placeholders
    );

    let mut query = sqlx::query(&sql).bind(user_id);
    for status in statuses {
        query = query.bind(status.as_str());
    }

    let row = query
        .fetch_one(pool)
        .await
        .context("Failed to count posts by status")?;

    Ok(row.get("count"))
}

fn row_to_post_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Post> {
    let status_str: String = row.get("status");
    let status = PostStatus::from_str(&status_str)
        .with_context(|| format!("Invalid post status in database: {}", status_str))?;

    let metadata_str: Option<String> = row.get("metadata");
    let metadata = metadata_str
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_else(|| serde_json::json!({}));

    Ok(Post {
        id: row.get("id"),
        user_id: row.get("user_id"),
        session_id: row.get("session_id"),
        content: row.get("content"),
        image_url: row.get("image_url"),
        topic: row.get("topic"),
        tone: row.get("tone"),
        platform: row.get("platform"),
        status,
        linkedin_post_id: row.get("linkedin_post_id"),
        published_at: row.get("published_at"),
        scheduled_at: row.get("scheduled_at"),
        metadata,
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

    async fn setup() -> (DynDatabasePool, SqlxPostRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = super::super::user::SqlxUserRepository::new(pool.clone());
        let user = user_repo
            .create(&User::new(
                "poster".to_string(),
                "poster@example.com".to_string(),
                "hash".to_string(),
            ))
            .await
            .expect("Failed to create user");

        let repo = SqlxPostRepository::new(pool.clone());
        (pool, repo, user.id)
    }

    #[tokio::test]
    async fn test_create_and_get_post() {
        let (_pool, repo, user_id) = setup().await;
        let post = Post::new(user_id, "Hello LinkedIn".to_string(), PostStatus::Draft);

        let created = repo.create(&post).await.expect("Failed to create post");
        assert!(created.id > 0);

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get post")
            .expect("Post not found");

        assert_eq!(found.content, "Hello LinkedIn");
        assert_eq!(found.status, PostStatus::Draft);
        assert_eq!(found.platform, "linkedin");
    }

    #[tokio::test]
    async fn test_update_post_status() {
        let (_pool, repo, user_id) = setup().await;
        let post = Post::new(user_id, "draft".to_string(), PostStatus::Draft);
        let mut created = repo.create(&post).await.unwrap();

        created.status = PostStatus::Published;
        created.published_at = Some(Utc::now());
        created.linkedin_post_id = Some("urn:li:share:123".to_string());

        let updated = repo.update(&created).await.expect("Failed to update post");
        assert_eq!(updated.status, PostStatus::Published);
        assert_eq!(updated.linkedin_post_id.as_deref(), Some("urn:li:share:123"));
        assert!(updated.published_at.is_some());
    }

    #[tokio::test]
    async fn test_delete_post() {
        let (_pool, repo, user_id) = setup().await;
        let created = repo
            .create(&Post::new(user_id, "bye".to_string(), PostStatus::Draft))
            .await
            .unwrap();

        repo.delete(created.id).await.expect("Failed to delete");

        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_posts_with_status_filter() {
        let (_pool, repo, user_id) = setup().await;
        for status in [PostStatus::Draft, PostStatus::Published, PostStatus::Completed] {
            repo.create(&Post::new(user_id, format!("post {}", status), status))
                .await
                .unwrap();
        }

        let filter = PostFilter {
            statuses: vec![PostStatus::Published, PostStatus::Completed],
            source: None,
        };
        let (posts, total) = repo
            .list(user_id, &ListParams::default(), &filter)
            .await
            .expect("Failed to list posts");

        assert_eq!(total, 2);
        assert!(posts.iter().all(|p| p.status.is_published()));
    }

    #[tokio::test]
    async fn test_list_posts_pagination() {
        let (_pool, repo, user_id) = setup().await;
        for i in 0..5 {
            repo.create(&Post::new(user_id, format!("post {}", i), PostStatus::Draft))
                .await
                .unwrap();
        }

        let (page, total) = repo
            .list(user_id, &ListParams::new(2, 2), &PostFilter::default())
            .await
            .unwrap();

        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
    }

    #[tokio::test]
    async fn test_list_posts_source_filter() {
        let (_pool, repo, user_id) = setup().await;

        let mut webhook_post = Post::new(user_id, "from hook".to_string(), PostStatus::Scheduled);
        webhook_post.metadata = serde_json::json!({"source": "n8n_webhook"});
        repo.create(&webhook_post).await.unwrap();
        repo.create(&Post::new(user_id, "manual".to_string(), PostStatus::Draft))
            .await
            .unwrap();

        let filter = PostFilter {
            statuses: Vec::new(),
            source: Some("n8n_webhook".to_string()),
        };
        let (posts, total) = repo
            .list(user_id, &ListParams::default(), &filter)
            .await
            .unwrap();

        assert_eq!(total, 1);
        assert_eq!(posts[0].source(), Some("n8n_webhook"));
    }

    #[tokio::test]
    async fn test_get_by_session_id() {
        let (_pool, repo, user_id) = setup().await;

        let mut post = Post::new(user_id, "wizard output".to_string(), PostStatus::Published);
        post.session_id = Some("session-xyz".to_string());

        // session row must exist for the foreign key
        let pool = repo.pool.clone();
        pool.execute(&format!(
            "INSERT INTO content_sessions (id, user_id, kind) VALUES ('session-xyz', {}, 'auto')",
            user_id
        ))
        .await
        .unwrap();

        repo.create(&post).await.unwrap();

        let found = repo
            .get_by_session_id("session-xyz")
            .await
            .unwrap()
            .expect("Post not found");
        assert_eq!(found.content, "wizard output");
    }

    #[tokio::test]
    async fn test_count_by_statuses() {
        let (_pool, repo, user_id) = setup().await;
        for status in [
            PostStatus::Published,
            PostStatus::Completed,
            PostStatus::Scheduled,
            PostStatus::Draft,
        ] {
            repo.create(&Post::new(user_id, "x".to_string(), status))
                .await
                .unwrap();
        }

        let published = repo
            .count_by_statuses(user_id, &[PostStatus::Published, PostStatus::Completed])
            .await
            .unwrap();
        assert_eq!(published, 2);

        let scheduled = repo
            .count_by_statuses(user_id, &[PostStatus::Scheduled])
            .await
            .unwrap();
        assert_eq!(scheduled, 1);

        let none = repo.count_by_statuses(user_id, &[]).await.unwrap();
        assert_eq!(none, 0);
    }

    #[tokio::test]
    async fn test_metadata_roundtrip() {
        let (_pool, repo, user_id) = setup().await;

        let mut post = Post::new(user_id, "meta".to_string(), PostStatus::Draft);
        post.metadata = serde_json::json!({"source": "n8n_webhook", "raw": {"k": "v"}});

        let created = repo.create(&post).await.unwrap();
        let found = repo.get_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(found.metadata["source"], "n8n_webhook");
        assert_eq!(found.metadata["raw"]["k"], "v");
    }
}
