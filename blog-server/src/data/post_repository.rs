use crate::domain::error::DomainError;
use crate::domain::post::{NewPost, Post, PostChanges, PostEntry};
use crate::domain::visibility::PostQuery;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, info};

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError>;
    async fn find_entry(&self, id: i64) -> Result<Option<PostEntry>, DomainError>;
    async fn update_post(&self, id: i64, changes: PostChanges)
    -> Result<Option<Post>, DomainError>;
    async fn delete_post(&self, id: i64) -> Result<bool, DomainError>;
    async fn count_posts(&self, query: &PostQuery) -> Result<usize, DomainError>;
    async fn list_posts(
        &self,
        query: &PostQuery,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostEntry>, DomainError>;
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const POST_COLUMNS: &str =
    "id, title, text, pub_date, author_id, location_id, category_id, image, is_published, created_at";

const ENTRY_SELECT: &str = r#"
    SELECT
        p.id, p.title, p.text, p.pub_date, p.is_published, p.created_at, p.image,
        p.author_id, u.username AS author_username,
        p.category_id, c.slug AS category_slug, c.title AS category_title,
        c.is_published AS category_is_published,
        p.location_id, l.name AS location_name, l.is_published AS location_is_published,
        (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN locations l ON l.id = p.location_id
"#;

// $1 category, $2 author, $3 public only, $4 reference time
const ENTRY_FILTER: &str = r#"
    WHERE ($1::BIGINT IS NULL OR p.category_id = $1)
      AND ($2::UUID IS NULL OR p.author_id = $2)
      AND (NOT $3 OR (p.is_published AND COALESCE(c.is_published, TRUE) AND p.pub_date <= $4))
"#;

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts
                (title, text, pub_date, author_id, location_id, category_id, image, is_published, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&post.title)
        .bind(&post.text)
        .bind(post.pub_date)
        .bind(post.author_id)
        .bind(post.location_id)
        .bind(post.category_id)
        .bind(&post.image)
        .bind(post.is_published)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create post: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(post_id = created.id, author_id = %created.author_id, "post created");
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("db error find_by_id {}: {}", id, e);
                DomainError::Internal(e.to_string())
            })
    }

    async fn find_entry(&self, id: i64) -> Result<Option<PostEntry>, DomainError> {
        sqlx::query_as::<_, PostEntry>(&format!("{ENTRY_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("db error find_entry {}: {}", id, e);
                DomainError::Internal(e.to_string())
            })
    }

    async fn update_post(
        &self,
        id: i64,
        changes: PostChanges,
    ) -> Result<Option<Post>, DomainError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET
                title = $1,
                text = $2,
                pub_date = $3,
                location_id = $4,
                category_id = $5,
                image = $6,
                is_published = $7
            WHERE id = $8
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&changes.title)
        .bind(&changes.text)
        .bind(changes.pub_date)
        .bind(changes.location_id)
        .bind(changes.category_id)
        .bind(&changes.image)
        .bind(changes.is_published)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to update post {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })?;

        if post.is_some() {
            info!(post_id = id, "post updated");
        }

        Ok(post)
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let removed = deleted.rows_affected() > 0;
        if removed {
            info!(post_id = id, "post deleted");
        }
        Ok(removed)
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COUNT(*)
            FROM posts p
            LEFT JOIN categories c ON c.id = p.category_id
            {ENTRY_FILTER}
            "#
        ))
        .bind(query.category_id())
        .bind(query.author_id())
        .bind(query.visibility.public_only())
        .bind(query.visibility.reference_time())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while counting posts: {}", e);
            DomainError::Internal(e.to_string())
        })?;

        Ok(count.max(0) as usize)
    }

    async fn list_posts(
        &self,
        query: &PostQuery,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostEntry>, DomainError> {
        sqlx::query_as::<_, PostEntry>(&format!(
            r#"
            {ENTRY_SELECT}
            {ENTRY_FILTER}
            ORDER BY p.pub_date DESC, p.id DESC
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(query.category_id())
        .bind(query.author_id())
        .bind(query.visibility.public_only())
        .bind(query.visibility.reference_time())
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while fetching posts: {}", e);
            DomainError::Internal(e.to_string())
        })
    }
}
