use crate::domain::comment::{Comment, NewComment};
use crate::domain::error::DomainError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, info};

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: NewComment) -> Result<Comment, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, DomainError>;
    /// Comments of a post, oldest first.
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError>;
    async fn update_text(&self, id: i64, text: String) -> Result<Option<Comment>, DomainError>;
    async fn delete_comment(&self, id: i64) -> Result<bool, DomainError>;
}

#[derive(Clone)]
pub struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COMMENT_SELECT: &str = r#"
    SELECT cm.id, cm.text, cm.post_id, cm.author_id, u.username AS author_username, cm.created_at
    FROM comments cm
    JOIN users u ON u.id = cm.author_id
"#;

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(&self, comment: NewComment) -> Result<Comment, DomainError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO comments (text, post_id, author_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&comment.text)
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create comment: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(comment_id = id, post_id = comment.post_id, "comment created");
        self.find_by_id(id)
            .await?
            .ok_or(DomainError::CommentNotFound(id))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, DomainError> {
        sqlx::query_as::<_, Comment>(&format!("{COMMENT_SELECT} WHERE cm.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("db error find comment {}: {}", id, e);
                DomainError::Internal(e.to_string())
            })
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        sqlx::query_as::<_, Comment>(&format!(
            "{COMMENT_SELECT} WHERE cm.post_id = $1 ORDER BY cm.created_at ASC, cm.id ASC"
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while fetching comments of post {}: {}", post_id, e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn update_text(&self, id: i64, text: String) -> Result<Option<Comment>, DomainError> {
        let updated = sqlx::query("UPDATE comments SET text = $1 WHERE id = $2")
            .bind(&text)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("failed to update comment {}: {}", id, e);
                DomainError::Internal(e.to_string())
            })?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        info!(comment_id = id, "comment updated");
        self.find_by_id(id).await
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let removed = deleted.rows_affected() > 0;
        if removed {
            info!(comment_id = id, "comment deleted");
        }
        Ok(removed)
    }
}
