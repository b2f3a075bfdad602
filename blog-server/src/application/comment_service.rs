use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::data::comment_repository::CommentRepository;
use crate::data::post_repository::PostRepository;
use crate::domain::comment::{Comment, NewComment};
use crate::domain::error::DomainError;

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { comments, posts }
    }

    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        self.comments.list_for_post(post_id).await
    }

    /// Looks a comment up under the post it must belong to.
    pub async fn get_comment(&self, post_id: i64, comment_id: i64) -> Result<Comment, DomainError> {
        self.comments
            .find_by_id(comment_id)
            .await?
            .filter(|c| c.post_id == post_id)
            .ok_or(DomainError::CommentNotFound(comment_id))
    }

    #[instrument(skip(self, text))]
    pub async fn add_comment(
        &self,
        post_id: i64,
        author_id: Uuid,
        text: String,
    ) -> Result<Comment, DomainError> {
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::PostNotFound(post_id));
        }
        self.comments
            .create(NewComment {
                text,
                post_id,
                author_id,
            })
            .await
    }

    #[instrument(skip(self, text))]
    pub async fn update_comment(&self, comment_id: i64, text: String) -> Result<Comment, DomainError> {
        self.comments
            .update_text(comment_id, text)
            .await?
            .ok_or(DomainError::CommentNotFound(comment_id))
    }

    #[instrument(skip(self))]
    pub async fn delete_comment(&self, comment_id: i64) -> Result<(), DomainError> {
        if self.comments.delete_comment(comment_id).await? {
            Ok(())
        } else {
            Err(DomainError::CommentNotFound(comment_id))
        }
    }
}
