use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::data::post_repository::PostRepository;
use crate::domain::pagination::{Page, Paginator};
use crate::domain::post::{NewPost, PostChanges, PostDraft, PostEntry};
use crate::domain::visibility::{PostQuery, PostScope, Visibility};
use crate::domain::{error::DomainError, post::Post};
use crate::infrastructure::media::MediaStorage;

/// An uploaded image waiting in a temporary file.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub path: PathBuf,
    pub file_name: String,
}

/// What to do with the image of an edited post.
#[derive(Debug, Clone)]
pub enum ImageChange {
    Keep,
    Clear,
    Replace(ImageUpload),
}

#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    media: MediaStorage,
    paginator: Paginator,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>, media: MediaStorage, paginator: Paginator) -> Self {
        Self {
            repo,
            media,
            paginator,
        }
    }

    pub async fn get_post(&self, id: i64) -> Result<Post, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    /// The detail-page entry as seen by `viewer`: authors see their own
    /// drafts, everybody else only public posts.
    pub async fn get_entry_for(
        &self,
        id: i64,
        viewer: Option<Uuid>,
    ) -> Result<PostEntry, DomainError> {
        let entry = self
            .repo
            .find_entry(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))?;

        if Visibility::for_viewer(viewer, entry.author_id, Utc::now()).admits(&entry) {
            Ok(entry)
        } else {
            Err(DomainError::PostNotFound(id))
        }
    }

    pub async fn page(
        &self,
        query: PostQuery,
        raw_page: Option<&str>,
    ) -> Result<Page<PostEntry>, DomainError> {
        let total = self.repo.count_posts(&query).await?;
        let window = self.paginator.window(raw_page, total);
        let items = self
            .repo
            .list_posts(&query, window.limit, window.offset)
            .await?;
        Ok(Page::new(items, window))
    }

    pub async fn public_feed(&self, raw_page: Option<&str>) -> Result<Page<PostEntry>, DomainError> {
        self.page(PostQuery::public(PostScope::All, Utc::now()), raw_page)
            .await
    }

    pub async fn category_feed(
        &self,
        category_id: i64,
        raw_page: Option<&str>,
    ) -> Result<Page<PostEntry>, DomainError> {
        self.page(
            PostQuery::public(PostScope::Category(category_id), Utc::now()),
            raw_page,
        )
        .await
    }

    pub async fn author_feed(
        &self,
        author_id: Uuid,
        viewer: Option<Uuid>,
        raw_page: Option<&str>,
    ) -> Result<Page<PostEntry>, DomainError> {
        let query = PostQuery {
            scope: PostScope::Author(author_id),
            visibility: Visibility::for_viewer(viewer, author_id, Utc::now()),
        };
        self.page(query, raw_page).await
    }

    #[instrument(skip(self, draft, image))]
    pub async fn create_post(
        &self,
        author_id: Uuid,
        draft: PostDraft,
        image: Option<ImageUpload>,
    ) -> Result<Post, DomainError> {
        let image = match image {
            Some(upload) => Some(self.store_image(&upload).await?),
            None => None,
        };
        self.repo
            .create(NewPost::from_draft(draft, author_id, image))
            .await
    }

    #[instrument(skip(self, post, draft, image), fields(post_id = post.id))]
    pub async fn update_post(
        &self,
        post: &Post,
        draft: PostDraft,
        image: ImageChange,
    ) -> Result<Post, DomainError> {
        let (image, stale) = match image {
            ImageChange::Keep => (post.image.clone(), None),
            ImageChange::Clear => (None, post.image.clone()),
            ImageChange::Replace(upload) => {
                (Some(self.store_image(&upload).await?), post.image.clone())
            }
        };

        let updated = self
            .repo
            .update_post(post.id, PostChanges::from_draft(draft, image))
            .await?
            .ok_or(DomainError::PostNotFound(post.id))?;

        if let Some(stale) = stale {
            self.discard_image(&stale).await;
        }
        Ok(updated)
    }

    #[instrument(skip(self, post), fields(post_id = post.id))]
    pub async fn delete_post(&self, post: &Post) -> Result<(), DomainError> {
        if !self.repo.delete_post(post.id).await? {
            return Err(DomainError::PostNotFound(post.id));
        }
        if let Some(image) = &post.image {
            self.discard_image(image).await;
        }
        Ok(())
    }

    async fn store_image(&self, upload: &ImageUpload) -> Result<String, DomainError> {
        self.media
            .save_image(&upload.path, &upload.file_name)
            .await
            .map_err(|e| DomainError::Internal(format!("failed to store image: {}", e)))
    }

    async fn discard_image(&self, image: &str) {
        if let Err(e) = self.media.delete_image(image).await {
            warn!(%image, error = %e, "failed to remove image");
        }
    }
}
