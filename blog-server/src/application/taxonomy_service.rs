use std::sync::Arc;

use tracing::instrument;

use crate::data::taxonomy_repository::TaxonomyRepository;
use crate::domain::category::{Category, NewCategory, is_valid_slug};
use crate::domain::error::DomainError;
use crate::domain::location::{Location, NewLocation};

#[derive(Clone)]
pub struct TaxonomyService {
    repo: Arc<dyn TaxonomyRepository>,
}

impl TaxonomyService {
    pub fn new(repo: Arc<dyn TaxonomyRepository>) -> Self {
        Self { repo }
    }

    /// A category page exists only while the category is published.
    pub async fn published_category(&self, slug: &str) -> Result<Category, DomainError> {
        self.repo
            .find_category_by_slug(slug)
            .await?
            .filter(|c| c.is_published)
            .ok_or_else(|| DomainError::CategoryNotFound(slug.to_string()))
    }

    pub async fn categories(&self) -> Result<Vec<Category>, DomainError> {
        self.repo.list_categories().await
    }

    pub async fn locations(&self) -> Result<Vec<Location>, DomainError> {
        self.repo.list_locations().await
    }

    pub async fn category_exists(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.repo.find_category(id).await?.is_some())
    }

    pub async fn location_exists(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.repo.find_location(id).await?.is_some())
    }

    #[instrument(skip(self))]
    pub async fn create_category(&self, category: NewCategory) -> Result<Category, DomainError> {
        if !is_valid_slug(&category.slug) {
            return Err(DomainError::Validation(format!(
                "invalid slug: {}",
                category.slug
            )));
        }
        self.repo.create_category(category).await
    }

    #[instrument(skip(self))]
    pub async fn set_category_published(
        &self,
        slug: &str,
        is_published: bool,
    ) -> Result<(), DomainError> {
        if self.repo.set_category_published(slug, is_published).await? {
            Ok(())
        } else {
            Err(DomainError::CategoryNotFound(slug.to_string()))
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, slug: &str) -> Result<(), DomainError> {
        if self.repo.delete_category(slug).await? {
            Ok(())
        } else {
            Err(DomainError::CategoryNotFound(slug.to_string()))
        }
    }

    #[instrument(skip(self))]
    pub async fn create_location(&self, location: NewLocation) -> Result<Location, DomainError> {
        self.repo.create_location(location).await
    }

    #[instrument(skip(self))]
    pub async fn delete_location(&self, id: i64) -> Result<(), DomainError> {
        if self.repo.delete_location(id).await? {
            Ok(())
        } else {
            Err(DomainError::LocationNotFound(id))
        }
    }
}
