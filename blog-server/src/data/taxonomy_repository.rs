use crate::domain::category::{Category, NewCategory};
use crate::domain::error::DomainError;
use crate::domain::location::{Location, NewLocation};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, info};

/// Categories and locations attached to posts.
#[async_trait]
pub trait TaxonomyRepository: Send + Sync {
    async fn create_category(&self, category: NewCategory) -> Result<Category, DomainError>;
    async fn find_category(&self, id: i64) -> Result<Option<Category>, DomainError>;
    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, DomainError>;
    async fn list_categories(&self) -> Result<Vec<Category>, DomainError>;
    async fn set_category_published(
        &self,
        slug: &str,
        is_published: bool,
    ) -> Result<bool, DomainError>;
    async fn delete_category(&self, slug: &str) -> Result<bool, DomainError>;

    async fn create_location(&self, location: NewLocation) -> Result<Location, DomainError>;
    async fn find_location(&self, id: i64) -> Result<Option<Location>, DomainError>;
    async fn list_locations(&self) -> Result<Vec<Location>, DomainError>;
    async fn delete_location(&self, id: i64) -> Result<bool, DomainError>;
}

#[derive(Clone)]
pub struct PostgresTaxonomyRepository {
    pool: PgPool,
}

impl PostgresTaxonomyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    error!("{}: {}", context, e);
    DomainError::Internal(format!("database error: {}", e))
}

#[async_trait]
impl TaxonomyRepository for PostgresTaxonomyRepository {
    async fn create_category(&self, category: NewCategory) -> Result<Category, DomainError> {
        let created = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (title, description, slug, is_published, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, slug, is_published, created_at
            "#,
        )
        .bind(&category.title)
        .bind(&category.description)
        .bind(&category.slug)
        .bind(category.is_published)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .and_then(|db| db.constraint())
                .map(|c| c.contains("categories_slug"))
                == Some(true)
            {
                DomainError::Validation(format!("slug already taken: {}", category.slug))
            } else {
                db_error("failed to create category", e)
            }
        })?;

        info!(category_id = created.id, slug = %created.slug, "category created");
        Ok(created)
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>, DomainError> {
        sqlx::query_as::<_, Category>(
            "SELECT id, title, description, slug, is_published, created_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("failed to find category", e))
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, DomainError> {
        sqlx::query_as::<_, Category>(
            "SELECT id, title, description, slug, is_published, created_at FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("failed to find category by slug", e))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        sqlx::query_as::<_, Category>(
            "SELECT id, title, description, slug, is_published, created_at FROM categories ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("failed to list categories", e))
    }

    async fn set_category_published(
        &self,
        slug: &str,
        is_published: bool,
    ) -> Result<bool, DomainError> {
        let updated = sqlx::query("UPDATE categories SET is_published = $1 WHERE slug = $2")
            .bind(is_published)
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("failed to update category", e))?;

        info!(%slug, is_published, "category visibility changed");
        Ok(updated.rows_affected() > 0)
    }

    async fn delete_category(&self, slug: &str) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM categories WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("failed to delete category", e))?;

        info!(%slug, "category deleted");
        Ok(deleted.rows_affected() > 0)
    }

    async fn create_location(&self, location: NewLocation) -> Result<Location, DomainError> {
        let created = sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (name, is_published, created_at)
            VALUES ($1, $2, $3)
            RETURNING id, name, is_published, created_at
            "#,
        )
        .bind(&location.name)
        .bind(location.is_published)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("failed to create location", e))?;

        info!(location_id = created.id, "location created");
        Ok(created)
    }

    async fn find_location(&self, id: i64) -> Result<Option<Location>, DomainError> {
        sqlx::query_as::<_, Location>(
            "SELECT id, name, is_published, created_at FROM locations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("failed to find location", e))
    }

    async fn list_locations(&self) -> Result<Vec<Location>, DomainError> {
        sqlx::query_as::<_, Location>(
            "SELECT id, name, is_published, created_at FROM locations ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("failed to list locations", e))
    }

    async fn delete_location(&self, id: i64) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("failed to delete location", e))?;

        info!(location_id = id, "location deleted");
        Ok(deleted.rows_affected() > 0)
    }
}
