//! Repository implementations over plain vectors, for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::data::comment_repository::CommentRepository;
use crate::data::post_repository::PostRepository;
use crate::data::taxonomy_repository::TaxonomyRepository;
use crate::data::user_repository::UserRepository;
use crate::domain::category::{Category, NewCategory};
use crate::domain::comment::{Comment, NewComment};
use crate::domain::error::DomainError;
use crate::domain::location::{Location, NewLocation};
use crate::domain::post::{NewPost, Post, PostChanges, PostEntry};
use crate::domain::user::{ProfileChanges, User};
use crate::domain::visibility::{PostQuery, select_posts};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    categories: Vec<Category>,
    locations: Vec<Location>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn entry(&self, post: &Post) -> PostEntry {
        let author = self.users.iter().find(|u| u.id == post.author_id);
        let category = post
            .category_id
            .and_then(|id| self.categories.iter().find(|c| c.id == id));
        let location = post
            .location_id
            .and_then(|id| self.locations.iter().find(|l| l.id == id));
        PostEntry {
            id: post.id,
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: post.pub_date,
            is_published: post.is_published,
            created_at: post.created_at,
            image: post.image.clone(),
            author_id: post.author_id,
            author_username: author.map(|u| u.username.clone()).unwrap_or_default(),
            category_id: category.map(|c| c.id),
            category_slug: category.map(|c| c.slug.clone()),
            category_title: category.map(|c| c.title.clone()),
            category_is_published: category.map(|c| c.is_published),
            location_id: location.map(|l| l.id),
            location_name: location.map(|l| l.name.clone()),
            location_is_published: location.map(|l| l.is_published),
            comment_count: self
                .comments
                .iter()
                .filter(|c| c.post_id == post.id)
                .count() as i64,
        }
    }

    fn entries(&self, query: &PostQuery) -> Vec<PostEntry> {
        select_posts(self.posts.iter().map(|p| self.entry(p)), query)
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut tables = self.tables.lock().unwrap();
        f(&mut tables)
    }

    /// Inserts a comment with an explicit timestamp.
    pub fn insert_comment_at(
        &self,
        comment: NewComment,
        created_at: chrono::DateTime<Utc>,
    ) -> Comment {
        self.with(|t| {
            let username = t
                .users
                .iter()
                .find(|u| u.id == comment.author_id)
                .map(|u| u.username.clone())
                .unwrap_or_default();
            let stored = Comment {
                id: t.next_id(),
                text: comment.text,
                post_id: comment.post_id,
                author_id: comment.author_id,
                author_username: username,
                created_at,
            };
            t.comments.push(stored.clone());
            stored
        })
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        self.with(|t| {
            if t.users.iter().any(|u| u.username == user.username) {
                return Err(DomainError::UserAlreadyExists(user.username.clone()));
            }
            t.users.push(user.clone());
            Ok(user)
        })
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        Ok(self.with(|t| t.users.iter().find(|u| u.username == username).cloned()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        Ok(self.with(|t| t.users.iter().find(|u| u.id == id).cloned()))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<User>, DomainError> {
        self.with(|t| {
            if t
                .users
                .iter()
                .any(|u| u.id != id && u.username == changes.username)
            {
                return Err(DomainError::UserAlreadyExists(changes.username.clone()));
            }
            let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
                return Ok(None);
            };
            user.username = changes.username;
            user.first_name = changes.first_name;
            user.last_name = changes.last_name;
            user.email = changes.email;
            let updated = user.clone();
            for comment in t.comments.iter_mut().filter(|c| c.author_id == id) {
                comment.author_username = updated.username.clone();
            }
            Ok(Some(updated))
        })
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
        Ok(self.with(|t| {
            let stored = Post {
                id: t.next_id(),
                title: post.title,
                text: post.text,
                pub_date: post.pub_date,
                author_id: post.author_id,
                location_id: post.location_id,
                category_id: post.category_id,
                image: post.image,
                is_published: post.is_published,
                created_at: Utc::now(),
            };
            t.posts.push(stored.clone());
            stored
        }))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, DomainError> {
        Ok(self.with(|t| t.posts.iter().find(|p| p.id == id).cloned()))
    }

    async fn find_entry(&self, id: i64) -> Result<Option<PostEntry>, DomainError> {
        Ok(self.with(|t| t.posts.iter().find(|p| p.id == id).map(|p| t.entry(p))))
    }

    async fn update_post(
        &self,
        id: i64,
        changes: PostChanges,
    ) -> Result<Option<Post>, DomainError> {
        Ok(self.with(|t| {
            let post = t.posts.iter_mut().find(|p| p.id == id)?;
            post.title = changes.title;
            post.text = changes.text;
            post.pub_date = changes.pub_date;
            post.location_id = changes.location_id;
            post.category_id = changes.category_id;
            post.image = changes.image;
            post.is_published = changes.is_published;
            Some(post.clone())
        }))
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.with(|t| {
            let before = t.posts.len();
            t.posts.retain(|p| p.id != id);
            t.comments.retain(|c| c.post_id != id);
            t.posts.len() < before
        }))
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<usize, DomainError> {
        Ok(self.with(|t| t.entries(query).len()))
    }

    async fn list_posts(
        &self,
        query: &PostQuery,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PostEntry>, DomainError> {
        Ok(self.with(|t| {
            t.entries(query)
                .into_iter()
                .skip(offset)
                .take(limit)
                .collect()
        }))
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create(&self, comment: NewComment) -> Result<Comment, DomainError> {
        Ok(self.insert_comment_at(comment, Utc::now()))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, DomainError> {
        Ok(self.with(|t| t.comments.iter().find(|c| c.id == id).cloned()))
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        Ok(self.with(|t| {
            let mut comments: Vec<Comment> = t
                .comments
                .iter()
                .filter(|c| c.post_id == post_id)
                .cloned()
                .collect();
            comments.sort_by_key(|c| (c.created_at, c.id));
            comments
        }))
    }

    async fn update_text(&self, id: i64, text: String) -> Result<Option<Comment>, DomainError> {
        Ok(self.with(|t| {
            let comment = t.comments.iter_mut().find(|c| c.id == id)?;
            comment.text = text;
            Some(comment.clone())
        }))
    }

    async fn delete_comment(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.with(|t| {
            let before = t.comments.len();
            t.comments.retain(|c| c.id != id);
            t.comments.len() < before
        }))
    }
}

#[async_trait]
impl TaxonomyRepository for InMemoryStore {
    async fn create_category(&self, category: NewCategory) -> Result<Category, DomainError> {
        self.with(|t| {
            if t.categories.iter().any(|c| c.slug == category.slug) {
                return Err(DomainError::Validation(format!(
                    "slug already taken: {}",
                    category.slug
                )));
            }
            let stored = Category {
                id: t.next_id(),
                title: category.title,
                description: category.description,
                slug: category.slug,
                is_published: category.is_published,
                created_at: Utc::now(),
            };
            t.categories.push(stored.clone());
            Ok(stored)
        })
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>, DomainError> {
        Ok(self.with(|t| t.categories.iter().find(|c| c.id == id).cloned()))
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, DomainError> {
        Ok(self.with(|t| t.categories.iter().find(|c| c.slug == slug).cloned()))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        Ok(self.with(|t| t.categories.clone()))
    }

    async fn set_category_published(
        &self,
        slug: &str,
        is_published: bool,
    ) -> Result<bool, DomainError> {
        Ok(self.with(|t| match t.categories.iter_mut().find(|c| c.slug == slug) {
            Some(category) => {
                category.is_published = is_published;
                true
            }
            None => false,
        }))
    }

    async fn delete_category(&self, slug: &str) -> Result<bool, DomainError> {
        Ok(self.with(|t| {
            let Some(id) = t.categories.iter().find(|c| c.slug == slug).map(|c| c.id) else {
                return false;
            };
            t.categories.retain(|c| c.id != id);
            for post in t.posts.iter_mut().filter(|p| p.category_id == Some(id)) {
                post.category_id = None;
            }
            true
        }))
    }

    async fn create_location(&self, location: NewLocation) -> Result<Location, DomainError> {
        Ok(self.with(|t| {
            let stored = Location {
                id: t.next_id(),
                name: location.name,
                is_published: location.is_published,
                created_at: Utc::now(),
            };
            t.locations.push(stored.clone());
            stored
        }))
    }

    async fn find_location(&self, id: i64) -> Result<Option<Location>, DomainError> {
        Ok(self.with(|t| t.locations.iter().find(|l| l.id == id).cloned()))
    }

    async fn list_locations(&self) -> Result<Vec<Location>, DomainError> {
        Ok(self.with(|t| t.locations.clone()))
    }

    async fn delete_location(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.with(|t| {
            let before = t.locations.len();
            t.locations.retain(|l| l.id != id);
            for post in t.posts.iter_mut().filter(|p| p.location_id == Some(id)) {
                post.location_id = None;
            }
            t.locations.len() < before
        }))
    }
}
