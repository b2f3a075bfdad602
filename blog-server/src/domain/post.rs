use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Editable fields of a post after form validation.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
    pub is_published: bool,
}

/// Input for a new post. The author is never taken from the form.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
    pub image: Option<String>,
    pub is_published: bool,
}

/// Full replacement of the editable fields of a post.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub location_id: Option<i64>,
    pub category_id: Option<i64>,
    pub image: Option<String>,
    pub is_published: bool,
}

/// A post joined with its author, taxonomy and comment count.
///
/// This is the row every listing and the detail page render.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostEntry {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub image: Option<String>,
    pub author_id: Uuid,
    pub author_username: String,
    pub category_id: Option<i64>,
    pub category_slug: Option<String>,
    pub category_title: Option<String>,
    pub category_is_published: Option<bool>,
    pub location_id: Option<i64>,
    pub location_name: Option<String>,
    pub location_is_published: Option<bool>,
    pub comment_count: i64,
}

impl NewPost {
    pub fn from_draft(draft: PostDraft, author_id: Uuid, image: Option<String>) -> Self {
        Self {
            title: draft.title,
            text: draft.text,
            pub_date: draft.pub_date,
            author_id,
            location_id: draft.location_id,
            category_id: draft.category_id,
            image,
            is_published: draft.is_published,
        }
    }
}

impl PostChanges {
    pub fn from_draft(draft: PostDraft, image: Option<String>) -> Self {
        Self {
            title: draft.title,
            text: draft.text,
            pub_date: draft.pub_date,
            location_id: draft.location_id,
            category_id: draft.category_id,
            image,
            is_published: draft.is_published,
        }
    }
}

