//! Restricts mutation of posts and comments to their authors.
//!
//! Posts and comments deny a stranger differently: a post bounces the user
//! back to its page, a comment answers with 403.

use uuid::Uuid;

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipPolicy {
    /// Send the user back to the post page without an error.
    RedirectToPost(i64),
    /// Fail with `Forbidden`.
    Forbid,
}

pub fn post_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

pub fn ensure_author(
    user_id: Uuid,
    author_id: Uuid,
    policy: OwnershipPolicy,
) -> Result<(), DomainError> {
    if user_id == author_id {
        return Ok(());
    }
    match policy {
        OwnershipPolicy::RedirectToPost(post_id) => Err(DomainError::NotAuthor {
            redirect_to: post_url(post_id),
        }),
        OwnershipPolicy::Forbid => Err(DomainError::Forbidden),
    }
}
