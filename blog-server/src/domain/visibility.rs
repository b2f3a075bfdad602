//! Which posts a viewer is allowed to see.
//!
//! A post is public when it is published, its category (if it has one) is
//! published, and its publication date is not in the future. Authors always
//! see their own posts, including drafts and scheduled ones.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::post::PostEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Category(i64),
    Author(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public { now: DateTime<Utc> },
    Unrestricted,
}

impl Visibility {
    /// Unrestricted for the owner of the content, public for everybody else.
    pub fn for_viewer(viewer: Option<Uuid>, owner: Uuid, now: DateTime<Utc>) -> Self {
        match viewer {
            Some(id) if id == owner => Visibility::Unrestricted,
            _ => Visibility::Public { now },
        }
    }

    pub fn admits(&self, entry: &PostEntry) -> bool {
        match self {
            Visibility::Unrestricted => true,
            Visibility::Public { now } => is_public(entry, *now),
        }
    }

    pub fn public_only(&self) -> bool {
        matches!(self, Visibility::Public { .. })
    }

    /// Reference time used by the SQL rendering of the predicate.
    pub fn reference_time(&self) -> DateTime<Utc> {
        match self {
            Visibility::Public { now } => *now,
            Visibility::Unrestricted => Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostQuery {
    pub scope: PostScope,
    pub visibility: Visibility,
}

impl PostQuery {
    pub fn public(scope: PostScope, now: DateTime<Utc>) -> Self {
        Self {
            scope,
            visibility: Visibility::Public { now },
        }
    }

    pub fn category_id(&self) -> Option<i64> {
        match self.scope {
            PostScope::Category(id) => Some(id),
            _ => None,
        }
    }

    pub fn author_id(&self) -> Option<Uuid> {
        match self.scope {
            PostScope::Author(id) => Some(id),
            _ => None,
        }
    }

    pub fn matches(&self, entry: &PostEntry) -> bool {
        let in_scope = match self.scope {
            PostScope::All => true,
            PostScope::Category(id) => entry.category_id == Some(id),
            PostScope::Author(id) => entry.author_id == id,
        };
        in_scope && self.visibility.admits(entry)
    }
}

pub fn is_public(entry: &PostEntry, now: DateTime<Utc>) -> bool {
    entry.is_published && entry.category_is_published.unwrap_or(true) && entry.pub_date <= now
}

/// Filters `posts` down to the publicly visible ones, newest first.
pub fn visible_posts<I>(posts: I, now: DateTime<Utc>) -> Vec<PostEntry>
where
    I: IntoIterator<Item = PostEntry>,
{
    select_posts(posts, &PostQuery::public(PostScope::All, now))
}

/// Applies `query` to an explicit collection, ordered by publication date descending.
pub fn select_posts<I>(posts: I, query: &PostQuery) -> Vec<PostEntry>
where
    I: IntoIterator<Item = PostEntry>,
{
    let mut selected: Vec<PostEntry> = posts.into_iter().filter(|p| query.matches(p)).collect();
    selected.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
    selected
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    pub(crate) fn entry(id: i64, author: Uuid, pub_date: DateTime<Utc>) -> PostEntry {
        PostEntry {
            id,
            title: format!("post {id}"),
            text: "text".into(),
            pub_date,
            is_published: true,
            created_at: pub_date,
            image: None,
            author_id: author,
            author_username: "author".into(),
            category_id: Some(1),
            category_slug: Some("news".into()),
            category_title: Some("News".into()),
            category_is_published: Some(true),
            location_id: None,
            location_name: None,
            location_is_published: None,
            comment_count: 0,
        }
    }

    #[rstest]
    #[case::published(true, Some(true), -1, true)]
    #[case::unpublished_post(false, Some(true), -1, false)]
    #[case::hidden_category(true, Some(false), -1, false)]
    #[case::no_category(true, None, -1, true)]
    #[case::scheduled(true, Some(true), 1, false)]
    fn public_predicate(
        #[case] is_published: bool,
        #[case] category_is_published: Option<bool>,
        #[case] offset_hours: i64,
        #[case] expected: bool,
    ) {
        let now = Utc::now();
        let mut post = entry(1, Uuid::new_v4(), now + Duration::hours(offset_hours));
        post.is_published = is_published;
        post.category_is_published = category_is_published;
        if category_is_published.is_none() {
            post.category_id = None;
        }

        assert_eq!(is_public(&post, now), expected);
    }

    #[test]
    fn post_published_exactly_now_is_visible() {
        let now = Utc::now();
        assert!(is_public(&entry(1, Uuid::new_v4(), now), now));
    }

    #[test]
    fn visible_posts_orders_newest_first_and_drops_hidden() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let old = entry(1, author, now - Duration::days(3));
        let new = entry(2, author, now - Duration::days(1));
        let mut draft = entry(3, author, now - Duration::days(2));
        draft.is_published = false;
        let future = entry(4, author, now + Duration::days(1));

        let ids: Vec<i64> = visible_posts(vec![old, new, draft, future], now)
            .into_iter()
            .map(|p| p.id)
            .collect();

        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn owner_sees_everything_others_see_public() {
        let now = Utc::now();
        let owner = Uuid::new_v4();
        let mut draft = entry(1, owner, now + Duration::days(1));
        draft.is_published = false;

        let own = Visibility::for_viewer(Some(owner), owner, now);
        let stranger = Visibility::for_viewer(Some(Uuid::new_v4()), owner, now);
        let anonymous = Visibility::for_viewer(None, owner, now);

        assert!(own.admits(&draft));
        assert!(!stranger.admits(&draft));
        assert!(!anonymous.admits(&draft));
    }

    #[test]
    fn scope_restricts_by_category_and_author() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let mut other_category = entry(1, author, now - Duration::hours(1));
        other_category.category_id = Some(2);
        let same = entry(2, author, now - Duration::hours(1));
        let by_someone_else = entry(3, Uuid::new_v4(), now - Duration::hours(1));

        let in_category = PostQuery::public(PostScope::Category(1), now);
        assert!(!in_category.matches(&other_category));
        assert!(in_category.matches(&same));

        let by_author = PostQuery::public(PostScope::Author(author), now);
        assert!(by_author.matches(&other_category));
        assert!(!by_author.matches(&by_someone_else));
    }
}
