use blogicum_server::data::comment_repository::{CommentRepository, PostgresCommentRepository};
use blogicum_server::data::post_repository::{PostRepository, PostgresPostRepository};
use blogicum_server::data::taxonomy_repository::{PostgresTaxonomyRepository, TaxonomyRepository};
use blogicum_server::data::user_repository::{PostgresUserRepository, UserRepository};
use blogicum_server::domain::category::{Category, NewCategory};
use blogicum_server::domain::comment::NewComment;
use blogicum_server::domain::location::NewLocation;
use blogicum_server::domain::post::{NewPost, Post};
use blogicum_server::domain::user::User;
use blogicum_server::domain::visibility::{PostQuery, PostScope, Visibility};
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

struct Repos {
    users: PostgresUserRepository,
    posts: PostgresPostRepository,
    comments: PostgresCommentRepository,
    taxonomy: PostgresTaxonomyRepository,
}

impl Repos {
    fn new(pool: PgPool) -> Self {
        Self {
            users: PostgresUserRepository::new(pool.clone()),
            posts: PostgresPostRepository::new(pool.clone()),
            comments: PostgresCommentRepository::new(pool.clone()),
            taxonomy: PostgresTaxonomyRepository::new(pool),
        }
    }

    async fn user(&self, username: &str) -> User {
        self.users
            .create(User::new(
                username.into(),
                format!("{username}@example.com"),
                "not-a-real-hash".into(),
            ))
            .await
            .unwrap()
    }

    async fn category(&self, slug: &str, is_published: bool) -> Category {
        self.taxonomy
            .create_category(NewCategory {
                title: slug.to_uppercase(),
                description: String::new(),
                slug: slug.into(),
                is_published,
            })
            .await
            .unwrap()
    }

    async fn post(&self, author: Uuid, title: &str, pub_date: DateTime<Utc>) -> Post {
        self.post_with(NewPost {
            title: title.into(),
            text: format!("{title} text"),
            pub_date,
            author_id: author,
            location_id: None,
            category_id: None,
            image: None,
            is_published: true,
        })
        .await
    }

    async fn post_with(&self, post: NewPost) -> Post {
        self.posts.create(post).await.unwrap()
    }

    async fn ids(&self, query: PostQuery, limit: usize, offset: usize) -> Vec<i64> {
        self.posts
            .list_posts(&query, limit, offset)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect()
    }
}

fn draft(author: Uuid, title: &str, pub_date: DateTime<Utc>) -> NewPost {
    NewPost {
        title: title.into(),
        text: String::new(),
        pub_date,
        author_id: author,
        location_id: None,
        category_id: None,
        image: None,
        is_published: false,
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn public_feed_filters_hidden_posts(pool: PgPool) {
    let repos = Repos::new(pool);
    let now = Utc::now();
    let author = repos.user("author").await;
    let open = repos.category("open", true).await;
    let closed = repos.category("closed", false).await;

    let uncategorized = repos.post(author.id, "Plain", now - Duration::days(2)).await;
    let categorized = repos
        .post_with(NewPost {
            category_id: Some(open.id),
            is_published: true,
            ..draft(author.id, "Open", now - Duration::days(1))
        })
        .await;
    repos
        .post_with(NewPost {
            category_id: Some(closed.id),
            is_published: true,
            ..draft(author.id, "Closed", now - Duration::days(1))
        })
        .await;
    repos.post(author.id, "Scheduled", now + Duration::days(1)).await;
    repos
        .post_with(draft(author.id, "Draft", now - Duration::days(3)))
        .await;

    let query = PostQuery::public(PostScope::All, now);

    assert_eq!(
        repos.ids(query, 10, 0).await,
        vec![categorized.id, uncategorized.id]
    );
    assert_eq!(repos.posts.count_posts(&query).await.unwrap(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn author_sees_all_of_their_posts(pool: PgPool) {
    let repos = Repos::new(pool);
    let now = Utc::now();
    let author = repos.user("author").await;
    let other = repos.user("other").await;
    let closed = repos.category("closed", false).await;

    let scheduled = repos.post(author.id, "Scheduled", now + Duration::days(1)).await;
    let hidden = repos
        .post_with(NewPost {
            category_id: Some(closed.id),
            is_published: true,
            ..draft(author.id, "Closed", now - Duration::days(1))
        })
        .await;
    let unpublished = repos
        .post_with(draft(author.id, "Draft", now - Duration::days(2)))
        .await;
    repos.post(other.id, "Someone else", now - Duration::days(1)).await;

    let own = PostQuery {
        scope: PostScope::Author(author.id),
        visibility: Visibility::Unrestricted,
    };
    assert_eq!(
        repos.ids(own, 10, 0).await,
        vec![scheduled.id, hidden.id, unpublished.id]
    );
    assert_eq!(repos.posts.count_posts(&own).await.unwrap(), 3);

    let public = PostQuery::public(PostScope::Author(author.id), now);
    assert!(repos.ids(public, 10, 0).await.is_empty());
    assert_eq!(repos.posts.count_posts(&public).await.unwrap(), 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn category_scope_keeps_only_its_posts(pool: PgPool) {
    let repos = Repos::new(pool);
    let now = Utc::now();
    let author = repos.user("author").await;
    let travel = repos.category("travel", true).await;
    let food = repos.category("food", true).await;

    let trip = repos
        .post_with(NewPost {
            category_id: Some(travel.id),
            is_published: true,
            ..draft(author.id, "Trip", now - Duration::hours(1))
        })
        .await;
    repos
        .post_with(NewPost {
            category_id: Some(food.id),
            is_published: true,
            ..draft(author.id, "Soup", now - Duration::hours(1))
        })
        .await;

    assert_eq!(
        repos
            .ids(PostQuery::public(PostScope::Category(travel.id), now), 10, 0)
            .await,
        vec![trip.id]
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn pages_follow_newest_first_order(pool: PgPool) {
    let repos = Repos::new(pool);
    let now = Utc::now();
    let author = repos.user("author").await;

    let mut newest_first = Vec::new();
    for day in 1..=5 {
        let post = repos
            .post(author.id, &format!("Day {day}"), now - Duration::days(day))
            .await;
        newest_first.push(post.id);
    }
    let query = PostQuery::public(PostScope::All, now);

    assert_eq!(repos.ids(query, 2, 0).await, newest_first[0..2].to_vec());
    assert_eq!(repos.ids(query, 2, 2).await, newest_first[2..4].to_vec());
    assert_eq!(repos.ids(query, 2, 4).await, newest_first[4..].to_vec());
    assert_eq!(repos.posts.count_posts(&query).await.unwrap(), 5);
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_a_post_removes_its_comments(pool: PgPool) {
    let repos = Repos::new(pool);
    let author = repos.user("author").await;
    let post = repos
        .post(author.id, "Discussed", Utc::now() - Duration::days(1))
        .await;
    let comment = repos
        .comments
        .create(NewComment {
            text: "first".into(),
            post_id: post.id,
            author_id: author.id,
        })
        .await
        .unwrap();

    assert!(repos.posts.delete_post(post.id).await.unwrap());

    assert!(repos.comments.list_for_post(post.id).await.unwrap().is_empty());
    assert!(repos.comments.find_by_id(comment.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_taxonomy_keeps_posts(pool: PgPool) {
    let repos = Repos::new(pool);
    let now = Utc::now();
    let author = repos.user("author").await;
    let travel = repos.category("travel", true).await;
    let island = repos
        .taxonomy
        .create_location(NewLocation {
            name: "Island".into(),
            is_published: true,
        })
        .await
        .unwrap();
    let post = repos
        .post_with(NewPost {
            category_id: Some(travel.id),
            location_id: Some(island.id),
            is_published: true,
            ..draft(author.id, "Trip", now - Duration::days(1))
        })
        .await;

    assert!(repos.taxonomy.delete_category("travel").await.unwrap());
    assert!(repos.taxonomy.delete_location(island.id).await.unwrap());

    let kept = repos.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(kept.category_id, None);
    assert_eq!(kept.location_id, None);
    assert_eq!(
        repos
            .ids(PostQuery::public(PostScope::All, now), 10, 0)
            .await,
        vec![post.id]
    );
}
