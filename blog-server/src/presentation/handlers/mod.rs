use actix_web::web;
use serde::Deserialize;

pub mod auth;
pub mod blog;
pub mod comment;
pub mod post;
pub mod profile;

/// `?page=` of the paginated listings, kept raw so bad values fall back to page 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::scope())
        .service(blog::index)
        .service(blog::post_detail)
        .service(blog::category_posts)
        .service(post::create_post_form)
        .service(post::create_post)
        .service(post::edit_post_form)
        .service(post::edit_post)
        .service(post::delete_post_form)
        .service(post::delete_post)
        .service(comment::add_comment)
        .service(comment::edit_comment_form)
        .service(comment::edit_comment)
        .service(comment::delete_comment_form)
        .service(comment::delete_comment)
        .service(profile::profile)
        .service(profile::edit_profile_form)
        .service(profile::edit_profile);
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use actix_web::cookie::Cookie;
    use chrono::{DateTime, Duration, Utc};
    use tempfile::TempDir;
    use uuid::Uuid;

    use crate::data::memory::InMemoryStore;
    use crate::data::post_repository::PostRepository;
    use crate::data::taxonomy_repository::TaxonomyRepository;
    use crate::data::user_repository::UserRepository;
    use crate::domain::category::{Category, NewCategory};
    use crate::domain::post::{NewPost, Post};
    use crate::domain::user::User;
    use crate::infrastructure::config::{AppConfig, default_templates_dir};
    use crate::presentation::utils::SESSION_COOKIE;
    use crate::{AppState, Repositories};

    pub const BOUNDARY: &str = "blogicum-test-boundary";

    pub struct TestApp {
        pub state: AppState,
        pub store: Arc<InMemoryStore>,
        pub media: TempDir,
    }

    impl TestApp {
        pub fn new() -> Self {
            let store = Arc::new(InMemoryStore::new());
            let media = tempfile::tempdir().unwrap();
            let config = AppConfig {
                host: "127.0.0.1".into(),
                port: 0,
                database_url: String::new(),
                jwt_secret: "test-secret".into(),
                session_ttl_hours: 1,
                posts_per_page: 10,
                templates_dir: default_templates_dir(),
                media_root: media.path().to_path_buf(),
                media_url: "/media".into(),
            };
            let repos = Repositories {
                users: store.clone(),
                posts: store.clone(),
                comments: store.clone(),
                taxonomy: store.clone(),
            };
            let state = AppState::new(repos, &config).unwrap();
            Self {
                state,
                store,
                media,
            }
        }

        pub async fn user(&self, username: &str) -> User {
            let user = User::new(
                username.into(),
                format!("{username}@example.com"),
                "not-a-real-hash".into(),
            );
            UserRepository::create(self.store.as_ref(), user)
                .await
                .unwrap()
        }

        /// Session cookie the app accepts as `user`.
        pub fn session(&self, user: &User) -> Cookie<'static> {
            let token = self.state.auth.issue_token(user.id).unwrap();
            Cookie::new(SESSION_COOKIE, token)
        }

        pub async fn category(&self, slug: &str, is_published: bool) -> Category {
            self.store
                .create_category(NewCategory {
                    title: slug.to_uppercase(),
                    description: String::new(),
                    slug: slug.into(),
                    is_published,
                })
                .await
                .unwrap()
        }

        pub async fn post(
            &self,
            author: Uuid,
            title: &str,
            pub_date: DateTime<Utc>,
            category_id: Option<i64>,
        ) -> Post {
            PostRepository::create(
                self.store.as_ref(),
                NewPost {
                    title: title.into(),
                    text: format!("{title} text"),
                    pub_date,
                    author_id: author,
                    location_id: None,
                    category_id,
                    image: None,
                    is_published: true,
                },
            )
            .await
            .unwrap()
        }

        pub async fn published_post(&self, author: Uuid, title: &str) -> Post {
            self.post(author, title, Utc::now() - Duration::days(1), None)
                .await
        }
    }

    /// A `multipart/form-data` body with plain text parts.
    pub fn multipart(fields: &[(&str, &str)]) -> (String, Vec<u8>) {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        (
            format!("multipart/form-data; boundary={BOUNDARY}"),
            body.into_bytes(),
        )
    }

    pub fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
        resp.headers()
            .get(actix_web::http::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }
}
