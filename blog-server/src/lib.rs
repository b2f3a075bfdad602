pub mod application;
pub mod data;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

use std::sync::Arc;

use actix_files::Files;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{App, web};
use sqlx::PgPool;

use crate::application::auth_service::AuthService;
use crate::application::comment_service::CommentService;
use crate::application::post_service::PostService;
use crate::application::taxonomy_service::TaxonomyService;
use crate::data::comment_repository::{CommentRepository, PostgresCommentRepository};
use crate::data::post_repository::{PostRepository, PostgresPostRepository};
use crate::data::taxonomy_repository::{PostgresTaxonomyRepository, TaxonomyRepository};
use crate::data::user_repository::{PostgresUserRepository, UserRepository};
use crate::domain::pagination::Paginator;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::media::MediaStorage;
use crate::infrastructure::security::JwtKeys;
use crate::presentation::handlers;
use crate::presentation::middleware::{RequestIdMiddleware, SessionMiddleware, TimingMiddleware};
use crate::presentation::templates::{Templates, error_pages};

pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub taxonomy: Arc<dyn TaxonomyRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            posts: Arc::new(PostgresPostRepository::new(pool.clone())),
            comments: Arc::new(PostgresCommentRepository::new(pool.clone())),
            taxonomy: Arc::new(PostgresTaxonomyRepository::new(pool)),
        }
    }
}

/// Everything a worker needs to serve requests. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub posts: PostService,
    pub comments: CommentService,
    pub taxonomy: TaxonomyService,
    pub templates: Templates,
    pub media: MediaStorage,
}

impl AppState {
    pub fn new(repos: Repositories, config: &AppConfig) -> Result<Self, tera::Error> {
        let templates = Templates::load(&config.templates_dir, &config.media_url)?;
        let media = MediaStorage::new(config.media_root.clone(), config.media_url.clone());

        Ok(Self {
            auth: AuthService::new(
                repos.users,
                JwtKeys::new(config.jwt_secret.clone(), config.session_ttl_hours),
            ),
            posts: PostService::new(
                Arc::clone(&repos.posts),
                media.clone(),
                Paginator::new(config.posts_per_page),
            ),
            comments: CommentService::new(repos.comments, repos.posts),
            taxonomy: TaxonomyService::new(repos.taxonomy),
            templates,
            media,
        })
    }
}

pub fn build_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state.auth))
        .app_data(web::Data::new(state.posts))
        .app_data(web::Data::new(state.comments))
        .app_data(web::Data::new(state.taxonomy))
        .app_data(web::Data::new(state.templates))
        .service(Files::new(state.media.url(), state.media.root()))
        .configure(handlers::configure)
        .wrap(error_pages())
        .wrap(SessionMiddleware)
        .wrap(Logger::default())
        .wrap(TimingMiddleware)
        .wrap(RequestIdMiddleware)
        .wrap(
            DefaultHeaders::new()
                .add(("X-Content-Type-Options", "nosniff"))
                .add(("Referrer-Policy", "no-referrer"))
                .add(("Permissions-Policy", "geolocation=()"))
                .add(("Cross-Origin-Opener-Policy", "same-origin")),
        )
}
