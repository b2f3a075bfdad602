use actix_web::cookie::{Cookie, SameSite, time};
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures_util::future::{Ready, ready};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::error::DomainError;

pub const SESSION_COOKIE: &str = "blogicum_session";

/// The signed-in user, placed into request extensions by the session middleware.
///
/// Extracting it on a request without a session redirects to the login page;
/// use `Option<AuthenticatedUser>` on pages anonymous visitors may see.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
}

impl FromRequest for AuthenticatedUser {
    type Error = DomainError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(DomainError::LoginRequired {
                next: requested_path(req),
            })),
        }
    }
}

fn requested_path(req: &HttpRequest) -> String {
    match req.query_string() {
        "" => req.path().to_string(),
        query => format!("{}?{}", req.path(), query),
    }
}

pub fn viewer_id(user: &Option<AuthenticatedUser>) -> Option<Uuid> {
    user.as_ref().map(|u| u.id)
}

pub fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", username)
}

/// Accepts only same-site absolute paths as a post-login destination.
pub fn safe_next(next: Option<&str>) -> Option<String> {
    next.map(str::trim)
        .filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
        .map(str::to_string)
}

pub fn session_cookie(token: String, ttl: chrono::Duration) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .finish()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();
    cookie.make_removal();
    cookie
}
