use actix_web::http::header;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),
    #[error("post not found: {0}")]
    PostNotFound(i64),
    #[error("comment not found: {0}")]
    CommentNotFound(i64),
    #[error("category not found: {0}")]
    CategoryNotFound(String),
    #[error("location not found: {0}")]
    LocationNotFound(i64),
    #[error("login required")]
    LoginRequired { next: String },
    #[error("not the author")]
    NotAuthor { redirect_to: String },
    #[error("forbidden")]
    Forbidden,
    #[error("unauthorized")]
    Unauthorized,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::Internal(format!("database error: {}", err))
    }
}

impl From<tera::Error> for DomainError {
    fn from(err: tera::Error) -> Self {
        DomainError::Internal(format!("template error: {:?}", err))
    }
}

const NEXT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub fn login_url(next: &str) -> String {
    format!(
        "/auth/login/?next={}",
        utf8_percent_encode(next, NEXT_ENCODE_SET)
    )
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::UserNotFound(_)
            | DomainError::PostNotFound(_)
            | DomainError::CommentNotFound(_)
            | DomainError::CategoryNotFound(_)
            | DomainError::LocationNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::LoginRequired { .. } | DomainError::NotAuthor { .. } => StatusCode::FOUND,
            DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden => StatusCode::FORBIDDEN,
            DomainError::UserAlreadyExists(_) => StatusCode::CONFLICT,
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            DomainError::LoginRequired { next } => HttpResponse::Found()
                .insert_header((header::LOCATION, login_url(next)))
                .finish(),
            DomainError::NotAuthor { redirect_to } => HttpResponse::Found()
                .insert_header((header::LOCATION, redirect_to.as_str()))
                .finish(),
            DomainError::Internal(details) => {
                tracing::error!(%details, "internal error");
                HttpResponse::InternalServerError()
                    .content_type("text/plain; charset=utf-8")
                    .body("internal server error")
            }
            _ => HttpResponse::build(self.status_code())
                .content_type("text/plain; charset=utf-8")
                .body(self.to_string()),
        }
    }
}
