//! Tera-backed HTML rendering.

use std::path::Path;
use std::sync::Arc;

use actix_web::body::EitherBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::{HttpMessage, HttpResponse, web};
use tera::{Context, Tera};
use tracing::error;

use crate::domain::error::DomainError;
use crate::presentation::forms::FormErrors;
use crate::presentation::utils::AuthenticatedUser;

#[derive(Clone)]
pub struct Templates {
    tera: Arc<Tera>,
    media_url: String,
}

impl Templates {
    pub fn load(dir: &Path, media_url: &str) -> Result<Self, tera::Error> {
        let pattern = format!("{}/**/*.html", dir.display());
        let tera = Tera::new(&pattern)?;
        Ok(Self {
            tera: Arc::new(tera),
            media_url: media_url.to_string(),
        })
    }

    /// Base context shared by every page.
    pub fn context(&self, user: Option<&AuthenticatedUser>) -> Context {
        let mut ctx = Context::new();
        ctx.insert("user", &user);
        ctx.insert("media_url", &self.media_url);
        ctx.insert("errors", &FormErrors::default());
        ctx
    }

    pub fn render_string(&self, name: &str, ctx: &Context) -> Result<String, tera::Error> {
        self.tera.render(name, ctx)
    }

    pub fn render(&self, name: &str, ctx: &Context) -> Result<HttpResponse, DomainError> {
        self.render_with_status(StatusCode::OK, name, ctx)
    }

    pub fn render_with_status(
        &self,
        status: StatusCode,
        name: &str,
        ctx: &Context,
    ) -> Result<HttpResponse, DomainError> {
        let html = self.render_string(name, ctx)?;
        Ok(HttpResponse::build(status)
            .content_type(ContentType::html())
            .body(html))
    }
}

/// Replaces the bodies of 403, 404 and 500 responses with the error templates.
pub fn error_pages<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new()
        .handler(StatusCode::FORBIDDEN, render_error_page)
        .handler(StatusCode::NOT_FOUND, render_error_page)
        .handler(StatusCode::INTERNAL_SERVER_ERROR, render_error_page)
}

fn render_error_page<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let status = res.status();
    let rendered = {
        let req = res.request();
        req.app_data::<web::Data<Templates>>().map(|templates| {
            let user = req.extensions().get::<AuthenticatedUser>().cloned();
            let ctx = templates.context(user.as_ref());
            templates.render_string(&format!("errors/{}.html", status.as_u16()), &ctx)
        })
    };

    let html = match rendered {
        Some(Ok(html)) => html,
        Some(Err(e)) => {
            error!(error = ?e, status = status.as_u16(), "failed to render error page");
            return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
        }
        None => return Ok(ErrorHandlerResponse::Response(res.map_into_left_body())),
    };

    let (req, _) = res.into_parts();
    let response = HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(html);
    let res: ServiceResponse<EitherBody<B>> =
        ServiceResponse::new(req, response).map_into_right_body();
    Ok(ErrorHandlerResponse::Response(res))
}
