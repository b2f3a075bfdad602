use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, Scope, get, post, web};
use serde::Deserialize;
use tracing::{info, warn};

use crate::application::auth_service::AuthService;
use crate::domain::error::DomainError;
use crate::presentation::forms::{FormErrors, LoginForm, NON_FIELD_ERRORS, RegistrationForm};
use crate::presentation::middleware::request_id;
use crate::presentation::templates::Templates;
use crate::presentation::utils::{
    AuthenticatedUser, expired_session_cookie, profile_url, safe_next, session_cookie,
};

pub fn scope() -> Scope {
    web::scope("/auth")
        .service(login_form)
        .service(login)
        .service(logout)
        .service(registration_form)
        .service(registration)
}

#[derive(Debug, Deserialize)]
struct NextQuery {
    next: Option<String>,
}

fn redirect_with_cookie(location: &str, cookie: Cookie<'static>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .cookie(cookie)
        .finish()
}

fn render_login(
    templates: &Templates,
    user: Option<&AuthenticatedUser>,
    form: &LoginForm,
    errors: &FormErrors,
) -> Result<HttpResponse, DomainError> {
    let mut ctx = templates.context(user);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    templates.render("registration/login.html", &ctx)
}

fn render_registration(
    templates: &Templates,
    form: &RegistrationForm,
    errors: &FormErrors,
) -> Result<HttpResponse, DomainError> {
    let mut ctx = templates.context(None);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    templates.render("registration/registration_form.html", &ctx)
}

#[get("/login/")]
async fn login_form(
    user: Option<AuthenticatedUser>,
    templates: web::Data<Templates>,
    query: web::Query<NextQuery>,
) -> Result<HttpResponse, DomainError> {
    let form = LoginForm {
        next: safe_next(query.next.as_deref()),
        ..LoginForm::default()
    };
    render_login(&templates, user.as_ref(), &form, &FormErrors::default())
}

#[post("/login/")]
async fn login(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    templates: web::Data<Templates>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, DomainError> {
    let form = form.into_inner();
    if let Err(errors) = form.clean() {
        return render_login(&templates, None, &form, &errors);
    }
    let username = form.username.trim();

    let token = match auth.login(username, &form.password).await {
        Ok(token) => token,
        Err(DomainError::Unauthorized) => {
            warn!(request_id = %request_id(&req), %username, "login failed");
            let mut errors = FormErrors::default();
            errors.add(
                NON_FIELD_ERRORS,
                "Please enter a correct username and password. Note that both fields may be case-sensitive.",
            );
            return render_login(&templates, None, &form, &errors);
        }
        Err(e) => return Err(e),
    };

    info!(request_id = %request_id(&req), %username, "user logged in");

    let target = safe_next(form.next.as_deref()).unwrap_or_else(|| profile_url(username));
    Ok(redirect_with_cookie(
        &target,
        session_cookie(token, auth.keys().ttl()),
    ))
}

#[post("/logout/")]
async fn logout(req: HttpRequest, user: Option<AuthenticatedUser>) -> HttpResponse {
    if let Some(user) = user {
        info!(request_id = %request_id(&req), username = %user.username, "user logged out");
    }
    redirect_with_cookie("/", expired_session_cookie())
}

#[get("/registration/")]
async fn registration_form(
    templates: web::Data<Templates>,
) -> Result<HttpResponse, DomainError> {
    render_registration(&templates, &RegistrationForm::default(), &FormErrors::default())
}

#[post("/registration/")]
async fn registration(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    templates: web::Data<Templates>,
    form: web::Form<RegistrationForm>,
) -> Result<HttpResponse, DomainError> {
    let form = form.into_inner();
    if let Err(errors) = form.clean() {
        return render_registration(&templates, &form, &errors);
    }

    let user = match auth
        .register(
            form.username.trim().to_string(),
            form.email.trim().to_string(),
            form.password1.clone(),
        )
        .await
    {
        Ok(user) => user,
        Err(DomainError::UserAlreadyExists(_)) => {
            let mut errors = FormErrors::default();
            errors.add("username", "A user with that username already exists.");
            return render_registration(&templates, &form, &errors);
        }
        Err(e) => return Err(e),
    };

    info!(
        request_id = %request_id(&req),
        user_id = %user.id,
        username = %user.username,
        "user registered"
    );

    let token = auth.issue_token(user.id)?;
    Ok(redirect_with_cookie(
        &profile_url(&user.username),
        session_cookie(token, auth.keys().ttl()),
    ))
}
