use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::info;

use crate::application::auth_service::AuthService;
use crate::application::post_service::PostService;
use crate::domain::error::DomainError;
use crate::presentation::forms::{FormErrors, ProfileForm};
use crate::presentation::handlers::PageQuery;
use crate::presentation::middleware::request_id;
use crate::presentation::templates::Templates;
use crate::presentation::utils::{AuthenticatedUser, profile_url, redirect, viewer_id};

#[get("/profile/{username}/")]
async fn profile(
    user: Option<AuthenticatedUser>,
    path: web::Path<String>,
    auth: web::Data<AuthService>,
    posts: web::Data<PostService>,
    templates: web::Data<Templates>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let owner = auth.get_by_username(&path.into_inner()).await?;
    let page = posts
        .author_feed(owner.id, viewer_id(&user), query.page.as_deref())
        .await?;

    let mut ctx = templates.context(user.as_ref());
    ctx.insert("full_name", &owner.full_name());
    ctx.insert("profile", &owner);
    ctx.insert("page_obj", &page);
    templates.render("blog/profile.html", &ctx)
}

fn render_profile_form(
    templates: &Templates,
    user: &AuthenticatedUser,
    form: &ProfileForm,
    errors: &FormErrors,
) -> Result<HttpResponse, DomainError> {
    let mut ctx = templates.context(Some(user));
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    templates.render("blog/user.html", &ctx)
}

#[get("/edit_profile/")]
async fn edit_profile_form(
    user: AuthenticatedUser,
    auth: web::Data<AuthService>,
    templates: web::Data<Templates>,
) -> Result<HttpResponse, DomainError> {
    let current = auth.get_user(user.id).await?;
    let form = ProfileForm {
        username: current.username,
        first_name: current.first_name,
        last_name: current.last_name,
        email: current.email,
    };
    render_profile_form(&templates, &user, &form, &FormErrors::default())
}

#[post("/edit_profile/")]
async fn edit_profile(
    user: AuthenticatedUser,
    req: HttpRequest,
    auth: web::Data<AuthService>,
    templates: web::Data<Templates>,
    form: web::Form<ProfileForm>,
) -> Result<HttpResponse, DomainError> {
    let form = form.into_inner();
    let changes = match form.clean() {
        Ok(changes) => changes,
        Err(errors) => return render_profile_form(&templates, &user, &form, &errors),
    };

    let updated = match auth.update_profile(user.id, changes).await {
        Ok(updated) => updated,
        Err(DomainError::UserAlreadyExists(_)) => {
            let mut errors = FormErrors::default();
            errors.add("username", "A user with that username already exists.");
            return render_profile_form(&templates, &user, &form, &errors);
        }
        Err(e) => return Err(e),
    };

    info!(
        request_id = %request_id(&req),
        user_id = %updated.id,
        username = %updated.username,
        "profile updated"
    );

    Ok(redirect(profile_url(&updated.username)))
}
