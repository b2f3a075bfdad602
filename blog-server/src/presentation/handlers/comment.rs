use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::{info, warn};

use crate::application::authorization::{OwnershipPolicy, ensure_author, post_url};
use crate::application::comment_service::CommentService;
use crate::application::post_service::PostService;
use crate::domain::comment::Comment;
use crate::domain::error::DomainError;
use crate::presentation::forms::{CommentForm, FormErrors};
use crate::presentation::middleware::request_id;
use crate::presentation::templates::Templates;
use crate::presentation::utils::{AuthenticatedUser, redirect};

/// Loads the comment under its post and lets only its author through.
async fn owned_comment(
    comments: &CommentService,
    user: &AuthenticatedUser,
    post_id: i64,
    comment_id: i64,
) -> Result<Comment, DomainError> {
    let comment = comments.get_comment(post_id, comment_id).await?;
    ensure_author(user.id, comment.author_id, OwnershipPolicy::Forbid)?;
    Ok(comment)
}

fn render_comment_page(
    templates: &Templates,
    user: &AuthenticatedUser,
    comment: &Comment,
    form: &CommentForm,
    errors: &FormErrors,
    is_delete: bool,
) -> Result<HttpResponse, DomainError> {
    let mut ctx = templates.context(Some(user));
    ctx.insert("comment", comment);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    ctx.insert("is_delete", &is_delete);
    templates.render("blog/comment.html", &ctx)
}

/// Adds a comment, or rewrites one when the form names it.
///
/// Always lands back on the post; a rejected form is only logged.
#[post("/posts/{post_id:\\d+}/comment/")]
async fn add_comment(
    user: AuthenticatedUser,
    req: HttpRequest,
    path: web::Path<i64>,
    posts: web::Data<PostService>,
    comments: web::Data<CommentService>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse, DomainError> {
    let post = posts.get_post(path.into_inner()).await?;

    let text = match form.clean() {
        Ok(text) => text,
        Err(errors) => {
            warn!(
                request_id = %request_id(&req),
                username = %user.username,
                post_id = post.id,
                errors = ?errors,
                "comment rejected"
            );
            return Ok(redirect(post_url(post.id)));
        }
    };

    match form.comment_id() {
        Some(comment_id) => {
            owned_comment(&comments, &user, post.id, comment_id).await?;
            comments.update_comment(comment_id, text).await?;
            info!(
                request_id = %request_id(&req),
                username = %user.username,
                post_id = post.id,
                comment_id,
                "comment updated"
            );
        }
        None => {
            let comment = comments.add_comment(post.id, user.id, text).await?;
            info!(
                request_id = %request_id(&req),
                username = %user.username,
                post_id = post.id,
                comment_id = comment.id,
                "comment added"
            );
        }
    }

    Ok(redirect(post_url(post.id)))
}

#[get("/posts/{post_id:\\d+}/edit_comment/{comment_id:\\d+}/")]
async fn edit_comment_form(
    user: AuthenticatedUser,
    path: web::Path<(i64, i64)>,
    comments: web::Data<CommentService>,
    templates: web::Data<Templates>,
) -> Result<HttpResponse, DomainError> {
    let (post_id, comment_id) = path.into_inner();
    let comment = owned_comment(&comments, &user, post_id, comment_id).await?;
    render_comment_page(
        &templates,
        &user,
        &comment,
        &CommentForm::with_text(&comment.text),
        &FormErrors::default(),
        false,
    )
}

#[post("/posts/{post_id:\\d+}/edit_comment/{comment_id:\\d+}/")]
async fn edit_comment(
    user: AuthenticatedUser,
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
    comments: web::Data<CommentService>,
    templates: web::Data<Templates>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse, DomainError> {
    let (post_id, comment_id) = path.into_inner();
    let comment = owned_comment(&comments, &user, post_id, comment_id).await?;

    let text = match form.clean() {
        Ok(text) => text,
        Err(errors) => {
            return render_comment_page(&templates, &user, &comment, &form, &errors, false);
        }
    };
    comments.update_comment(comment.id, text).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id,
        comment_id,
        "comment updated"
    );

    Ok(redirect(post_url(post_id)))
}

#[get("/posts/{post_id:\\d+}/delete_comment/{comment_id:\\d+}/")]
async fn delete_comment_form(
    user: AuthenticatedUser,
    path: web::Path<(i64, i64)>,
    comments: web::Data<CommentService>,
    templates: web::Data<Templates>,
) -> Result<HttpResponse, DomainError> {
    let (post_id, comment_id) = path.into_inner();
    let comment = owned_comment(&comments, &user, post_id, comment_id).await?;
    render_comment_page(
        &templates,
        &user,
        &comment,
        &CommentForm::with_text(&comment.text),
        &FormErrors::default(),
        true,
    )
}

#[post("/posts/{post_id:\\d+}/delete_comment/{comment_id:\\d+}/")]
async fn delete_comment(
    user: AuthenticatedUser,
    req: HttpRequest,
    path: web::Path<(i64, i64)>,
    comments: web::Data<CommentService>,
) -> Result<HttpResponse, DomainError> {
    let (post_id, comment_id) = path.into_inner();
    owned_comment(&comments, &user, post_id, comment_id).await?;

    comments.delete_comment(comment_id).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id,
        comment_id,
        "comment deleted"
    );

    Ok(redirect(post_url(post_id)))
}
