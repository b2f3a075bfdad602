use actix_multipart::form::MultipartForm;
use actix_multipart::form::tempfile::TempFile;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::info;

use crate::application::authorization::{OwnershipPolicy, ensure_author, post_url};
use crate::application::post_service::{ImageChange, ImageUpload, PostService};
use crate::application::taxonomy_service::TaxonomyService;
use crate::domain::error::DomainError;
use crate::domain::post::{Post, PostDraft};
use crate::presentation::forms::{FormErrors, PostForm, PostUpload, clean_image};
use crate::presentation::middleware::request_id;
use crate::presentation::templates::Templates;
use crate::presentation::utils::{AuthenticatedUser, profile_url, redirect};

type Validated<T> = Result<T, FormErrors>;

/// Runs the form checks, then confirms the chosen category and location exist.
async fn validate_post(
    taxonomy: &TaxonomyService,
    form: &PostForm,
    image: Option<&TempFile>,
) -> Result<Validated<(PostDraft, Option<ImageUpload>)>, DomainError> {
    let mut errors = FormErrors::default();

    let draft = match form.clean() {
        Ok(draft) => Some(draft),
        Err(e) => {
            errors.merge(e);
            None
        }
    };

    let upload = match image.map(clean_image).transpose() {
        Ok(upload) => upload,
        Err(e) => {
            errors.merge(e);
            None
        }
    };

    if let Some(draft) = &draft {
        if let Some(id) = draft.category_id {
            if !taxonomy.category_exists(id).await? {
                errors.add("category", "Select a valid choice.");
            }
        }
        if let Some(id) = draft.location_id {
            if !taxonomy.location_exists(id).await? {
                errors.add("location", "Select a valid choice.");
            }
        }
    }

    match draft {
        Some(draft) if errors.is_empty() => Ok(Ok((draft, upload))),
        _ => Ok(Err(errors)),
    }
}

async fn render_post_form(
    templates: &Templates,
    taxonomy: &TaxonomyService,
    user: &AuthenticatedUser,
    form: &PostForm,
    errors: &FormErrors,
    post: Option<&Post>,
) -> Result<HttpResponse, DomainError> {
    let mut ctx = templates.context(Some(user));
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    ctx.insert("post", &post);
    ctx.insert("categories", &taxonomy.categories().await?);
    ctx.insert("locations", &taxonomy.locations().await?);
    ctx.insert("is_delete", &false);
    templates.render("blog/create.html", &ctx)
}

/// Loads the post and lets only its author through.
async fn owned_post(
    posts: &PostService,
    user: &AuthenticatedUser,
    post_id: i64,
) -> Result<Post, DomainError> {
    let post = posts.get_post(post_id).await?;
    ensure_author(user.id, post.author_id, OwnershipPolicy::RedirectToPost(post.id))?;
    Ok(post)
}

#[get("/posts/create/")]
async fn create_post_form(
    user: AuthenticatedUser,
    taxonomy: web::Data<TaxonomyService>,
    templates: web::Data<Templates>,
) -> Result<HttpResponse, DomainError> {
    render_post_form(
        &templates,
        &taxonomy,
        &user,
        &PostForm::blank(),
        &FormErrors::default(),
        None,
    )
    .await
}

#[post("/posts/create/")]
async fn create_post(
    user: AuthenticatedUser,
    req: HttpRequest,
    posts: web::Data<PostService>,
    taxonomy: web::Data<TaxonomyService>,
    templates: web::Data<Templates>,
    MultipartForm(upload): MultipartForm<PostUpload>,
) -> Result<HttpResponse, DomainError> {
    let (form, _, image) = upload.into_parts();
    let (draft, image) = match validate_post(&taxonomy, &form, image.as_ref()).await? {
        Ok(valid) => valid,
        Err(errors) => {
            return render_post_form(&templates, &taxonomy, &user, &form, &errors, None).await;
        }
    };

    let post = posts.create_post(user.id, draft, image).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = post.id,
        "post created"
    );

    Ok(redirect(profile_url(&user.username)))
}

#[get("/posts/{post_id:\\d+}/edit/")]
async fn edit_post_form(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    posts: web::Data<PostService>,
    taxonomy: web::Data<TaxonomyService>,
    templates: web::Data<Templates>,
) -> Result<HttpResponse, DomainError> {
    let post = owned_post(&posts, &user, path.into_inner()).await?;
    render_post_form(
        &templates,
        &taxonomy,
        &user,
        &PostForm::from_post(&post),
        &FormErrors::default(),
        Some(&post),
    )
    .await
}

#[post("/posts/{post_id:\\d+}/edit/")]
async fn edit_post(
    user: AuthenticatedUser,
    req: HttpRequest,
    path: web::Path<i64>,
    posts: web::Data<PostService>,
    taxonomy: web::Data<TaxonomyService>,
    templates: web::Data<Templates>,
    MultipartForm(upload): MultipartForm<PostUpload>,
) -> Result<HttpResponse, DomainError> {
    let post = owned_post(&posts, &user, path.into_inner()).await?;

    let (form, clear_image, image) = upload.into_parts();
    let (draft, image) = match validate_post(&taxonomy, &form, image.as_ref()).await? {
        Ok(valid) => valid,
        Err(errors) => {
            return render_post_form(&templates, &taxonomy, &user, &form, &errors, Some(&post))
                .await;
        }
    };
    let change = match (image, clear_image) {
        (Some(upload), _) => ImageChange::Replace(upload),
        (None, true) => ImageChange::Clear,
        (None, false) => ImageChange::Keep,
    };

    posts.update_post(&post, draft, change).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = post.id,
        "post updated"
    );

    Ok(redirect(post_url(post.id)))
}

#[get("/posts/{post_id:\\d+}/delete/")]
async fn delete_post_form(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    posts: web::Data<PostService>,
    templates: web::Data<Templates>,
) -> Result<HttpResponse, DomainError> {
    let post = owned_post(&posts, &user, path.into_inner()).await?;

    let mut ctx = templates.context(Some(&user));
    ctx.insert("form", &PostForm::from_post(&post));
    ctx.insert("post", &post);
    ctx.insert("is_delete", &true);
    templates.render("blog/create.html", &ctx)
}

#[post("/posts/{post_id:\\d+}/delete/")]
async fn delete_post(
    user: AuthenticatedUser,
    req: HttpRequest,
    path: web::Path<i64>,
    posts: web::Data<PostService>,
) -> Result<HttpResponse, DomainError> {
    let post = owned_post(&posts, &user, path.into_inner()).await?;

    posts.delete_post(&post).await?;

    info!(
        request_id = %request_id(&req),
        username = %user.username,
        post_id = post.id,
        "post deleted"
    );

    Ok(redirect("/"))
}
