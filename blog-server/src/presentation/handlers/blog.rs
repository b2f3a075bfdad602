use actix_web::{HttpResponse, get, web};

use crate::application::comment_service::CommentService;
use crate::application::post_service::PostService;
use crate::application::taxonomy_service::TaxonomyService;
use crate::domain::error::DomainError;
use crate::presentation::forms::CommentForm;
use crate::presentation::handlers::PageQuery;
use crate::presentation::templates::Templates;
use crate::presentation::utils::{AuthenticatedUser, viewer_id};

#[get("/")]
async fn index(
    user: Option<AuthenticatedUser>,
    posts: web::Data<PostService>,
    templates: web::Data<Templates>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let page = posts.public_feed(query.page.as_deref()).await?;

    let mut ctx = templates.context(user.as_ref());
    ctx.insert("page_obj", &page);
    templates.render("blog/index.html", &ctx)
}

#[get("/posts/{post_id:\\d+}/")]
async fn post_detail(
    user: Option<AuthenticatedUser>,
    path: web::Path<i64>,
    posts: web::Data<PostService>,
    comments: web::Data<CommentService>,
    templates: web::Data<Templates>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();
    let post = posts.get_entry_for(post_id, viewer_id(&user)).await?;
    let comments = comments.list_for_post(post.id).await?;

    let mut ctx = templates.context(user.as_ref());
    ctx.insert("post", &post);
    ctx.insert("comments", &comments);
    ctx.insert("form", &CommentForm::default());
    templates.render("blog/detail.html", &ctx)
}

#[get("/category/{slug}/")]
async fn category_posts(
    user: Option<AuthenticatedUser>,
    path: web::Path<String>,
    posts: web::Data<PostService>,
    taxonomy: web::Data<TaxonomyService>,
    templates: web::Data<Templates>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, DomainError> {
    let category = taxonomy.published_category(&path.into_inner()).await?;
    let page = posts
        .category_feed(category.id, query.page.as_deref())
        .await?;

    let mut ctx = templates.context(user.as_ref());
    ctx.insert("category", &category);
    ctx.insert("page_obj", &page);
    templates.render("blog/category.html", &ctx)
}
