//! Post handlers.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use quill_core::domain::{PostFilter, PostStatus};
use quill_shared::{ApiResponse, Patch};
use quill_shared::dto::{CreatePostRequest, UpdatePostRequest};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_FEATURED_IMG_CHARS: usize = 500;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// `GET /posts` query string. Every present filter must match.
#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<PostStatus>,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub is_public: Option<bool>,
    pub search: Option<String>,
}

impl PostListQuery {
    pub(crate) fn into_parts(self) -> (PostFilter, i64, i64) {
        let filter = PostFilter {
            status: self.status,
            category_id: self.category_id,
            author_id: self.author_id,
            is_public: self.is_public,
            search: self.search,
        };
        (filter, self.page.unwrap_or(1), self.limit.unwrap_or(0))
    }
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    #[serde(default = "default_increment_view")]
    pub increment_view: bool,
}

fn default_increment_view() -> bool {
    true
}

fn check_title(title: &str, errors: &mut Vec<String>) {
    let len = title.trim().chars().count();
    if len == 0 {
        errors.push("title is required".to_string());
    } else if title.chars().count() > MAX_TITLE_CHARS {
        errors.push(format!("title must be at most {MAX_TITLE_CHARS} characters"));
    }
}

fn check_content(content: &str, errors: &mut Vec<String>) {
    if content.trim().is_empty() {
        errors.push("content is required".to_string());
    }
}

fn check_featured_img(featured_img: &str, errors: &mut Vec<String>) {
    if featured_img.chars().count() > MAX_FEATURED_IMG_CHARS {
        errors.push(format!(
            "featured_img must be at most {MAX_FEATURED_IMG_CHARS} characters"
        ));
    }
}

fn validate_create(req: &CreatePostRequest) -> AppResult<()> {
    let mut errors = Vec::new();
    check_title(&req.title, &mut errors);
    check_content(&req.content, &mut errors);
    if let Some(featured_img) = &req.featured_img {
        check_featured_img(featured_img, &mut errors);
    }

    if errors.is_empty() { Ok(()) } else { Err(AppError::Validation(errors)) }
}

fn validate_update(req: &UpdatePostRequest) -> AppResult<()> {
    let mut errors = Vec::new();
    if let Some(title) = &req.title {
        check_title(title, &mut errors);
    }
    if let Some(content) = &req.content {
        check_content(content, &mut errors);
    }
    if let Patch::Set(featured_img) = &req.featured_img {
        check_featured_img(featured_img, &mut errors);
    }

    if errors.is_empty() { Ok(()) } else { Err(AppError::Validation(errors)) }
}

/// POST /api/v1/posts
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    validate_create(&req)?;

    let post = state.posts.create(req, identity.user_id).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(post, "Post created successfully")))
}

/// GET /api/v1/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<Uuid>,
    query: web::Query<ViewQuery>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .get_by_id(path.into_inner(), query.increment_view)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post)))
}

/// GET /api/v1/posts/slug/{slug}
pub async fn get_post_by_slug(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ViewQuery>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .get_by_slug(&path.into_inner(), query.increment_view)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post)))
}

/// PUT /api/v1/posts/{id}
pub async fn update_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    validate_update(&req)?;

    let post = state
        .posts
        .update(path.into_inner(), req, identity.user_id, identity.role)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(post, "Post updated successfully")))
}

/// DELETE /api/v1/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .posts
        .delete(path.into_inner(), identity.user_id, identity.role)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Post deleted successfully")))
}

/// PATCH /api/v1/posts/{id}/publish
pub async fn publish_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .publish(path.into_inner(), identity.user_id, identity.role)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(post, "Post published successfully")))
}

/// PATCH /api/v1/posts/{id}/unpublish
pub async fn unpublish_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .unpublish(path.into_inner(), identity.user_id, identity.role)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        post,
        "Post unpublished successfully",
    )))
}

/// GET /api/v1/posts
pub async fn list_posts(
    state: web::Data<AppState>,
    _identity: Identity,
    query: web::Query<PostListQuery>,
) -> AppResult<HttpResponse> {
    let (filter, page, limit) = query.into_inner().into_parts();
    let posts = state.posts.list(filter, page, limit).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(posts)))
}

/// GET /api/v1/posts/my
pub async fn list_my_posts(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let posts = state
        .posts
        .list_mine(
            identity.user_id,
            query.page.unwrap_or(1),
            query.limit.unwrap_or(0),
        )
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(posts)))
}

/// GET /api/v1/posts/published
pub async fn list_published_posts(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let posts = state
        .posts
        .list_published(query.page.unwrap_or(1), query.limit.unwrap_or(0))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(posts)))
}
