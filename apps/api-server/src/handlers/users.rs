//! Admin-only user management and post overview.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::UserRole;
use quill_shared::ApiResponse;
use quill_shared::dto::AdminUpdateUserRequest;

use super::posts::{PageQuery, PostListQuery};
use crate::middleware::auth::AdminIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/v1/admin/users
pub async fn list_users(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let users = state
        .users
        .list_users(query.page.unwrap_or(1), query.limit.unwrap_or(0))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(users)))
}

/// GET /api/v1/admin/users/role/{role}
pub async fn list_users_by_role(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let role: UserRole = path
        .into_inner()
        .parse()
        .map_err(|e: quill_shared::ParseEnumError| AppError::BadRequest(e.to_string()))?;

    let users = state
        .users
        .list_users_by_role(role, query.page.unwrap_or(1), query.limit.unwrap_or(0))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(users)))
}

/// GET /api/v1/admin/users/{id}
pub async fn get_user(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let user = state.users.get_user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(user)))
}

/// PUT /api/v1/admin/users/{id}
pub async fn update_user(
    state: web::Data<AppState>,
    admin: AdminIdentity,
    path: web::Path<Uuid>,
    body: web::Json<AdminUpdateUserRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let user = state.users.update_user(id, body.into_inner()).await?;

    tracing::info!(admin_id = %admin.0.user_id, user_id = %id, "Admin updated user");
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(user, "User updated successfully")))
}

/// DELETE /api/v1/admin/users/{id}
pub async fn delete_user(
    state: web::Data<AppState>,
    admin: AdminIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    state.users.delete_user(id).await?;
    tracing::info!(admin_id = %admin.0.user_id, user_id = %id, "Admin deleted user");
    Ok(HttpResponse::Ok().json(ApiResponse::message("User deleted successfully")))
}

/// GET /api/v1/admin/posts
pub async fn list_all_posts(
    state: web::Data<AppState>,
    _admin: AdminIdentity,
    query: web::Query<PostListQuery>,
) -> AppResult<HttpResponse> {
    let (filter, page, limit) = query.into_inner().into_parts();
    let posts = state.posts.list(filter, page, limit).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(posts)))
}
