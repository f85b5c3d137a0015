//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;
mod users;

#[cfg(test)]
mod tests;

use actix_web::{HttpRequest, HttpResponse, error, web};

use quill_shared::ErrorResponse;

use crate::middleware::error::AppError;
use crate::observability::RequestId;

/// Malformed JSON bodies, including unknown enum values, are reported as
/// validation failures.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::Validation(vec![err.to_string()]).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: error::PathError, _req| {
        AppError::BadRequest(err.to_string()).into()
    })
}

/// Fallback for unmatched paths.
pub async fn route_not_found(req: HttpRequest, request_id: RequestId) -> HttpResponse {
    let error = ErrorResponse::not_found(format!("No route for {} {}", req.method(), req.path()))
        .with_request_id(request_id.as_str());
    HttpResponse::NotFound().json(error)
}

/// Configure all application routes.
///
/// Literal post paths (`/posts/my`, `/posts/published`, `/posts/slug/..`) are
/// registered before `/posts/{id}`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login)),
            )
            .route("/profile", web::get().to(auth::profile))
            .service(
                web::scope("/posts")
                    .route("/published", web::get().to(posts::list_published_posts))
                    .route("/my", web::get().to(posts::list_my_posts))
                    .route("/slug/{slug}", web::get().to(posts::get_post_by_slug))
                    .route("", web::get().to(posts::list_posts))
                    .route("", web::post().to(posts::create_post))
                    .route("/{id}", web::get().to(posts::get_post))
                    .route("/{id}", web::put().to(posts::update_post))
                    .route("/{id}", web::delete().to(posts::delete_post))
                    .route("/{id}/publish", web::patch().to(posts::publish_post))
                    .route("/{id}/unpublish", web::patch().to(posts::unpublish_post)),
            )
            .service(
                web::scope("/admin")
                    .route("/users", web::get().to(users::list_users))
                    .route("/users/role/{role}", web::get().to(users::list_users_by_role))
                    .route("/users/{id}", web::get().to(users::get_user))
                    .route("/users/{id}", web::put().to(users::update_user))
                    .route("/users/{id}", web::delete().to(users::delete_user))
                    .route("/posts", web::get().to(users::list_all_posts)),
            ),
    );
}
