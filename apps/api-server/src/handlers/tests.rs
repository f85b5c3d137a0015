use std::sync::Arc;

use actix_web::{App, dev::ServiceResponse, http::StatusCode, test, web};
use serde_json::{Value, json};

use quill_core::ports::{PasswordService, TokenService, UserRepository};
use quill_core::domain::{User, UserRole};
use quill_infra::{
    Argon2PasswordService, InMemoryPostRepository, InMemoryUserRepository, JwtConfig,
    JwtTokenService,
};

use super::{configure_routes, json_config, path_config, query_config, route_not_found};
use crate::state::AppState;

struct TestEnv {
    state: AppState,
    users: Arc<InMemoryUserRepository>,
    tokens: Arc<dyn TokenService>,
    passwords: Arc<dyn PasswordService>,
}

impl TestEnv {
    fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let state = AppState::from_repositories(
            None,
            Arc::new(InMemoryPostRepository::new()),
            users.clone(),
        );
        Self {
            state,
            users,
            tokens: Arc::new(JwtTokenService::new(JwtConfig {
                secret: "handler-test-secret".to_string(),
                ..JwtConfig::default()
            })),
            passwords: Arc::new(Argon2PasswordService::new()),
        }
    }

    /// Store a user directly and return a bearer token for them.
    async fn login_as(&self, name: &str, role: UserRole) -> (User, String) {
        let user = User::new(
            format!("{name}@example.com"),
            self.passwords.hash("password123").unwrap(),
            name.to_string(),
        )
        .with_role(role);
        let user = quill_core::ports::BaseRepository::insert(self.users.as_ref(), user)
            .await
            .unwrap();
        let token = self
            .tokens
            .generate_token(user.id, &user.email, user.role)
            .unwrap();
        (user, format!("Bearer {token}"))
    }
}

macro_rules! app {
    ($env:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($env.state.clone()))
                .app_data(web::Data::new($env.tokens.clone()))
                .app_data(web::Data::new($env.passwords.clone()))
                .app_data(json_config())
                .app_data(query_config())
                .app_data(path_config())
                .configure(configure_routes)
                .default_service(web::route().to(route_not_found)),
        )
        .await
    };
}

async fn body_json(res: ServiceResponse) -> Value {
    test::read_body_json(res).await
}

#[actix_web::test]
async fn test_health() {
    let env = TestEnv::new();
    let app = app!(env);

    let res = test::call_service(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}

#[actix_web::test]
async fn test_unknown_route_is_problem_json() {
    let env = TestEnv::new();
    let app = app!(env);

    let res = test::call_service(&app, test::TestRequest::get().uri("/api/v2/nothing").to_request()).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body = body_json(res).await;
    assert_eq!(body["status"], 404);
    assert!(body["request_id"].is_string());
}

#[actix_web::test]
async fn test_register_then_login() {
    let env = TestEnv::new();
    let app = app!(env);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({"email": "new@example.com", "password": "secret1", "name": "New"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = body_json(res).await;
    assert_eq!(body["data"]["role"], "user");
    assert!(body["data"].get("password_hash").is_none());

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({"email": "new@example.com", "password": "secret1", "name": "Again"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({"email": "new@example.com", "password": "secret1"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert_eq!(body["data"]["expires_in"], 86_400);
    assert_eq!(body["data"]["user"]["email"], "new@example.com");

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({"email": "new@example.com", "password": "wrong-one"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_register_validation() {
    let env = TestEnv::new();
    let app = app!(env);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({"email": "nope", "password": "123", "name": ""}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_deactivated_account_cannot_login() {
    let env = TestEnv::new();
    let app = app!(env);
    let (mut user, _) = env.login_as("sleepy", UserRole::User).await;
    user.is_active = false;
    quill_core::ports::BaseRepository::update(env.users.as_ref(), user)
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({"email": "sleepy@example.com", "password": "password123"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(res).await;
    assert_eq!(body["detail"], "user account is deactivated");
}

#[actix_web::test]
async fn test_protected_routes_require_token() {
    let env = TestEnv::new();
    let app = app!(env);

    let res = test::call_service(&app, test::TestRequest::get().uri("/api/v1/profile").to_request()).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .set_json(json!({"title": "T", "content": "C"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_post_lifecycle_over_http() {
    let env = TestEnv::new();
    let app = app!(env);
    let (author, token) = env.login_as("ann", UserRole::User).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(("Authorization", token.as_str()))
        .set_json(json!({"title": "Hello, World!", "content": "First post"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = body_json(res).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["slug"], "hello-world");
    assert_eq!(created["data"]["status"], "draft");
    assert_eq!(created["data"]["author_name"], "ann");
    assert_eq!(created["data"]["author_id"], author.id.to_string());

    // Drafts are not public.
    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/posts/published").to_request(),
    )
    .await;
    assert_eq!(body_json(res).await["data"]["total"], 0);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/posts/{id}/publish"))
        .insert_header(("Authorization", token.as_str()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["data"]["status"], "published");

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/posts/published").to_request(),
    )
    .await;
    let listed = body_json(res).await;
    assert_eq!(listed["data"]["total"], 1);
    assert_eq!(listed["data"]["page"], 1);
    assert_eq!(listed["data"]["limit"], 10);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/posts/slug/hello-world")
            .to_request(),
    )
    .await;
    assert_eq!(body_json(res).await["data"]["view_count"], 1);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/posts/slug/hello-world?increment_view=false")
            .to_request(),
    )
    .await;
    assert_eq!(body_json(res).await["data"]["view_count"], 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/posts/my")
        .insert_header(("Authorization", token.as_str()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(body_json(res).await["data"]["total"], 1);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/posts/{id}"))
        .insert_header(("Authorization", token.as_str()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/posts/{id}"))
        .insert_header(("Authorization", token.as_str()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_non_author_gets_403() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, author_token) = env.login_as("ann", UserRole::User).await;
    let (_, other_token) = env.login_as("bob", UserRole::User).await;
    let (_, admin_token) = env.login_as("root", UserRole::Admin).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(("Authorization", author_token.as_str()))
        .set_json(json!({"title": "Ann's", "content": "body"}))
        .to_request();
    let created = body_json(test::call_service(&app, req).await).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/posts/{id}"))
        .insert_header(("Authorization", other_token.as_str()))
        .set_json(json!({"content": "mine now"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/posts/{id}"))
        .insert_header(("Authorization", admin_token.as_str()))
        .set_json(json!({"content": "moderated", "summary": null}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["data"]["content"], "moderated");
}

#[actix_web::test]
async fn test_post_validation_failures_are_422() {
    let env = TestEnv::new();
    let app = app!(env);
    let (_, token) = env.login_as("ann", UserRole::User).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(("Authorization", token.as_str()))
        .set_json(json!({"title": "x".repeat(201), "content": "body"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header(("Authorization", token.as_str()))
        .set_json(json!({"title": "Fine", "content": "body", "status": "scheduled"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(res).await;
    assert_eq!(body["title"], "Validation Failed");
}

#[actix_web::test]
async fn test_admin_routes() {
    let env = TestEnv::new();
    let app = app!(env);
    let (user, user_token) = env.login_as("ann", UserRole::User).await;
    let (_, admin_token) = env.login_as("root", UserRole::Admin).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/users")
        .insert_header(("Authorization", user_token.as_str()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/users")
        .insert_header(("Authorization", admin_token.as_str()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["data"]["total"], 2);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/users/role/admin")
        .insert_header(("Authorization", admin_token.as_str()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(body_json(res).await["data"]["total"], 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/users/role/superuser")
        .insert_header(("Authorization", admin_token.as_str()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/admin/users/{}", user.id))
        .insert_header(("Authorization", admin_token.as_str()))
        .set_json(json!({"is_active": false, "phone": "555-0100"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    let body = body_json(res).await;
    assert_eq!(body["data"]["is_active"], false);
    assert_eq!(body["data"]["phone"], "555-0100");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/admin/users/{}", user.id))
        .insert_header(("Authorization", admin_token.as_str()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/admin/users/{}", user.id))
        .insert_header(("Authorization", admin_token.as_str()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    assert!(env.users.find_by_email("ann@example.com").await.unwrap().is_none());
}
