//! Authentication handlers.

use std::sync::Arc;

use actix_web::{HttpResponse, web};

use quill_core::ports::{AuthError, PasswordService, TokenService};
use quill_shared::ApiResponse;
use quill_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest, UserResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const MIN_PASSWORD_CHARS: usize = 6;

fn validate_registration(req: &RegisterUserRequest) -> AppResult<()> {
    let mut errors = Vec::new();
    if !req.email.contains('@') {
        errors.push("email must be a valid email address".to_string());
    }
    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        errors.push(format!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        ));
    }
    if req.name.trim().is_empty() {
        errors.push("name is required".to_string());
    }

    if errors.is_empty() { Ok(()) } else { Err(AppError::Validation(errors)) }
}

/// POST /api/v1/auth/register
pub async fn register(
    state: web::Data<AppState>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let mut req = body.into_inner();
    req.email = req.email.trim().to_string();
    validate_registration(&req)?;

    let password_hash = password_service.hash(&req.password)?;
    let user = state
        .users
        .register(req.email, password_hash, req.name.trim().to_string())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        UserResponse::from(&user),
        "User registered successfully",
    )))
}

/// POST /api/v1/auth/login
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_email(req.email.trim())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !password_service.verify(&req.password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "Login rejected: wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }
    if !user.is_active {
        tracing::info!(user_id = %user.id, "Login rejected: account deactivated");
        return Err(AuthError::AccountDisabled.into());
    }

    let access_token = token_service.generate_token(user.id, &user.email, user.role)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(AuthResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: u64::try_from(token_service.expiration_seconds()).unwrap_or(0),
        user: UserResponse::from(&user),
    })))
}

/// GET /api/v1/profile
pub async fn profile(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state.users.get_user(identity.user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(user)))
}
