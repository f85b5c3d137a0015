//! # Quill API Server
//!
//! The main entry point for the Actix-web HTTP server.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use quill_core::ports::{PasswordService, TokenService};
use quill_infra::{Argon2PasswordService, JwtTokenService};

mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    let token_service: Arc<dyn TokenService> =
        Arc::new(JwtTokenService::from_env().map_err(std::io::Error::other)?);
    let password_service: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

    let state = AppState::new(config.database.as_ref()).await;
    #[cfg(feature = "postgres")]
    let db = state.db.clone();

    tracing::info!(host = %config.host, port = config.port, "Starting Quill API Server");

    let tokens = web::Data::new(token_service);
    let passwords = web::Data::new(password_service);
    let state_data = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestIdMiddleware)
            .app_data(state_data.clone())
            .app_data(tokens.clone())
            .app_data(passwords.clone())
            .app_data(handlers::json_config())
            .app_data(handlers::query_config())
            .app_data(handlers::path_config())
            .configure(handlers::configure_routes)
            .default_service(web::route().to(handlers::route_not_found))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    #[cfg(feature = "postgres")]
    if let Some(db) = db {
        if let Err(e) = db.close().await {
            tracing::warn!(error = %e, "Failed to close database pool");
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}
