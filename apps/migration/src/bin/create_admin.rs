//! Bootstrap an administrator account.
//!
//! Reads `DATABASE_URL`, `ADMIN_EMAIL`, `ADMIN_PASSWORD` and `ADMIN_NAME`.
//! Does nothing when an account with that email already exists.

use anyhow::{Context, bail};

use quill_core::domain::{User, UserRole};
use quill_core::ports::{BaseRepository, PasswordService, UserRepository};
use quill_infra::database::{DatabaseConfig, DatabaseConnections};
use quill_infra::{Argon2PasswordService, PostgresUserRepository};

const MIN_PASSWORD_CHARS: usize = 6;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt().with_env_filter("info").init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@quill.local".to_string());
    let name = std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string());
    let password = std::env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD must be set")?;

    if password.chars().count() < MIN_PASSWORD_CHARS {
        bail!("ADMIN_PASSWORD must be at least {MIN_PASSWORD_CHARS} characters");
    }

    let mut config = DatabaseConfig::new(database_url);
    config.max_connections = 2;
    config.min_connections = 1;

    let db = DatabaseConnections::init(&config)
        .await
        .context("failed to connect to database")?;
    let users = PostgresUserRepository::new(db.main.clone());

    if let Some(existing) = users.find_by_email(&email).await? {
        tracing::info!(
            user_id = %existing.id,
            email = %existing.email,
            role = %existing.role,
            "Account already exists, nothing to do"
        );
        db.close().await?;
        return Ok(());
    }

    let hash = Argon2PasswordService::new()
        .hash(&password)
        .context("failed to hash password")?;
    let admin = users
        .insert(User::new(email, hash, name).with_role(UserRole::Admin))
        .await
        .context("failed to create admin user")?;

    tracing::info!(user_id = %admin.id, email = %admin.email, "Admin user created");
    tracing::warn!("Change the admin password after first login");

    db.close().await?;
    Ok(())
}
