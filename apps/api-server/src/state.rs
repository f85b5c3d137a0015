//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{PostRepository, SystemClock, UserRepository};
use quill_core::{PostService, UserService};
use quill_infra::database::{DatabaseConfig, DatabaseConnections};
use quill_infra::{InMemoryPostRepository, InMemoryUserRepository};

#[cfg(feature = "postgres")]
use quill_infra::{PostgresPostRepository, PostgresUserRepository};

#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostService>,
    pub users: Arc<UserService>,
    pub db: Option<Arc<DatabaseConnections>>,
}

type Stores = (
    Option<Arc<DatabaseConnections>>,
    Arc<dyn PostRepository>,
    Arc<dyn UserRepository>,
);

fn in_memory() -> Stores {
    (
        None,
        Arc::new(InMemoryPostRepository::new()),
        Arc::new(InMemoryUserRepository::new()),
    )
}

impl AppState {
    /// Wire services to Postgres when configured and reachable, otherwise
    /// to the in-memory stores.
    pub async fn new(db_config: Option<&DatabaseConfig>) -> Self {
        let (db, posts, users) = Self::stores(db_config).await;
        Self::from_repositories(db, posts, users)
    }

    pub fn from_repositories(
        db: Option<Arc<DatabaseConnections>>,
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        let post_service = PostService::new(posts, users.clone(), Arc::new(SystemClock));

        Self {
            posts: Arc::new(post_service),
            users: Arc::new(UserService::new(users)),
            db,
        }
    }

    #[cfg(feature = "postgres")]
    async fn stores(db_config: Option<&DatabaseConfig>) -> Stores {
        let Some(config) = db_config else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return in_memory();
        };

        match DatabaseConnections::init(config).await {
            Ok(connections) => {
                let conn = Arc::new(connections);
                (
                    Some(conn.clone()),
                    Arc::new(PostgresPostRepository::new(conn.main.clone())),
                    Arc::new(PostgresUserRepository::new(conn.main.clone())),
                )
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to database. Using in-memory fallback.");
                in_memory()
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn stores(_db_config: Option<&DatabaseConfig>) -> Stores {
        tracing::info!("Running without postgres feature - using in-memory repositories");
        in_memory()
    }
}
