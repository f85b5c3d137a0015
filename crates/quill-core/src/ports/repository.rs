use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Post, PostFilter, User, UserRole};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
///
/// Reads never return soft-deleted records.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Persist a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Replace a stored entity and refresh its `updated_at`.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Soft-delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Users newest first, optionally restricted to one role.
    async fn list(
        &self,
        role: Option<UserRole>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<User>, RepoError>;

    async fn count(&self, role: Option<UserRole>) -> Result<u64, RepoError>;
}

/// Post repository.
///
/// `update` must leave `author_id`, `view_count` and `created_at` as stored;
/// the view count only moves through [`PostRepository::increment_view_count`].
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// Posts matching `filter`, newest first.
    async fn list(
        &self,
        filter: &PostFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Post>, RepoError>;

    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError>;

    /// Published public posts, most recently published first.
    async fn list_published(&self, limit: u64, offset: u64) -> Result<Vec<Post>, RepoError>;

    /// Atomically add one to the view count.
    async fn increment_view_count(&self, id: Uuid) -> Result<(), RepoError>;
}
