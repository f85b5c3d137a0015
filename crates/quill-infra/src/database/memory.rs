//! In-memory repositories.
//!
//! Used when no `DATABASE_URL` is configured and in tests. Data is lost on
//! restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{Post, PostFilter, User, UserRole};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, PostRepository, UserRepository};

fn page<T>(items: Vec<T>, limit: u64, offset: u64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(limit).collect()
}

/// In-memory post store.
#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live posts matching `filter`, newest first.
    async fn matching(&self, filter: &PostFilter) -> Vec<Post> {
        let posts = self.posts.read().await;
        let mut found: Vec<Post> = posts
            .values()
            .filter(|p| !p.is_deleted() && filter.matches(p))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        found
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let posts = self.posts.read().await;
        Ok(posts.get(&id).filter(|p| !p.is_deleted()).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            return Err(RepoError::Constraint(format!("post {} already exists", post.id)));
        }
        if posts
            .values()
            .any(|p| !p.is_deleted() && p.slug == post.slug)
        {
            return Err(RepoError::Constraint(format!(
                "slug '{}' is already taken",
                post.slug
            )));
        }
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        if posts
            .values()
            .any(|p| p.id != post.id && !p.is_deleted() && p.slug == post.slug)
        {
            return Err(RepoError::Constraint(format!(
                "slug '{}' is already taken",
                post.slug
            )));
        }

        let stored = posts
            .get_mut(&post.id)
            .filter(|p| !p.is_deleted())
            .ok_or(RepoError::NotFound)?;

        let updated = Post {
            author_id: stored.author_id,
            view_count: stored.view_count,
            created_at: stored.created_at,
            deleted_at: stored.deleted_at,
            updated_at: Utc::now(),
            ..post
        };
        *stored = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut posts = self.posts.write().await;
        let stored = posts
            .get_mut(&id)
            .filter(|p| !p.is_deleted())
            .ok_or(RepoError::NotFound)?;

        let now = Utc::now();
        stored.deleted_at = Some(now);
        stored.updated_at = now;
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let posts = self.posts.read().await;
        Ok(posts
            .values()
            .find(|p| !p.is_deleted() && p.slug == slug)
            .cloned())
    }

    async fn list(
        &self,
        filter: &PostFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Post>, RepoError> {
        Ok(page(self.matching(filter).await, limit, offset))
    }

    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        Ok(self.matching(filter).await.len() as u64)
    }

    async fn list_published(&self, limit: u64, offset: u64) -> Result<Vec<Post>, RepoError> {
        let mut posts = self.matching(&PostFilter::published()).await;
        posts.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(page(posts, limit, offset))
    }

    async fn increment_view_count(&self, id: Uuid) -> Result<(), RepoError> {
        let mut posts = self.posts.write().await;
        let stored = posts
            .get_mut(&id)
            .filter(|p| !p.is_deleted())
            .ok_or(RepoError::NotFound)?;
        stored.view_count = stored.view_count.saturating_add(1);
        Ok(())
    }
}

/// In-memory user store.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.get(&id).filter(|u| u.deleted_at.is_none()).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(RepoError::Constraint(format!("user {} already exists", user.id)));
        }
        if users
            .values()
            .any(|u| u.deleted_at.is_none() && u.email == user.email)
        {
            return Err(RepoError::Constraint("email is already registered".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        let stored = users
            .get_mut(&user.id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or(RepoError::NotFound)?;

        let updated = User {
            created_at: stored.created_at,
            deleted_at: stored.deleted_at,
            updated_at: Utc::now(),
            ..user
        };
        *stored = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut users = self.users.write().await;
        let stored = users
            .get_mut(&id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or(RepoError::NotFound)?;

        let now = Utc::now();
        stored.deleted_at = Some(now);
        stored.updated_at = now;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.deleted_at.is_none() && u.email == email)
            .cloned())
    }

    async fn list(
        &self,
        role: Option<UserRole>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<User>, RepoError> {
        let users = self.users.read().await;
        let mut found: Vec<User> = users
            .values()
            .filter(|u| u.deleted_at.is_none() && role.is_none_or(|r| r == u.role))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page(found, limit, offset))
    }

    async fn count(&self, role: Option<UserRole>) -> Result<u64, RepoError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| u.deleted_at.is_none() && role.is_none_or(|r| r == u.role))
            .count() as u64)
    }
}
