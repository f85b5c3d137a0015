//! Account registration lookups and admin-side user management.

use std::sync::Arc;

use uuid::Uuid;

use quill_shared::dto::{AdminUpdateUserRequest, UserResponse, UsersListResponse};

use super::pagination::PageRequest;
use crate::domain::{User, UserRole};
use crate::error::{DomainError, DomainResult};
use crate::ports::UserRepository;

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Store a new `user`-role account. The password must already be hashed.
    pub async fn register(
        &self,
        email: String,
        password_hash: String,
        name: String,
    ) -> DomainResult<User> {
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::Duplicate(
                "user with this email already exists".to_string(),
            ));
        }

        let user = self.users.insert(User::new(email, password_hash, name)).await?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        Ok(self.users.find_by_email(email).await?)
    }

    pub async fn get_user(&self, id: Uuid) -> DomainResult<UserResponse> {
        let user = self.find(id).await?;
        Ok(UserResponse::from(&user))
    }

    pub async fn update_user(
        &self,
        id: Uuid,
        req: AdminUpdateUserRequest,
    ) -> DomainResult<UserResponse> {
        let mut user = self.find(id).await?;

        if let Some(name) = req.name {
            if name.trim().is_empty() {
                return Err(DomainError::Validation("name must not be empty".to_string()));
            }
            user.name = name;
        }
        req.phone.apply_to(&mut user.phone);
        req.address.apply_to(&mut user.address);
        if let Some(is_active) = req.is_active {
            user.is_active = is_active;
        }
        if let Some(role) = req.role {
            user.role = role;
        }

        let saved = self.users.update(user).await?;
        tracing::info!(user_id = %saved.id, role = %saved.role, "User updated");
        Ok(UserResponse::from(&saved))
    }

    pub async fn delete_user(&self, id: Uuid) -> DomainResult<()> {
        self.find(id).await?;
        self.users.delete(id).await?;

        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }

    pub async fn list_users(&self, page: i64, limit: i64) -> DomainResult<UsersListResponse> {
        self.list(None, PageRequest::new(page, limit)).await
    }

    pub async fn list_users_by_role(
        &self,
        role: UserRole,
        page: i64,
        limit: i64,
    ) -> DomainResult<UsersListResponse> {
        self.list(Some(role), PageRequest::new(page, limit)).await
    }

    async fn find(&self, id: Uuid) -> DomainResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    async fn list(&self, role: Option<UserRole>, page: PageRequest) -> DomainResult<UsersListResponse> {
        let users = self.users.list(role, page.limit, page.offset()).await?;
        let total = self.users.count(role).await?;

        Ok(UsersListResponse {
            users: users.iter().map(UserResponse::from).collect(),
            total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages(total),
        })
    }
}
