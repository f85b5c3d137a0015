//! Ownership-based authorization for post mutations.

use uuid::Uuid;

use crate::domain::{Post, UserRole};

/// Admins may modify any post; everyone else only their own.
pub fn can_modify(post: &Post, actor_id: Uuid, actor_role: UserRole) -> bool {
    actor_role == UserRole::Admin || post.author_id == actor_id
}
