//! Domain entities - the core business objects.

mod post;
mod user;

pub use post::{Post, PostFilter};
pub use user::User;

pub use quill_shared::{PostStatus, UserRole};
