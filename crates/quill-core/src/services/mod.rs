//! Application services over the domain ports.

pub mod assembler;
pub mod pagination;
pub mod permission;
pub mod slug;

mod post;
mod user;

pub use assembler::ResponseAssembler;
pub use pagination::PageRequest;
pub use post::PostService;
pub use user::UserService;
