//! # Quill Core
//!
//! The domain layer of the Quill blog backend: entities, ports and the post
//! lifecycle services. This crate has no infrastructure dependencies; stores,
//! hashing and tokens are reached only through the traits in [`ports`].

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{DomainError, DomainResult, RepoError};
pub use services::{PostService, UserService};
