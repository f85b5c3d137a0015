//! # Quill Shared
//!
//! Wire types shared between the API server and its clients.
//! Everything here is plain serde data; no I/O and no business rules.

pub mod dto;
pub mod enums;
pub mod patch;
pub mod response;

pub use enums::{ParseEnumError, PostStatus, UserRole};
pub use patch::Patch;
pub use response::{ApiResponse, ErrorResponse};
