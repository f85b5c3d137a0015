//! Extractors and error mapping shared by the handlers.

pub mod auth;
pub mod error;
