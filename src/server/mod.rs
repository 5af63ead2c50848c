//! HTTP server.
//!
//! - [`api`]: Request/response types and route handlers
//! - [`error`]: Error body and status mapping

pub mod api;
pub mod error;
