//! Data Transfer Objects for REST responses.
//!
//! Leads are returned as [`crate::domain::Lead`] directly; only the
//! webhook acknowledgment and the health report need their own shapes.

pub mod system_dto;
pub mod webhook_dto;

pub use system_dto::*;
pub use webhook_dto::*;
