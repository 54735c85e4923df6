//! Shared types for Acervo
//!
//! Common types used across multiple crates including backend row models,
//! auth DTOs and the unified error system.

pub mod client;
pub mod error;
pub mod models;

// Re-exports
pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{Identity, Member, Profile, Role, UnknownRole};
pub use serde::{Deserialize, Serialize};
