//! Data models
//!
//! Rows of the hosted backend tables (`profiles`, `user_roles`) and the
//! authenticated identity. Shared between the access core and the client.
//! All IDs are `Uuid` (auth service user ids).

pub mod identity;
pub mod profile;
pub mod role;

// Re-exports
pub use identity::*;
pub use profile::*;
pub use role::*;
