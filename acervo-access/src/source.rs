//! Seams to the outside world
//!
//! The access core never talks to the backend or the interface directly.
//! Lookups go through [`RoleSource`] and [`ApprovalSource`], administration
//! through [`AdminDirectory`], and guard side effects through [`Navigator`]
//! and [`Notifier`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::models::{Member, Profile, Role};
use uuid::Uuid;

use crate::error::LookupError;

/// Role lookup for an identity
#[async_trait]
pub trait RoleSource: Send + Sync {
    /// Most recent role of `user_id`
    ///
    /// `Ok(None)` means no role record exists. An unrecognized role string is
    /// `Err(LookupError::UnknownRole)`, never a default.
    async fn role_for(&self, user_id: Uuid) -> Result<Option<Role>, LookupError>;
}

/// Approval lookup for an identity
#[async_trait]
pub trait ApprovalSource: Send + Sync {
    /// Whether an administrator has approved `user_id`
    ///
    /// A missing profile reads as `Ok(false)`.
    async fn approval_for(&self, user_id: Uuid) -> Result<bool, LookupError>;
}

/// Account administration operations
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    /// Replace the role of `user_id`
    async fn set_role(&self, user_id: Uuid, role: Role) -> Result<(), LookupError>;

    /// Mark `user_id` as approved; approving twice is not an error
    async fn approve_identity(&self, user_id: Uuid) -> Result<(), LookupError>;

    /// Remove the account together with its profile and role
    async fn delete_identity(&self, user_id: Uuid) -> Result<(), LookupError>;

    /// Profiles still waiting for approval, newest first
    async fn pending_profiles(&self) -> Result<Vec<Profile>, LookupError>;

    /// Every account with its current role
    async fn members(&self) -> Result<Vec<Member>, LookupError>;
}

/// Navigation effect of a route guard
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, path: &str);
}

/// Toast-style notification shown to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Destructive,
}

/// User-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
        }
    }

    /// Inline fallback of a component guard
    pub fn access_denied() -> Self {
        Self::new(
            "Access denied",
            "You do not have permission to view this content.",
            Severity::Warning,
        )
    }

    /// Toast raised when a route guard redirects
    pub fn route_denied() -> Self {
        Self::new(
            "Access denied",
            "You do not have permission to access this page.",
            Severity::Destructive,
        )
    }

    /// Shown while the account waits for an administrator
    pub fn awaiting_approval() -> Self {
        Self::new(
            "Awaiting approval",
            "Your account was created and is waiting for an administrator to approve it.",
            Severity::Info,
        )
    }

    /// Shown when role or approval could not be verified
    pub fn unavailable() -> Self {
        Self::new(
            "Unable to verify access",
            "Your permissions could not be checked right now. Try again in a moment.",
            Severity::Warning,
        )
    }
}
