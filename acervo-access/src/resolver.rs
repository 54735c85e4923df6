//! Role Resolver
//!
//! One lookup per identity. The answer is one of: no identity, no role
//! record, a role, or a failure. A failure is never turned into a role.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use shared::models::{Identity, Role};

use crate::error::LookupError;
use crate::source::RoleSource;

/// Outcome of role resolution for the current session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleResolution {
    /// Lookup not started or still in flight
    Pending,
    /// No identity in the session
    SignedOut,
    /// Identity has no role record; grants nothing
    Unassigned,
    Resolved(Role),
    Failed(LookupError),
    /// Not looked up because the identity is not active
    Skipped,
}

/// `{ role, loading }` view of a [`RoleResolution`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleStatus {
    pub role: Option<Role>,
    pub loading: bool,
}

impl RoleResolution {
    pub fn status(&self) -> RoleStatus {
        match self {
            Self::Pending => RoleStatus {
                role: None,
                loading: true,
            },
            Self::Resolved(role) => RoleStatus {
                role: Some(*role),
                loading: false,
            },
            Self::SignedOut | Self::Unassigned | Self::Failed(_) | Self::Skipped => RoleStatus {
                role: None,
                loading: false,
            },
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Resolved(role) => Some(*role),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Resolves the role of an identity through a [`RoleSource`]
#[derive(Clone)]
pub struct RoleResolver {
    source: Arc<dyn RoleSource>,
    timeout: Duration,
}

impl RoleResolver {
    pub fn new(source: Arc<dyn RoleSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    pub async fn resolve(&self, identity: Option<&Identity>) -> RoleResolution {
        let Some(identity) = identity else {
            return RoleResolution::SignedOut;
        };

        let result = match tokio::time::timeout(self.timeout, self.source.role_for(identity.id)).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::TimedOut(self.timeout)),
        };

        match result {
            Ok(Some(role)) => {
                tracing::debug!(user_id = %identity.id, role = %role, "Role resolved");
                RoleResolution::Resolved(role)
            }
            Ok(None) => {
                security_log!(WARN, "role_unassigned", user_id = %identity.id);
                RoleResolution::Unassigned
            }
            Err(e) => {
                security_log!(WARN, "role_lookup_failed", user_id = %identity.id, error = %e);
                RoleResolution::Failed(e)
            }
        }
    }
}
