//! Access error types

use std::time::Duration;

use shared::error::{AppError, ErrorCode};
use shared::models::UnknownRole;
use thiserror::Error;

/// Failure of a role or approval lookup
///
/// Always distinct from "no role assigned" and from "not approved": those are
/// successful answers, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Backend or network failure, the lookup may be retried
    #[error("backend unavailable: {0}")]
    Transient(String),

    /// The backend returned a role string outside the known set
    #[error(transparent)]
    UnknownRole(#[from] UnknownRole),

    /// The session is missing or no longer accepted by the backend
    #[error("not signed in")]
    Unauthenticated,

    /// The backend refused the operation (row-level security, validation)
    #[error("rejected by backend: {0}")]
    Rejected(String),

    /// No answer within the configured bound
    #[error("lookup timed out after {0:?}")]
    TimedOut(Duration),
}

impl LookupError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    /// Whether retrying the same lookup can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::TimedOut(_))
    }
}

/// Reason an access check did not allow an action
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// Resolution has not finished yet
    #[error("access is still being verified")]
    Pending,

    /// No identity in the session
    #[error("sign in required")]
    NotSignedIn,

    /// The identity has not been approved by an administrator
    #[error("account is waiting for administrator approval")]
    ApprovalPending,

    /// The action is reserved to administrators
    #[error("administrator role required")]
    AdminRequired,

    /// Approved identity without a role record; it holds no capability
    #[error("no role assigned to this account")]
    Unassigned,

    /// Resolved capabilities do not cover the request
    #[error("permission denied: missing {}", .missing.join(", "))]
    Denied { missing: Vec<&'static str> },

    /// Role or approval could not be determined
    #[error("unable to verify access: {0}")]
    Unverified(#[from] LookupError),

    /// The directory call itself failed after access was granted
    #[error("directory operation failed: {0}")]
    Directory(LookupError),
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Pending => AppError::access_unverified("Access is still being verified"),
            AccessError::NotSignedIn => AppError::not_authenticated(),
            AccessError::ApprovalPending => AppError::approval_pending(),
            AccessError::AdminRequired => AppError::admin_required(),
            AccessError::Unassigned => AppError::new(ErrorCode::RoleUnassigned),
            AccessError::Denied { missing } => {
                AppError::new(ErrorCode::PermissionDenied).with_detail("missing", missing)
            }
            AccessError::Unverified(LookupError::UnknownRole(UnknownRole(value))) => {
                AppError::unknown_role(value)
            }
            AccessError::Unverified(e) => AppError::access_unverified(e.to_string()),
            AccessError::Directory(LookupError::Unauthenticated) => AppError::not_authenticated(),
            AccessError::Directory(LookupError::Rejected(message)) => {
                AppError::permission_denied(message)
            }
            AccessError::Directory(e) if e.is_retryable() => {
                AppError::with_message(ErrorCode::NetworkError, e.to_string())
            }
            AccessError::Directory(e) => AppError::internal(e.to_string()),
        }
    }
}
