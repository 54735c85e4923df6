//! Client error types

use acervo_access::LookupError;
use shared::error::{AppError, ErrorCode};
use shared::models::UnknownRole;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Email or password rejected by the auth service
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Backend-side failure (5xx)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Role column holds an unrecognized value
    #[error(transparent)]
    UnknownRole(#[from] UnknownRole),

    /// No session to authorize the request with
    #[error("Not signed in")]
    NotSignedIn,

    /// The session's access token is past its expiry
    #[error("Session expired")]
    SessionExpired,

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether the same request may succeed later
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Internal(_) | Self::InvalidResponse(_) => true,
            _ => false,
        }
    }
}

impl From<ClientError> for LookupError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::UnknownRole(role) => LookupError::UnknownRole(role),
            ClientError::Unauthorized
            | ClientError::NotSignedIn
            | ClientError::SessionExpired
            | ClientError::InvalidCredentials => LookupError::Unauthenticated,
            ClientError::Forbidden(m) | ClientError::NotFound(m) | ClientError::Validation(m) => {
                LookupError::Rejected(m)
            }
            ClientError::Config(m) => LookupError::Rejected(m),
            other => LookupError::Transient(other.to_string()),
        }
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) if e.is_timeout() => {
                AppError::with_message(ErrorCode::TimeoutError, e.to_string())
            }
            ClientError::Http(e) => AppError::with_message(ErrorCode::NetworkError, e.to_string()),
            ClientError::InvalidResponse(m) => AppError::with_message(ErrorCode::InvalidFormat, m),
            ClientError::Unauthorized | ClientError::NotSignedIn => AppError::not_authenticated(),
            ClientError::SessionExpired => AppError::new(ErrorCode::SessionExpired),
            ClientError::InvalidCredentials => AppError::invalid_credentials(),
            ClientError::Forbidden(m) => AppError::permission_denied(m),
            ClientError::NotFound(m) => AppError::not_found(m),
            ClientError::Validation(m) => AppError::validation(m),
            ClientError::Internal(m) => AppError::internal(m),
            ClientError::Serialization(e) => {
                AppError::with_message(ErrorCode::InvalidFormat, e.to_string())
            }
            ClientError::UnknownRole(role) => AppError::unknown_role(role.0),
            ClientError::Config(m) => AppError::with_message(ErrorCode::ConfigError, m),
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
