//! Client-related types shared between the access core and the backend client
//!
//! Request/response shapes of the hosted auth service.

use serde::{Deserialize, Serialize};

use crate::models::Identity;

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Password sign-in request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Session issued by the auth service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Seconds until `access_token` expires
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: Identity,
}

/// Error body returned by the auth service and the REST layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

impl BackendErrorBody {
    /// Best available description of the failure
    pub fn describe(&self) -> Option<String> {
        [&self.message, &self.msg, &self.error_description, &self.error]
            .into_iter()
            .find_map(|field| field.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_response_parses_user() {
        let json = r#"{
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r",
            "user": {"id": "6f1c1b9e-2d7a-4c55-9b0e-3d5c2a8f1e01", "email": "ana@example.com", "aud": "authenticated"}
        }"#;
        let session: SessionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(session.access_token, "jwt");
        assert_eq!(session.user.email, "ana@example.com");
        assert_eq!(session.expires_in, Some(3600));
    }

    #[test]
    fn test_error_body_with_several_descriptions() {
        let body: BackendErrorBody = serde_json::from_str(
            r#"{"code":400,"msg":"Email not confirmed","error_description":"Invalid login credentials","error":"invalid_grant"}"#,
        )
        .unwrap();
        assert_eq!(body.describe().as_deref(), Some("Email not confirmed"));

        let body: BackendErrorBody =
            serde_json::from_str(r#"{"message":"permission denied for table user_roles","msg":"x"}"#).unwrap();
        assert_eq!(
            body.describe().as_deref(),
            Some("permission denied for table user_roles")
        );
    }

    #[test]
    fn test_error_body_fields() {
        let body: BackendErrorBody =
            serde_json::from_str(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
                .unwrap();
        assert_eq!(body.describe().as_deref(), Some("Invalid login credentials"));

        let body: BackendErrorBody = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert_eq!(body.describe().as_deref(), Some("boom"));
    }
}
