//! Session store
//!
//! Owns the current session and publishes the signed-in identity on a watch
//! channel. The access controller subscribes to that channel; it never reads
//! the session directly.

use std::sync::Arc;

use acervo_access::security_log;
use chrono::{DateTime, Duration, Utc};
use shared::client::{SessionResponse, SignInRequest};
use shared::models::Identity;
use tokio::sync::watch;

use crate::{ClientError, ClientResult, HttpClient};

/// Signed-in session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub identity: Identity,
}

impl Session {
    fn from_response(response: SessionResponse) -> Self {
        Self {
            // an out-of-range lifetime is treated as unknown
            expires_at: response
                .expires_in
                .and_then(Duration::try_seconds)
                .and_then(|lifetime| Utc::now().checked_add_signed(lifetime)),
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            identity: response.user,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

#[derive(Debug)]
struct Inner {
    session_tx: watch::Sender<Option<Session>>,
    identity_tx: watch::Sender<Option<Identity>>,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    http: HttpClient,
    inner: Arc<Inner>,
}

impl SessionStore {
    pub fn new(http: HttpClient) -> Self {
        let (session_tx, _) = watch::channel(None);
        let (identity_tx, _) = watch::channel(None);
        Self {
            http,
            inner: Arc::new(Inner {
                session_tx,
                identity_tx,
            }),
        }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Password sign-in
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> ClientResult<Identity> {
        let request = SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let result: ClientResult<SessionResponse> = self
            .http
            .post("auth/v1/token?grant_type=password", None, &request)
            .await;

        let response = match result {
            Ok(response) => response,
            Err(ClientError::Validation(_)) | Err(ClientError::Unauthorized) => {
                security_log!(WARN, "sign_in_failed", email = %email);
                return Err(ClientError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let session = Session::from_response(response);
        let identity = session.identity.clone();
        security_log!(INFO, "signed_in", user_id = %identity.id);
        self.set(Some(session));
        Ok(identity)
    }

    /// Resume a session from an existing access token
    pub async fn resume(&self, access_token: &str) -> ClientResult<Identity> {
        let identity: Identity = self.http.get("auth/v1/user", Some(access_token)).await?;
        tracing::info!(user_id = %identity.id, "Session resumed");
        self.set(Some(Session {
            access_token: access_token.to_string(),
            refresh_token: None,
            expires_at: None,
            identity: identity.clone(),
        }));
        Ok(identity)
    }

    /// Sign out locally, then tell the auth service
    ///
    /// The local session is cleared even if the remote call fails.
    pub async fn sign_out(&self) -> ClientResult<()> {
        let Some(session) = self.inner.session_tx.borrow().clone() else {
            return Ok(());
        };
        self.set(None);
        security_log!(INFO, "signed_out", user_id = %session.identity.id);

        match self
            .http
            .post_no_content::<()>("auth/v1/logout", Some(&session.access_token), None, None)
            .await
        {
            Ok(()) | Err(ClientError::Unauthorized) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.inner.identity_tx.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.session_tx.borrow().clone()
    }

    /// Access token of an unexpired session
    pub fn token(&self) -> Option<String> {
        self.access_token().ok()
    }

    /// Access token for an authenticated request
    pub fn access_token(&self) -> ClientResult<String> {
        match self.inner.session_tx.borrow().as_ref() {
            None => Err(ClientError::NotSignedIn),
            Some(session) if session.is_expired() => Err(ClientError::SessionExpired),
            Some(session) => Ok(session.access_token.clone()),
        }
    }

    /// Identity changes, for the access controller
    pub fn subscribe_identity(&self) -> watch::Receiver<Option<Identity>> {
        self.inner.identity_tx.subscribe()
    }

    fn set(&self, session: Option<Session>) {
        let identity = session.as_ref().map(|s| s.identity.clone());
        self.inner.session_tx.send_replace(session);
        self.inner.identity_tx.send_if_modified(|current| {
            if *current == identity {
                false
            } else {
                *current = identity;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientConfig;
    use uuid::Uuid;

    fn store() -> SessionStore {
        let http = HttpClient::new(&ClientConfig::new("http://127.0.0.1:9", "anon")).unwrap();
        SessionStore::new(http)
    }

    fn session(expires_at: Option<DateTime<Utc>>) -> Session {
        Session {
            access_token: "jwt".into(),
            refresh_token: None,
            expires_at,
            identity: Identity::new(Uuid::new_v4(), "ana@example.com"),
        }
    }

    fn response(expires_in: Option<i64>) -> SessionResponse {
        SessionResponse {
            access_token: "jwt".into(),
            token_type: Some("bearer".into()),
            expires_in,
            refresh_token: None,
            user: Identity::new(Uuid::new_v4(), "ana@example.com"),
        }
    }

    #[test]
    fn test_session_expiry_from_response() {
        let session = Session::from_response(response(Some(3600)));
        let expires_at = session.expires_at.unwrap();
        assert!(expires_at > Utc::now() + Duration::seconds(3500));
        assert!(!session.is_expired());

        assert_eq!(Session::from_response(response(None)).expires_at, None);
    }

    #[test]
    fn test_out_of_range_expiry_is_unknown() {
        for secs in [i64::MAX, i64::MIN, 9_000_000_000_000] {
            let session = Session::from_response(response(Some(secs)));
            assert_eq!(session.expires_at, None);
            assert_eq!(session.access_token, "jwt");
        }
    }

    #[test]
    fn test_expired_session_has_no_token() {
        let store = store();
        store.set(Some(session(Some(Utc::now() - Duration::seconds(5)))));
        assert!(store.token().is_none());
        assert!(store.current_identity().is_some());

        store.set(Some(session(None)));
        assert_eq!(store.token().as_deref(), Some("jwt"));
    }

    #[test]
    fn test_access_token_reports_expiry() {
        let store = store();
        assert!(matches!(store.access_token(), Err(ClientError::NotSignedIn)));

        store.set(Some(session(Some(Utc::now() - Duration::seconds(5)))));
        assert!(matches!(store.access_token(), Err(ClientError::SessionExpired)));

        store.set(Some(session(Some(Utc::now() + Duration::seconds(60)))));
        assert_eq!(store.access_token().unwrap(), "jwt");
    }

    #[tokio::test]
    async fn test_identity_channel_skips_same_identity() {
        let store = store();
        let mut rx = store.subscribe_identity();
        let s = session(None);

        store.set(Some(s.clone()));
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        let mut refreshed = s.clone();
        refreshed.access_token = "jwt-2".into();
        store.set(Some(refreshed));
        assert!(!rx.has_changed().unwrap());

        store.set(None);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_without_session() {
        assert!(store().sign_out().await.is_ok());
    }
}
