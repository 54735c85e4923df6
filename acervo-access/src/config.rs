use std::time::Duration;

/// Access-control configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | ACERVO_LOOKUP_TIMEOUT_MS | 10000 | Upper bound for a role or approval lookup |
/// | ACERVO_DENIED_REDIRECT | / | Where a denied route guard navigates |
/// | ACERVO_SIGN_IN_PATH | /auth | Where a signed-out visitor is sent |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessConfig {
    /// Role and approval lookups that exceed this turn into an error state
    pub lookup_timeout: Duration,
    /// Fallback path of route guards
    pub denied_redirect: String,
    /// Sign-in page path
    pub sign_in_path: String,
}

impl AccessConfig {
    pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 10_000;

    /// Load configuration from environment variables
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self {
            lookup_timeout: Duration::from_millis(
                std::env::var("ACERVO_LOOKUP_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|ms| *ms > 0)
                    .unwrap_or(Self::DEFAULT_LOOKUP_TIMEOUT_MS),
            ),
            denied_redirect: std::env::var("ACERVO_DENIED_REDIRECT")
                .ok()
                .filter(|p| p.starts_with('/'))
                .unwrap_or_else(|| "/".into()),
            sign_in_path: std::env::var("ACERVO_SIGN_IN_PATH")
                .ok()
                .filter(|p| p.starts_with('/'))
                .unwrap_or_else(|| "/auth".into()),
        }
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn with_denied_redirect(mut self, path: impl Into<String>) -> Self {
        self.denied_redirect = path.into();
        self
    }

    pub fn with_sign_in_path(mut self, path: impl Into<String>) -> Self {
        self.sign_in_path = path.into();
        self
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_millis(Self::DEFAULT_LOOKUP_TIMEOUT_MS),
            denied_redirect: "/".into(),
            sign_in_path: "/auth".into(),
        }
    }
}
