//! Client configuration

use crate::{ClientError, ClientResult, HttpClient};

/// Connection settings for the hosted backend
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | ACERVO_URL | required | Project base URL |
/// | ACERVO_ANON_KEY | required | Public API key sent as `apikey` |
/// | ACERVO_HTTP_TIMEOUT_SECS | 30 | Request timeout |
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Project base URL (e.g., "https://xyz.example.co")
    pub base_url: String,

    /// Public API key
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl ClientConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Self::DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> ClientResult<Self> {
        let base_url = std::env::var("ACERVO_URL")
            .map_err(|_| ClientError::Config("ACERVO_URL is not set".into()))?;
        let api_key = std::env::var("ACERVO_ANON_KEY")
            .map_err(|_| ClientError::Config("ACERVO_ANON_KEY is not set".into()))?;
        let timeout = std::env::var("ACERVO_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(Self::DEFAULT_TIMEOUT_SECS);

        Self::new(base_url, api_key).with_timeout(timeout).validated()
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Reject empty keys and non-HTTP URLs
    pub fn validated(self) -> ClientResult<Self> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "base URL must start with http:// or https://, got {:?}",
                self.base_url
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(ClientError::Config("API key is empty".into()));
        }
        if self.timeout == 0 {
            return Err(ClientError::Config("timeout must be positive".into()));
        }
        Ok(self)
    }

    /// Create an HTTP client from this configuration
    pub fn build_http_client(&self) -> ClientResult<HttpClient> {
        HttpClient::new(self)
    }
}
