//! HTTP client for the hosted backend's auth and REST endpoints

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::client::BackendErrorBody;

use crate::{ClientConfig, ClientError, ClientResult};

const PREFER: &str = "Prefer";

/// HTTP client bound to one backend project
///
/// Every request carries the `apikey` header. The bearer token is the
/// session's access token when one is given, the API key otherwise.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let bearer = token.unwrap_or(&self.api_key);
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> ClientResult<T> {
        let response = self.request(Method::GET, path, token).send().await?;
        Self::handle_response(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .request(Method::POST, path, token)
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// POST whose response body is ignored
    pub async fn post_no_content<B: Serialize>(
        &self,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
        prefer: Option<&str>,
    ) -> ClientResult<()> {
        let mut request = self.request(Method::POST, path, token);
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(prefer) = prefer {
            request = request.header(PREFER, prefer);
        }
        Self::handle_empty(request.send().await?).await
    }

    /// PATCH with `Prefer: return=minimal`
    pub async fn patch_no_content<B: Serialize>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> ClientResult<()> {
        let response = self
            .request(Method::PATCH, path, token)
            .header(PREFER, "return=minimal")
            .json(body)
            .send()
            .await?;
        Self::handle_empty(response).await
    }

    /// DELETE whose response body is ignored
    pub async fn delete_no_content(&self, path: &str, token: Option<&str>) -> ClientResult<()> {
        let response = self.request(Method::DELETE, path, token).send().await?;
        Self::handle_empty(response).await
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Self::error_for(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::warn!(status = %status, error = %e, "Unexpected response body");
            ClientError::InvalidResponse(e.to_string())
        })
    }

    async fn handle_empty(response: reqwest::Response) -> ClientResult<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await?;
        Err(Self::error_for(status, &text))
    }

    fn error_for(status: StatusCode, text: &str) -> ClientError {
        let message = serde_json::from_str::<BackendErrorBody>(text)
            .ok()
            .and_then(|body| body.describe())
            .unwrap_or_else(|| text.to_string());

        tracing::debug!(status = %status, message = %message, "Backend request failed");

        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::FORBIDDEN => ClientError::Forbidden(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(message)
            }
            s if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
                ClientError::Internal(message)
            }
            s => ClientError::InvalidResponse(format!("{s}: {message}")),
        }
    }
}
