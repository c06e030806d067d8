use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::decoder;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Invalid path segment: '{segment}'")]
    InvalidSegment { segment: String },
    #[error("404 Not Found: [{body}]")]
    NotFound { body: String },
    #[error("{status} Service Unavailable: [{message}]")]
    Retryable {
        status: u16,
        message: String,
        retry_after: Instant,
    },
    #[error("API returned {status}: {body}")]
    ApiResponse { status: u16, body: String },
}

impl ApiError {
    /// Whether the failure is transient and the call may be attempted again.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Retryable { .. } => true,
            ApiError::Request(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }

    /// The earliest instant the upstream asked to be retried at, if any.
    pub fn retry_after(&self) -> Option<Instant> {
        match self {
            ApiError::Retryable { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// Whether the failure says something about upstream health. A 404 or
    /// other 4xx proves the upstream answered, so it does not count.
    pub fn is_upstream_failure(&self) -> bool {
        match self {
            ApiError::Request(_) | ApiError::Retryable { .. } => true,
            ApiError::ApiResponse { status, .. } => *status >= 500,
            ApiError::InvalidUrl(_)
            | ApiError::InvalidSegment { .. }
            | ApiError::NotFound { .. } => false,
        }
    }
}

/// Shared HTTP client for the clinic-medical service.
///
/// Wraps [`reqwest::Client`] with a base URL. Non-2xx responses are run
/// through the [`decoder`] before being returned.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: Url,
}

impl HttpClient {
    /// Create a new client for the given base URL with the default
    /// per-request timeout.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a new client whose requests give up after `timeout`.
    ///
    /// A trailing `/` is added to the base URL so relative paths resolve
    /// underneath any path prefix it carries.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;
        let inner = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { inner, base_url })
    }

    /// GET `{base_url}/{path}` and deserialize the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.base_url.join(path)?;
        let resp = self.inner.get(url).send().await?;
        Self::handle_response(resp).await
    }

    /// POST `{base_url}/{path}` with a JSON body and deserialize the response.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.base_url.join(path)?;
        let resp = self.inner.post(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    /// Return the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(decoder::decode(status, body));
        }
        Ok(resp.json().await?)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}
