use std::time::{Duration, Instant};

use reqwest::StatusCode;
use tracing::debug;

use crate::client::ApiError;

/// How long a 503 asks the caller to wait before the next attempt.
pub const UNAVAILABLE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Turn a non-2xx upstream response into an [`ApiError`].
///
/// A 503 is always retryable one second from now. Any `Retry-After` or body
/// the upstream sent is ignored. Everything else goes through the default
/// status mapping.
pub fn decode(status: StatusCode, body: String) -> ApiError {
    if status == StatusCode::SERVICE_UNAVAILABLE {
        debug!(status = status.as_u16(), "upstream unavailable, marking retryable");
        return ApiError::Retryable {
            status: status.as_u16(),
            message: "Service is unavailable".to_string(),
            retry_after: Instant::now() + UNAVAILABLE_RETRY_DELAY,
        };
    }
    default_decode(status, body)
}

fn default_decode(status: StatusCode, body: String) -> ApiError {
    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound { body },
        _ => ApiError::ApiResponse {
            status: status.as_u16(),
            body,
        },
    }
}
