//! MBTA client error types.

use crate::planner::FeedError;

/// Errors from the MBTA HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum MbtaError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON deserialization failed
    #[error("JSON parse error: {message}{}", body_suffix(.body))]
    Json {
        message: String,
        body: Option<String>,
    },

    /// API returned an error status code
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// Requested resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limited by the API
    #[error("rate limited by MBTA API")]
    RateLimited,

    /// Invalid API key or unauthorized
    #[error("unauthorized (invalid API key)")]
    Unauthorized,
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_ref()
        .map(|b| format!(" (body: {b})"))
        .unwrap_or_default()
}

impl MbtaError {
    /// Convert to the planner's feed error, naming the resource requested.
    pub fn into_feed_error(self, resource: &str) -> FeedError {
        match self {
            MbtaError::RateLimited => FeedError::RateLimited,
            MbtaError::NotFound(what) => FeedError::NotFound(what),
            MbtaError::Json { message, .. } => FeedError::Malformed(message),
            other => FeedError::Unavailable {
                resource: resource.to_string(),
                message: other.to_string(),
            },
        }
    }
}
