//! Error types for sous-ai

use std::time::Duration;

use thiserror::Error;

/// Result type alias using sous-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to an LLM or search backend
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error payload
    #[error("API error: {message} (type: {error_type})")]
    Api { error_type: String, message: String },

    /// Non-success HTTP status without a structured error payload
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// Rate limit exceeded
    #[error("Rate limited: retry after {retry_after:?} seconds")]
    RateLimited { retry_after: Option<u64> },

    /// Invalid API key
    #[error("Invalid or missing API key")]
    InvalidApiKey,

    /// The call did not finish within its deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Server-sent events error
    #[error("SSE error: {0}")]
    Sse(String),

    /// The model finished without producing any text
    #[error("Model returned an empty response")]
    EmptyResponse,

    /// Unexpected response format
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an API error from type and message
    pub fn api(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Map a non-success HTTP status and its body to an error
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        match status {
            401 | 403 => Error::InvalidApiKey,
            429 => Error::RateLimited { retry_after: None },
            _ => Error::Status {
                status,
                body: body.into(),
            },
        }
    }

    /// Whether the failure is likely to go away on its own.
    ///
    /// Nothing retries on this; callers use it to choose how loudly to log.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(_) | Error::Timeout(_) | Error::Sse(_) | Error::RateLimited { .. } => true,
            Error::Status { status, .. } => *status >= 500,
            Error::Api {
                error_type,
                message,
            } => {
                let et = error_type.to_lowercase();
                let msg = message.to_lowercase();
                et.contains("rate_limit")
                    || et.contains("overloaded")
                    || et.contains("server_error")
                    || msg.contains("rate limit")
                    || msg.contains("overloaded")
                    || msg.contains("too many requests")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_typed_variants() {
        assert!(Error::RateLimited { retry_after: Some(5) }.is_transient());
        assert!(Error::Sse("connection reset".into()).is_transient());
        assert!(Error::Timeout(Duration::from_secs(15)).is_transient());
    }

    #[test]
    fn test_transient_server_status() {
        assert!(Error::from_status(502, "bad gateway").is_transient());
        assert!(!Error::from_status(400, "bad request").is_transient());
    }

    #[test]
    fn test_transient_api_overloaded() {
        let e = Error::api("overloaded_error", "The server is overloaded");
        assert!(e.is_transient());
    }

    #[test]
    fn test_transient_api_rate_limit_message() {
        let e = Error::api("error", "Rate limit exceeded, please retry");
        assert!(e.is_transient());
    }

    #[test]
    fn test_not_transient_auth() {
        assert!(!Error::api("authentication_error", "Invalid API key").is_transient());
        assert!(!Error::InvalidApiKey.is_transient());
        assert!(!Error::EmptyResponse.is_transient());
    }

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(Error::from_status(401, ""), Error::InvalidApiKey));
        assert!(matches!(Error::from_status(403, ""), Error::InvalidApiKey));
        assert!(matches!(
            Error::from_status(429, ""),
            Error::RateLimited { retry_after: None }
        ));
        match Error::from_status(500, "boom") {
            Error::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
