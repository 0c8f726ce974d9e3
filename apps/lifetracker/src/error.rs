//! Error types for the LifeTracker API client

use serde::Deserialize;
use thiserror::Error;

/// Client-wide result type
pub type Result<T> = std::result::Result<T, ApiError>;

/// API client error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status carried by this error, if it came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::NotFound(_) => Some(404),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the request never produced a usable response
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ApiError::Transport(e) if e.is_connect() || e.is_timeout() || e.is_request() || e.is_body()
        )
    }

    /// Build an error from a non-2xx response body
    ///
    /// The server reports failures as `{"message": "..."}`; anything else
    /// falls back to the per-operation default message.
    pub(crate) fn from_response(status: u16, body: &str, fallback: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());

        match status {
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound(message),
            _ => ApiError::Status { status, message },
        }
    }
}

/// Error response body
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_wins() {
        let err = ApiError::from_response(400, r#"{"message":"Title is required"}"#, "Failed to create book");
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Title is required");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fallback_message() {
        let err = ApiError::from_response(500, "<html>oops</html>", "Failed to fetch goals");
        assert_eq!(err.to_string(), "Failed to fetch goals (HTTP 500)");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(ApiError::from_response(401, "", "x"), ApiError::Unauthorized));
        assert!(matches!(ApiError::from_response(404, "{}", "Failed to fetch book"), ApiError::NotFound(m) if m == "Failed to fetch book"));
    }
}
