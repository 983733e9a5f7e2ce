//! Error taxonomy for backend API calls.
//!
//! The synchronizer never surfaces these directly to the user; mutation
//! entry points translate them into `{ success, message }` outcomes. The
//! taxonomy exists so callers can distinguish "retryable transport problem"
//! from "the server rejected this payload".

use thiserror::Error;

/// Errors that can occur when talking to the shop backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed or timed out before a response arrived.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server rejected the payload (HTTP 400/422 or an envelope error).
    #[error("validation error: {0}")]
    Validation(String),

    /// Entity missing (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request was unauthenticated or the session expired (HTTP 401/403).
    #[error("authentication required")]
    Auth,

    /// Rate limited by the backend.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The server failed (HTTP 5xx).
    #[error("server error: {0}")]
    Server(String),

    /// Response body did not parse as JSON.
    #[error("response parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Response parsed but was missing the expected payload.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    /// Whether retrying the same request could plausibly succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Server(_) | Self::RateLimited(_)
        )
    }

    /// A message suitable for direct display to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) | Self::RateLimited(_) => {
                "Network error. Please check your connection.".to_owned()
            }
            Self::Validation(message) => message.clone(),
            Self::NotFound(what) => format!("{what} was not found."),
            Self::Auth => "Please login again.".to_owned(),
            Self::Server(_) | Self::Parse(_) | Self::Malformed(_) => {
                "Server error. Please try again later.".to_owned()
            }
        }
    }
}

/// Result type alias for backend API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Map a backend error code to a user-facing message.
///
/// The backend reports machine-readable codes in the envelope's `error`
/// field alongside (sometimes unhelpful) `message` text.
#[must_use]
pub fn user_message_for_code(code: &str) -> &'static str {
    match code {
        "INVALID_USER_ID" => "Invalid user information. Please login again.",
        "VALIDATION_ERROR" => "Please check all required fields and try again.",
        "NETWORK_ERROR" => "Network error. Please check your connection.",
        "INSUFFICIENT_STOCK" => "Some items are out of stock. Please review your bag.",
        "DUPLICATE_ORDER" => "Duplicate order detected. Please refresh and try again.",
        "INTERNAL_SERVER_ERROR" => "Server error. Please try again later.",
        _ => "An unexpected error occurred. Please try again.",
    }
}
