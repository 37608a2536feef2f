//! Error type for backend API calls.

use thiserror::Error;

/// Errors that can occur when talking to the Herbloom backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be parsed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found (backend 404). Carries the resource label.
    #[error("{0} not found")]
    NotFound(String),

    /// Missing or expired credentials (backend 401).
    #[error("Authentication required")]
    Unauthorized,

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Input rejected by the backend (4xx with a message).
    #[error("{0}")]
    Validation(String),

    /// Any other non-success response.
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },
}

impl ApiError {
    /// True for failure classes that indicate a broken backend or transport
    /// rather than a caller mistake. These are the ones worth alerting on.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Parse(_) | Self::Backend { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("Product".to_string());
        assert_eq!(err.to_string(), "Product not found");

        let err = ApiError::Validation("quantity must be at least 1".to_string());
        assert_eq!(err.to_string(), "quantity must be at least 1");

        let err = ApiError::Backend {
            status: 503,
            message: "upstream unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Backend error (503): upstream unavailable");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ApiError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }

    #[test]
    fn test_server_error_classes() {
        assert!(
            ApiError::Backend {
                status: 500,
                message: String::new()
            }
            .is_server_error()
        );
        assert!(!ApiError::Unauthorized.is_server_error());
        assert!(!ApiError::NotFound("Cart".to_string()).is_server_error());
        assert!(!ApiError::RateLimited(1).is_server_error());
        assert!(!ApiError::Validation("bad".to_string()).is_server_error());
    }
}
